/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use tessera_jpeg::tessera_core::options::DecoderOptions;
use tessera_jpeg::{JfifDensity, JpegDecoder};

mod common;

use common::{gradient, TestEncoder};

fn icc_chunk(seq_no: u8, count: u8, data: &[u8]) -> Vec<u8> {
    let mut payload = b"ICC_PROFILE\0".to_vec();
    payload.extend([seq_no, count]);
    payload.extend(data);
    payload
}

fn with_metadata() -> Vec<u8> {
    let mut exif = b"Exif\0\0".to_vec();
    exif.extend(b"MM\0\x2a\0\0\0\x08");

    let mut xmp = b"http://ns.adobe.com/xap/1.0/\0".to_vec();
    xmp.extend(b"<x:xmpmeta/>");

    TestEncoder::new(16, 16)
        .component(1, 1, 1, gradient)
        .segment(0xE0, b"JFIF\0\x01\x02\x01\x00\x48\x00\x48\x00\x00")
        .segment(0xE1, &exif)
        .segment(0xE1, &xmp)
        // chunks out of order
        .segment(0xE2, &icc_chunk(2, 2, b"world"))
        .segment(0xE2, &icc_chunk(1, 2, b"hello "))
        .segment(0xFE, b"first comment")
        .segment(0xFE, b"second")
        .encode()
}

#[test]
fn jfif_density() {
    let info = tessera_jpeg::identify(&with_metadata()).unwrap();

    assert_eq!(
        info.jfif,
        Some(JfifDensity {
            units:     1,
            x_density: 72,
            y_density: 72
        })
    );
    assert_eq!(info.adobe_transform, None);
}

#[test]
fn exif_and_xmp() {
    let data = with_metadata();
    let mut decoder = JpegDecoder::new(&data);
    decoder.decode_headers().unwrap();

    assert_eq!(decoder.exif(), Some(&b"MM\0\x2a\0\0\0\x08"[..]));
    assert_eq!(decoder.xmp(), Some(&b"<x:xmpmeta/>"[..]));
}

#[test]
fn icc_chunks_are_joined_in_order() {
    let data = with_metadata();
    let mut decoder = JpegDecoder::new(&data);
    decoder.decode_headers().unwrap();

    assert_eq!(decoder.icc_profile().as_deref(), Some(&b"hello world"[..]));
}

#[test]
fn incomplete_icc_profile() {
    let data = TestEncoder::new(8, 8)
        .component(1, 1, 1, gradient)
        .segment(0xE2, &icc_chunk(1, 3, b"one"))
        .segment(0xE2, &icc_chunk(3, 3, b"three"))
        .encode();

    let mut decoder = JpegDecoder::new(&data);
    decoder.decode().unwrap();

    assert_eq!(decoder.icc_profile(), None);
}

#[test]
fn comments() {
    let data = with_metadata();
    let mut decoder = JpegDecoder::new(&data);
    decoder.decode_headers().unwrap();

    assert_eq!(
        decoder.comments(),
        [b"first comment".to_vec(), b"second".to_vec()]
    );
}

#[test]
fn skip_metadata() {
    let data = with_metadata();
    let options = DecoderOptions::default().set_skip_metadata(true);

    let mut decoder = JpegDecoder::new_with_options(&data, options);
    let pixels = decoder.decode().unwrap();

    assert_eq!(pixels.len(), 16 * 16 * 3);
    assert!(decoder.exif().is_none());
    assert!(decoder.xmp().is_none());
    assert!(decoder.icc_profile().is_none());
    assert!(decoder.comments().is_empty());
    // density is part of the image description, not metadata
    assert!(decoder.info().unwrap().jfif.is_some());
}

#[test]
fn unknown_app_segments_are_skipped() {
    let data = TestEncoder::new(8, 8)
        .component(1, 1, 1, gradient)
        .segment(0xE1, b"not exif at all")
        .segment(0xE5, &[0xFF; 20])
        .segment(0xEF, b"")
        .encode();

    let reference = TestEncoder::new(8, 8).component(1, 1, 1, gradient).encode();

    let mut decoder = JpegDecoder::new(&data);

    assert_eq!(
        decoder.decode().unwrap(),
        JpegDecoder::new(&reference).decode().unwrap()
    );
    assert!(decoder.exif().is_none());
    assert!(decoder.warnings().is_empty());
}
