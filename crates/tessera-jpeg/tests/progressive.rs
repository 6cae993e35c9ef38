/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use tessera_jpeg::tessera_core::colorspace::ColorSpace;
use tessera_jpeg::tessera_core::options::DecoderOptions;
use tessera_jpeg::{JpegDecoder, SOFMarkers};

mod common;

use common::{gradient, TestEncoder};

/// Decode `encoder`'s image as a baseline and as a progressive stream
fn decode_both(mut encoder: TestEncoder, options: DecoderOptions) -> (Vec<u8>, Vec<u8>) {
    encoder.progressive = false;
    let baseline = JpegDecoder::new_with_options(&encoder.encode(), options)
        .decode()
        .unwrap();

    encoder.progressive = true;
    let data = encoder.encode();
    let mut decoder = JpegDecoder::new_with_options(&data, options);
    let progressive = decoder.decode().unwrap();

    assert!(decoder.warnings().is_empty(), "{:?}", decoder.warnings());

    (baseline, progressive)
}

#[test]
fn grayscale_matches_baseline() {
    let encoder = TestEncoder::new(27, 19).component(1, 1, 1, gradient);
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::Luma);

    let (baseline, progressive) = decode_both(encoder, options);

    assert_eq!(baseline.len(), 27 * 19);
    assert_eq!(baseline, progressive);
}

#[test]
fn subsampled_colour_matches_baseline() {
    let encoder = TestEncoder::new(37, 29)
        .component(1, 2, 2, gradient)
        .component(2, 1, 1, |x, y| (90 + x + y) as u8)
        .component(3, 1, 1, |x, _| (170 - 2 * x) as u8);

    let (baseline, progressive) = decode_both(encoder, DecoderOptions::default());

    assert_eq!(baseline.len(), 37 * 29 * 3);
    assert_eq!(baseline, progressive);
}

#[test]
fn quantized_coefficients() {
    let mut encoder = TestEncoder::new(24, 16)
        .component(1, 2, 1, gradient)
        .component(2, 1, 1, |_, y| (120 + 3 * y) as u8)
        .component(3, 1, 1, |x, _| (130 - x) as u8);

    // coarser steps further from DC
    for (i, q) in encoder.quant.iter_mut().enumerate() {
        *q = 1 + (i / 8 + i % 8) as u16;
    }

    let (baseline, progressive) = decode_both(encoder, DecoderOptions::default());

    assert_eq!(baseline, progressive);
}

#[test]
fn frame_type_is_reported() {
    let mut encoder = TestEncoder::new(16, 16).component(1, 1, 1, gradient);
    encoder.progressive = true;

    let data = encoder.encode();
    let info = tessera_jpeg::identify(&data).unwrap();

    assert_eq!(info.sof, SOFMarkers::ProgressiveDctHuffman);
    assert!(!info.sof.is_sequential_dct());
}

#[test]
fn scan_limit_counts_every_scan() {
    // one DC first, one DC refinement and one AC scan
    let mut encoder = TestEncoder::new(16, 16).component(1, 1, 1, gradient);
    encoder.progressive = true;

    let data = encoder.encode();

    let enough = DecoderOptions::default().jpeg_set_max_scans(3);
    assert!(JpegDecoder::new_with_options(&data, enough).decode().is_ok());

    let too_few = DecoderOptions::default().jpeg_set_max_scans(2);
    assert!(JpegDecoder::new_with_options(&data, too_few).decode().is_err());
}

#[test]
fn truncated_progressive_stream() {
    let mut encoder = TestEncoder::new(16, 16).component(1, 1, 1, |_, _| 90);
    encoder.progressive = true;

    let data = encoder.encode();
    // stop right before the AC scan, DC alone carries flat blocks
    let last_sos = data
        .windows(2)
        .rposition(|w| w == [0xFF, 0xDA])
        .unwrap();

    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::Luma);
    let mut decoder = JpegDecoder::new_with_options(&data[..last_sos], options);
    let pixels = decoder.decode().unwrap();

    assert!(pixels.iter().all(|x| *x == 90));
    assert_eq!(
        decoder.warnings(),
        [tessera_jpeg::DecodeWarning::MissingEoi]
    );
}
