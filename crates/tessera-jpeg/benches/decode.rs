/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Benchmarks for baseline and progressive decoding

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tessera_jpeg::tessera_core::colorspace::ColorSpace;
use tessera_jpeg::tessera_core::options::DecoderOptions;
use tessera_jpeg::JpegDecoder;

#[path = "../tests/common/mod.rs"]
mod common;

use common::TestEncoder;

fn pattern(x: usize, y: usize) -> u8 {
    ((x * 7 + y * 3) % 200 + (x ^ y) % 50) as u8
}

fn image(progressive: bool) -> Vec<u8> {
    let mut encoder = TestEncoder::new(512, 512)
        .component(1, 2, 2, pattern)
        .component(2, 1, 1, |x, y| (100 + (x + y) % 50) as u8)
        .component(3, 1, 1, |x, _| (160 - x % 60) as u8);

    for (i, q) in encoder.quant.iter_mut().enumerate() {
        *q = 2 + (i / 8 + i % 8) as u16;
    }
    encoder.progressive = progressive;
    encoder.encode()
}

fn decode_tessera(buf: &[u8], options: DecoderOptions) -> Vec<u8> {
    JpegDecoder::new_with_options(buf, options).decode().unwrap()
}

fn decode_jpeg_decoder(buf: &[u8]) -> Vec<u8> {
    jpeg_decoder::Decoder::new(buf).decode().unwrap()
}

fn criterion_benchmark(c: &mut Criterion) {
    for (name, progressive) in [("baseline", false), ("progressive", true)] {
        let data = image(progressive);

        let mut group = c.benchmark_group(format!("[jpeg]: {name} 4:2:0 decoding"));

        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_function("tessera-jpeg", |b| {
            b.iter(|| black_box(decode_tessera(&data, DecoderOptions::default())))
        });

        group.bench_function("tessera-jpeg single thread", |b| {
            let options = DecoderOptions::default().jpeg_set_num_threads(1);
            b.iter(|| black_box(decode_tessera(&data, options)))
        });

        group.bench_function("jpeg-decoder", |b| {
            b.iter(|| black_box(decode_jpeg_decoder(&data)))
        });
    }

    let data = image(false);
    let mut group = c.benchmark_group("[jpeg]: Grayscale output");

    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("tessera-jpeg", |b| {
        let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::Luma);
        b.iter(|| black_box(decode_tessera(&data, options)))
    });
}

criterion_group!(name=benches;
      config={
      let c = Criterion::default();
        c.measurement_time(Duration::from_secs(5))
      };
    targets=criterion_benchmark);

criterion_main!(benches);
