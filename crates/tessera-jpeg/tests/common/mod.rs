/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A tiny jpeg encoder used to build test streams
//!
//! Supports Huffman coded baseline frames (interleaved or one scan per
//! component) with optional restart intervals, and a simple progressive
//! layout of one DC first scan, one DC refinement scan and one AC scan
//! per component. Tables are fixed, one quantization table is shared
//! by every component.
#![allow(dead_code)]

use std::f64::consts::PI;

/// Zig-zag position to natural order
#[rustfmt::skip]
pub const ZIGZAG: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63
];

/// A component with its samples at component resolution
#[derive(Clone)]
pub struct TestComponent {
    pub id:      u8,
    pub h:       usize,
    pub v:       usize,
    /// `width * height` samples, see [`TestEncoder::component_size`]
    pub samples: Vec<u8>
}

#[derive(Clone)]
pub struct TestEncoder {
    pub width:            usize,
    pub height:           usize,
    pub components:       Vec<TestComponent>,
    /// Quantization values in natural order
    pub quant:            [u16; 64],
    pub restart_interval: u16,
    pub interleaved:      bool,
    pub progressive:      bool,
    /// Segments written right after SOI, as `(marker code, payload)`
    pub segments:         Vec<(u8, Vec<u8>)>
}

/// `(code, length)` of every symbol of a table
struct Codes([(u16, u8); 256]);

impl Codes {
    fn new(counts: &[u8; 17], symbols: &[u8]) -> Codes {
        let mut codes = [(0, 0); 256];
        let mut code = 0_u16;
        let mut k = 0;

        for length in 1..=16 {
            for _ in 0..counts[length] {
                codes[usize::from(symbols[k])] = (code, length as u8);
                code += 1;
                k += 1;
            }
            code <<= 1;
        }
        Codes(codes)
    }

    fn get(&self, symbol: u8) -> (u16, u8) {
        let (code, length) = self.0[usize::from(symbol)];
        assert_ne!(length, 0, "symbol {symbol:#x} has no code");
        (code, length)
    }
}

/// DC categories 0..=11, all four bits long
pub fn dc_table() -> ([u8; 17], Vec<u8>) {
    let mut counts = [0; 17];
    counts[4] = 12;
    (counts, (0..12).collect())
}

/// EOB and `0x01` get two bit codes, every other symbol nine bits
pub fn ac_table() -> ([u8; 17], Vec<u8>) {
    let mut symbols = vec![0x00, 0x01];

    for run in 0..16_u8 {
        for size in 1..=10_u8 {
            let symbol = (run << 4) | size;

            if symbol != 0x01 {
                symbols.push(symbol);
            }
        }
    }
    symbols.push(0xF0);

    let mut counts = [0; 17];
    counts[2] = 2;
    counts[9] = 160;
    (counts, symbols)
}

pub struct BitWriter {
    pub out: Vec<u8>,
    acc:     u8,
    n:       u8
}

impl BitWriter {
    pub fn new() -> BitWriter {
        BitWriter { out: vec![], acc: 0, n: 0 }
    }

    pub fn put(&mut self, bits: u32, length: u8) {
        for i in (0..length).rev() {
            self.acc = (self.acc << 1) | ((bits >> i) & 1) as u8;
            self.n += 1;

            if self.n == 8 {
                self.out.push(self.acc);

                if self.acc == 0xFF {
                    self.out.push(0x00);
                }
                self.acc = 0;
                self.n = 0;
            }
        }
    }

    /// Pad to a byte boundary with one bits
    pub fn flush(&mut self) {
        while self.n != 0 {
            self.put(1, 1);
        }
    }
}

/// Magnitude category and extra bits of a coefficient
pub fn category(value: i32) -> (u8, u32) {
    let size = (32 - value.unsigned_abs().leading_zeros()) as u8;
    let bits = if value < 0 { value + (1 << size) - 1 } else { value };

    (size, bits as u32 & ((1_u32 << size) - 1))
}

/// Forward DCT of one 8x8 block, level shifted and quantized
pub fn fdct_quantize(samples: &[u8; 64], quant: &[u16; 64]) -> [i32; 64] {
    let mut out = [0; 64];

    for v in 0..8 {
        for u in 0..8 {
            let cu = if u == 0 { 1.0 / 2_f64.sqrt() } else { 1.0 };
            let cv = if v == 0 { 1.0 / 2_f64.sqrt() } else { 1.0 };
            let mut sum = 0.0;

            for y in 0..8 {
                for x in 0..8 {
                    let s = f64::from(samples[y * 8 + x]) - 128.0;

                    sum += s
                        * (((2 * x + 1) as f64 * u as f64 * PI) / 16.0).cos()
                        * (((2 * y + 1) as f64 * v as f64 * PI) / 16.0).cos();
                }
            }
            let coefficient = 0.25 * cu * cv * sum;

            out[v * 8 + u] = (coefficient / f64::from(quant[v * 8 + u])).round() as i32;
        }
    }
    out
}

/// Sample plane dimensions of a component
pub fn component_size(
    width: usize, height: usize, h: usize, v: usize, h_max: usize, v_max: usize
) -> (usize, usize) {
    ((width * h).div_ceil(h_max), (height * v).div_ceil(v_max))
}

impl TestEncoder {
    /// A baseline encoder with a flat quantization table of 1
    pub fn new(width: usize, height: usize) -> TestEncoder {
        TestEncoder {
            width,
            height,
            components: vec![],
            quant: [1; 64],
            restart_interval: 0,
            interleaved: true,
            progressive: false,
            segments: vec![]
        }
    }

    /// Add a component, `sample(x, y)` is called for every position of
    /// the component plane
    ///
    /// The component with the largest sampling factors must come first.
    pub fn component(
        mut self, id: u8, h: usize, v: usize, sample: impl Fn(usize, usize) -> u8
    ) -> Self {
        let h_max = self.components.first().map_or(h, |c| c.h);
        let v_max = self.components.first().map_or(v, |c| c.v);
        let (cw, ch) = component_size(self.width, self.height, h, v, h_max, v_max);

        let samples = (0..ch)
            .flat_map(|y| (0..cw).map(move |x| (x, y)))
            .map(|(x, y)| sample(x, y))
            .collect();

        self.components.push(TestComponent { id, h, v, samples });
        self
    }

    pub fn segment(mut self, marker: u8, payload: &[u8]) -> Self {
        self.segments.push((marker, payload.to_vec()));
        self
    }

    fn max_sampling(&self) -> (usize, usize) {
        let h_max = self.components.iter().map(|c| c.h).max().unwrap_or(1);
        let v_max = self.components.iter().map(|c| c.v).max().unwrap_or(1);
        (h_max, v_max)
    }

    /// Quantized coefficients of every block in the padded block grid
    /// of component `k`, with the grid width in blocks
    fn blocks(&self, k: usize) -> (Vec<[i32; 64]>, usize) {
        let (h_max, v_max) = self.max_sampling();
        let c = &self.components[k];
        let (cw, ch) = component_size(self.width, self.height, c.h, c.v, h_max, v_max);

        assert_eq!(c.samples.len(), cw * ch, "component added before a larger one");

        let mcu_x = self.width.div_ceil(8 * h_max);
        let mcu_y = self.height.div_ceil(8 * v_max);
        let (grid_w, grid_h) = (mcu_x * c.h, mcu_y * c.v);

        let mut blocks = Vec::with_capacity(grid_w * grid_h);

        for by in 0..grid_h {
            for bx in 0..grid_w {
                let mut samples = [0; 64];

                for y in 0..8 {
                    for x in 0..8 {
                        let sx = (bx * 8 + x).min(cw - 1);
                        let sy = (by * 8 + y).min(ch - 1);
                        samples[y * 8 + x] = c.samples[sy * cw + sx];
                    }
                }
                blocks.push(fdct_quantize(&samples, &self.quant));
            }
        }
        (blocks, grid_w)
    }

    fn write_segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
        out.extend([0xFF, marker]);
        out.extend(((payload.len() + 2) as u16).to_be_bytes());
        out.extend(payload);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];

        for (marker, payload) in &self.segments {
            Self::write_segment(&mut out, *marker, payload);
        }
        // DQT
        let mut dqt = vec![0x00];
        dqt.extend(ZIGZAG.iter().map(|natural| self.quant[*natural] as u8));
        Self::write_segment(&mut out, 0xDB, &dqt);

        // SOF
        let mut sof = vec![8];
        sof.extend((self.height as u16).to_be_bytes());
        sof.extend((self.width as u16).to_be_bytes());
        sof.push(self.components.len() as u8);
        for c in &self.components {
            sof.extend([c.id, ((c.h as u8) << 4) | c.v as u8, 0]);
        }
        Self::write_segment(&mut out, if self.progressive { 0xC2 } else { 0xC0 }, &sof);

        // DHT
        let (dc_counts, dc_symbols) = dc_table();
        let (ac_counts, ac_symbols) = ac_table();
        let mut dht = vec![0x00];
        dht.extend(&dc_counts[1..]);
        dht.extend(&dc_symbols);
        dht.push(0x10);
        dht.extend(&ac_counts[1..]);
        dht.extend(&ac_symbols);
        Self::write_segment(&mut out, 0xC4, &dht);

        if self.restart_interval > 0 {
            Self::write_segment(&mut out, 0xDD, &self.restart_interval.to_be_bytes());
        }

        let dc = Codes::new(&dc_counts, &dc_symbols);
        let ac = Codes::new(&ac_counts, &ac_symbols);
        let blocks: Vec<(Vec<[i32; 64]>, usize)> =
            (0..self.components.len()).map(|k| self.blocks(k)).collect();

        if self.progressive {
            self.progressive_scans(&mut out, &blocks, &dc, &ac);
        } else if self.interleaved || self.components.len() == 1 {
            let all: Vec<usize> = (0..self.components.len()).collect();
            self.baseline_scan(&mut out, &all, &blocks, &dc, &ac);
        } else {
            for k in 0..self.components.len() {
                self.baseline_scan(&mut out, &[k], &blocks, &dc, &ac);
            }
        }
        out.extend([0xFF, 0xD9]);
        out
    }

    fn sos(&self, out: &mut Vec<u8>, components: &[usize], ss: u8, se: u8, ah: u8, al: u8) {
        let mut sos = vec![components.len() as u8];

        for k in components {
            sos.extend([self.components[*k].id, 0x00]);
        }
        sos.extend([ss, se, (ah << 4) | al]);
        Self::write_segment(out, 0xDA, &sos);
    }

    /// Positions, in block grid units, of the blocks a scan visits in order
    fn scan_order(
        &self, components: &[usize], blocks: &[(Vec<[i32; 64]>, usize)]
    ) -> Vec<Vec<(usize, usize)>> {
        let (h_max, v_max) = self.max_sampling();

        if components.len() == 1 {
            // non interleaved, only blocks holding image data
            let c = &self.components[components[0]];
            let (cw, ch) = component_size(self.width, self.height, c.h, c.v, h_max, v_max);
            let grid_w = blocks[components[0]].1;

            return (0..ch.div_ceil(8))
                .flat_map(|y| (0..cw.div_ceil(8)).map(move |x| vec![(components[0], y * grid_w + x)]))
                .collect();
        }
        let mcu_x = self.width.div_ceil(8 * h_max);
        let mcu_y = self.height.div_ceil(8 * v_max);
        let mut order = vec![];

        for my in 0..mcu_y {
            for mx in 0..mcu_x {
                let mut mcu = vec![];

                for &k in components {
                    let c = &self.components[k];
                    let grid_w = blocks[k].1;

                    for v in 0..c.v {
                        for h in 0..c.h {
                            mcu.push((k, (my * c.v + v) * grid_w + mx * c.h + h));
                        }
                    }
                }
                order.push(mcu);
            }
        }
        order
    }

    fn baseline_scan(
        &self, out: &mut Vec<u8>, components: &[usize], blocks: &[(Vec<[i32; 64]>, usize)], dc: &Codes,
        ac: &Codes
    ) {
        self.sos(out, components, 0, 63, 0, 0);

        let mut writer = BitWriter::new();
        let mut predictions = vec![0; self.components.len()];
        let mut restarts = 0_u8;

        for (i, mcu) in self.scan_order(components, blocks).iter().enumerate() {
            if self.restart_interval > 0 && i > 0 && i % usize::from(self.restart_interval) == 0 {
                writer.flush();
                writer.out.extend([0xFF, 0xD0 + restarts]);
                restarts = (restarts + 1) & 7;
                predictions.iter_mut().for_each(|p| *p = 0);
            }
            for &(k, index) in mcu {
                let block = &blocks[k].0[index];
                let (size, bits) = category(block[0] - predictions[k]);

                predictions[k] = block[0];

                let (code, length) = dc.get(size);
                writer.put(u32::from(code), length);
                writer.put(bits, size);

                encode_ac(&mut writer, ac, block, 1, 63);
            }
        }
        writer.flush();
        out.extend(writer.out);
    }

    fn progressive_scans(
        &self, out: &mut Vec<u8>, blocks: &[(Vec<[i32; 64]>, usize)], dc: &Codes, ac: &Codes
    ) {
        let all: Vec<usize> = (0..self.components.len()).collect();
        let order = self.scan_order(&all, blocks);

        // DC first, point transform of one
        self.sos(out, &all, 0, 0, 0, 1);
        let mut writer = BitWriter::new();
        let mut predictions = vec![0; self.components.len()];

        for &(k, index) in order.iter().flatten() {
            let value = blocks[k].0[index][0] >> 1;
            let (size, bits) = category(value - predictions[k]);

            predictions[k] = value;

            let (code, length) = dc.get(size);
            writer.put(u32::from(code), length);
            writer.put(bits, size);
        }
        writer.flush();
        out.extend(writer.out);

        // DC refinement
        self.sos(out, &all, 0, 0, 1, 0);
        let mut writer = BitWriter::new();

        for &(k, index) in order.iter().flatten() {
            writer.put((blocks[k].0[index][0] & 1) as u32, 1);
        }
        writer.flush();
        out.extend(writer.out);

        // AC, one scan per component
        for k in 0..self.components.len() {
            self.sos(out, &[k], 1, 63, 0, 0);
            let mut writer = BitWriter::new();

            for &(k, index) in self.scan_order(&[k], blocks).iter().flatten() {
                encode_ac(&mut writer, ac, &blocks[k].0[index], 1, 63);
            }
            writer.flush();
            out.extend(writer.out);
        }
    }
}

/// Run length code the coefficients `start..=end` of a block
fn encode_ac(writer: &mut BitWriter, ac: &Codes, block: &[i32; 64], start: usize, end: usize) {
    let mut run = 0;

    for &natural in &ZIGZAG[start..=end] {
        let value = block[natural];

        if value == 0 {
            run += 1;
            continue;
        }
        while run > 15 {
            let (code, length) = ac.get(0xF0);
            writer.put(u32::from(code), length);
            run -= 16;
        }
        let (size, bits) = category(value);
        assert!(size <= 10, "coefficient {value} too large for the test tables");

        let (code, length) = ac.get(((run as u8) << 4) | size);
        writer.put(u32::from(code), length);
        writer.put(bits, size);
        run = 0;
    }
    if run > 0 {
        let (code, length) = ac.get(0x00);
        writer.put(u32::from(code), length);
    }
}

/// Positions of every `0xFF 0xD0..=0xD7` pair in a stream
pub fn restart_positions(data: &[u8]) -> Vec<usize> {
    data.windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] == 0xFF && (0xD0..=0xD7).contains(&w[1]))
        .map(|(i, _)| i)
        .collect()
}

/// Index of the first start of scan marker
pub fn first_sos(data: &[u8]) -> usize {
    data.windows(2)
        .position(|w| w == [0xFF, 0xDA])
        .expect("stream has a scan")
}

/// A smooth test pattern
pub fn gradient(x: usize, y: usize) -> u8 {
    (40 + x * 3 + y * 2).min(255) as u8
}
