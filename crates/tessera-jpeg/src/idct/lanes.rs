/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Four lane integer IDCT
//!
//! The shared kernel run on four columns (or rows) at a time.
//! Lanes are plain arrays, the compiler is left to map them to
//! whatever vector unit the target has.
//!
//! Every operation wraps like its scalar counterpart, so both produce
//! identical samples for any input.
#![allow(clippy::cast_possible_truncation)]

use core::ops::{Add, Sub};

use crate::idct::scalar::idct_int_1x1;
use crate::idct::{idct_1d, Lane, COLUMN_BIAS, COLUMN_SHIFT, ROW_BIAS, ROW_SHIFT};

/// Four `i32`s processed together
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct I32x4([i32; 4]);

impl I32x4 {
    /// Load four consecutive values starting at `start`
    #[inline(always)]
    fn load(data: &[i32; 64], start: usize) -> I32x4 {
        I32x4([data[start], data[start + 1], data[start + 2], data[start + 3]])
    }

    /// Load one value from each of four rows starting at row `row`
    #[inline(always)]
    fn gather_rows(data: &[i32; 64], row: usize, column: usize) -> I32x4 {
        let base = row * 8 + column;
        I32x4([data[base], data[base + 8], data[base + 16], data[base + 24]])
    }

    #[inline(always)]
    fn store(self, data: &mut [i32; 64], start: usize) {
        data[start..start + 4].copy_from_slice(&self.0);
    }

    #[inline(always)]
    fn map(self, f: impl Fn(i32) -> i32) -> I32x4 {
        I32x4(self.0.map(f))
    }

    #[inline(always)]
    fn zip(self, other: I32x4, f: impl Fn(i32, i32) -> i32) -> I32x4 {
        let (a, b) = (self.0, other.0);
        I32x4([f(a[0], b[0]), f(a[1], b[1]), f(a[2], b[2]), f(a[3], b[3])])
    }

    #[inline(always)]
    fn clamp_u8(self) -> [i16; 4] {
        self.0.map(|x| x.clamp(0, 255) as i16)
    }
}

impl Add for I32x4 {
    type Output = I32x4;

    #[inline(always)]
    fn add(self, rhs: I32x4) -> I32x4 {
        self.zip(rhs, i32::wrapping_add)
    }
}

impl Sub for I32x4 {
    type Output = I32x4;

    #[inline(always)]
    fn sub(self, rhs: I32x4) -> I32x4 {
        self.zip(rhs, i32::wrapping_sub)
    }
}

impl Lane for I32x4 {
    #[inline(always)]
    fn splat(value: i32) -> I32x4 {
        I32x4([value; 4])
    }

    #[inline(always)]
    fn scale(self, by: i32) -> I32x4 {
        self.map(|x| x.wrapping_mul(by))
    }

    #[inline(always)]
    fn descale(self, bits: u32) -> I32x4 {
        self.map(|x| x >> bits)
    }

    #[inline(always)]
    fn widen(self) -> I32x4 {
        self.map(|x| x.wrapping_shl(12))
    }
}

/// Inverse DCT of a dequantized block in natural order, four lanes at a time
///
/// Same contract as [`idct_int`](crate::idct::scalar::idct_int).
pub fn idct_lanes(in_vector: &mut [i32; 64], out_vector: &mut [i16], stride: usize) {
    if in_vector[1..].iter().all(|x| *x == 0) {
        return idct_int_1x1(in_vector, out_vector, stride);
    }

    // vertical pass, columns 0..4 then 4..8
    for column in [0, 4] {
        let mut v = [I32x4::default(); 8];

        for (row, lane) in v.iter_mut().enumerate() {
            *lane = I32x4::load(in_vector, row * 8 + column);
        }

        let result = idct_1d(v, COLUMN_BIAS, COLUMN_SHIFT);

        for (row, lane) in result.iter().enumerate() {
            lane.store(in_vector, row * 8 + column);
        }
    }

    // horizontal pass, rows 0..4 then 4..8
    for first_row in [0, 4] {
        let mut v = [I32x4::default(); 8];

        for (column, lane) in v.iter_mut().enumerate() {
            *lane = I32x4::gather_rows(in_vector, first_row, column);
        }

        let result = idct_1d(v, ROW_BIAS, ROW_SHIFT).map(I32x4::clamp_u8);

        for lane in 0..4 {
            let start = (first_row + lane) * stride;
            let out = &mut out_vector[start..start + 8];

            for (sample, column) in out.iter_mut().zip(result.iter()) {
                *sample = column[lane];
            }
        }
    }
}
