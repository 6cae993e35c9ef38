/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Platform independent IDCT algorithm
//!
//! Runs the shared 8 point kernel on one column, then one row, at a time.
use core::num::Wrapping;

use crate::idct::{idct_1d, Lane, COLUMN_BIAS, COLUMN_SHIFT, ROW_BIAS, ROW_SHIFT};

impl Lane for Wrapping<i32> {
    #[inline(always)]
    fn splat(value: i32) -> Self {
        Wrapping(value)
    }

    #[inline(always)]
    fn scale(self, by: i32) -> Self {
        self * Wrapping(by)
    }

    #[inline(always)]
    fn descale(self, bits: u32) -> Self {
        Wrapping(self.0 >> bits)
    }

    #[inline(always)]
    fn widen(self) -> Self {
        Wrapping(self.0.wrapping_shl(12))
    }
}

/// The value every sample of a block with only a DC coefficient takes
#[inline(always)]
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn dc_only_value(dc: i32) -> i16 {
    // DC / 8, rounded, plus the level shift
    (dc.wrapping_add(4 + 1024) >> 3).clamp(0, 255) as i16
}

/// Fill an 8x8 area of `out_vector` with the result of a DC only block
#[inline]
pub fn idct_int_1x1(in_vector: &mut [i32; 64], out_vector: &mut [i16], stride: usize) {
    let coeff = dc_only_value(in_vector[0]);

    for row in out_vector.chunks_mut(stride).take(8) {
        row[..8].fill(coeff);
    }
}

/// Inverse DCT of a dequantized block in natural order
///
/// `in_vector` is used as scratch space and is clobbered.
/// Eight rows of eight samples are written to `out_vector`,
/// `stride` samples apart.
#[allow(clippy::cast_possible_truncation)]
pub fn idct_int(in_vector: &mut [i32; 64], out_vector: &mut [i16], stride: usize) {
    if in_vector[1..].iter().all(|x| *x == 0) {
        return idct_int_1x1(in_vector, out_vector, stride);
    }

    for column in 0..8 {
        let v = core::array::from_fn(|row| Wrapping(in_vector[row * 8 + column]));

        for (row, value) in idct_1d(v, COLUMN_BIAS, COLUMN_SHIFT).iter().enumerate() {
            in_vector[row * 8 + column] = value.0;
        }
    }

    for (row, out) in out_vector.chunks_mut(stride).take(8).enumerate() {
        let v = core::array::from_fn(|column| Wrapping(in_vector[row * 8 + column]));
        let samples = idct_1d(v, ROW_BIAS, ROW_SHIFT);

        for (sample, value) in out[..8].iter_mut().zip(samples) {
            *sample = value.0.clamp(0, 255) as i16;
        }
    }
}
