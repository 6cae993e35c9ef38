/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Routines for IDCT
//!
//! Two routines are provided, a scalar one and one working on four
//! lanes at a time. Both produce the same samples for every input,
//! the choice only affects speed.
//!
//! Both take dequantized coefficients in natural order, clobber them,
//! and write an 8x8 block of level shifted samples.
#![allow(clippy::module_name_repetitions)]

use core::ops::{Add, Sub};

use tessera_core::log::debug;
use tessera_core::options::DecoderOptions;

use crate::decoder::IDCTPtr;

pub mod lanes;
pub mod scalar;

/// Added before the column pass shift, rounds to nearest
pub(crate) const COLUMN_BIAS: i32 = 1 << 9;

/// Added before the row pass shift, rounds to nearest and moves
/// samples from -128..128 to 0..256
pub(crate) const ROW_BIAS: i32 = (1 << 9) + (1 << 16) + (128 << 17);

pub(crate) const COLUMN_SHIFT: u32 = 10;
pub(crate) const ROW_SHIFT: u32 = 17;

// cosine terms in 12 bit fixed point
const C_0_298: i32 = 1223;
const C_0_390: i32 = 1597;
const C_0_541: i32 = 2217;
const C_0_765: i32 = 3135;
const C_0_899: i32 = 3685;
const C_1_175: i32 = 4816;
const C_1_501: i32 = 6149;
const C_1_847: i32 = 7567;
const C_1_961: i32 = 8034;
const C_2_053: i32 = 8410;
const C_2_562: i32 = 10497;
const C_3_072: i32 = 12586;

/// A value the 8 point kernel can run on, one `i32` or several side by side
///
/// All arithmetic wraps so that garbage coefficients from a damaged
/// stream produce garbage samples instead of a panic.
pub(crate) trait Lane: Copy + Add<Output = Self> + Sub<Output = Self> {
    fn splat(value: i32) -> Self;

    /// Multiply by a fixed point constant
    fn scale(self, by: i32) -> Self;

    /// Arithmetic shift right
    fn descale(self, bits: u32) -> Self;

    /// Move an integer coefficient to 12 bit fixed point
    fn widen(self) -> Self;
}

/// One dimensional 8 point inverse DCT
///
/// `v` holds eight coefficients of one row or column. `bias` is added
/// to every output before it is shifted right by `shift`.
#[inline(always)]
pub(crate) fn idct_1d<L: Lane>(v: [L; 8], bias: i32, shift: u32) -> [L; 8] {
    let bias = L::splat(bias);

    // even half from coefficients 0, 2, 4 and 6
    let rotated = (v[2] + v[6]).scale(C_0_541);
    let e2 = rotated - v[6].scale(C_1_847);
    let e3 = rotated + v[2].scale(C_0_765);

    let e0 = (v[0] + v[4]).widen();
    let e1 = (v[0] - v[4]).widen();

    let even = [e0 + e3 + bias, e1 + e2 + bias, e1 - e2 + bias, e0 - e3 + bias];

    // odd half from coefficients 1, 3, 5 and 7
    let (c1, c3, c5, c7) = (v[1], v[3], v[5], v[7]);

    let z13 = c1 + c3;
    let z17 = (c1 + c7).scale(-C_0_899);
    let z35 = (c3 + c5).scale(-C_2_562);
    let z37 = (c3 + c7).scale(-C_1_961);
    let z15 = (c1 + c5).scale(-C_0_390);
    let common = (z13 + c5 + c7).scale(C_1_175);

    let odd = [
        c1.scale(C_1_501) + common + z17 + z15,
        c3.scale(C_3_072) + common + z35 + z37,
        c5.scale(C_2_053) + common + z35 + z15,
        c7.scale(C_0_298) + common + z17 + z37
    ];

    core::array::from_fn(|i| {
        if i < 4 {
            (even[i] + odd[i]).descale(shift)
        } else {
            (even[7 - i] - odd[7 - i]).descale(shift)
        }
    })
}

/// Choose an appropriate IDCT function
pub fn choose_idct_func(options: &DecoderOptions) -> IDCTPtr {
    if options.jpeg_get_use_lanes() {
        debug!("Using four lane integer IDCT");
        return lanes::idct_lanes;
    }
    debug!("Using scalar integer IDCT");
    // use generic one
    scalar::idct_int
}

/// Multiply a block of coefficients by its quantization table
#[inline(always)]
pub(crate) fn dequantize(block: &[i16], table: &[i32; 64], out: &mut [i32; 64]) {
    for ((x, out), qt_val) in block.iter().zip(out.iter_mut()).zip(table.iter()) {
        *out = i32::from(*x).wrapping_mul(*qt_val);
    }
}
