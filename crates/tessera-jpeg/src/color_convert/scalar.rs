/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Per pixel conversion helpers

const SCALE_BITS: i32 = 16;
const ONE_HALF: i32 = 1 << (SCALE_BITS - 1);

/// Contributions of Cb and Cr to each of R, G and B, indexed by the
/// raw chroma sample
///
/// Bt.601 full range coefficients with 16 bits of precision.
pub(crate) struct YCbCrTables {
    cr_r: [i32; 256],
    cb_b: [i32; 256],
    cr_g: [i32; 256],
    cb_g: [i32; 256]
}

/// 1.40200 * 2^16
const CR_R: i32 = 91881;
/// 1.77200 * 2^16
const CB_B: i32 = 116_130;
/// -0.71414 * 2^16
const CR_G: i32 = -46802;
/// -0.34414 * 2^16
const CB_G: i32 = -22554;

impl YCbCrTables {
    const fn new() -> YCbCrTables {
        let mut tables = YCbCrTables {
            cr_r: [0; 256],
            cb_b: [0; 256],
            cr_g: [0; 256],
            cb_g: [0; 256]
        };
        let mut i = 0;

        while i < 256 {
            let x = i as i32 - 128;

            tables.cr_r[i] = (CR_R * x + ONE_HALF) >> SCALE_BITS;
            tables.cb_b[i] = (CB_B * x + ONE_HALF) >> SCALE_BITS;
            tables.cr_g[i] = CR_G * x;
            tables.cb_g[i] = CB_G * x + ONE_HALF;
            i += 1;
        }
        tables
    }
}

pub(crate) static YCBCR_TABLES: YCbCrTables = YCbCrTables::new();

/// Limit values to 0 and 255
#[inline(always)]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn clamp(a: i32) -> u8 {
    a.clamp(0, 255) as u8
}

/// Samples out of the IDCT are already in range, chroma indexes
/// are clamped again so a bad upsampled value can never index out of bounds
#[inline(always)]
#[allow(clippy::cast_sign_loss)]
fn index(a: i16) -> usize {
    a.clamp(0, 255) as usize
}

#[inline(always)]
pub(crate) fn ycbcr_to_rgb(y: i16, cb: i16, cr: i16) -> [u8; 3] {
    let tables = &YCBCR_TABLES;
    let (y, cb, cr) = (i32::from(y), index(cb), index(cr));

    let r = y + tables.cr_r[cr];
    let g = y + ((tables.cb_g[cb] + tables.cr_g[cr]) >> SCALE_BITS);
    let b = y + tables.cb_b[cb];

    [clamp(r), clamp(g), clamp(b)]
}

/// Multiply two 8 bit values treating 255 as 1.0
///
/// Jim Blinn's trick, exact for every input pair.
#[inline(always)]
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn blinn_8x8(a: u8, b: u8) -> u8 {
    let t = u32::from(a) * u32::from(b) + 128;

    (((t >> 8) + t) >> 8) as u8
}

#[inline(always)]
pub(crate) fn cmyk_to_rgb(c: i16, m: i16, y: i16, k: i16) -> [u8; 3] {
    let k = clamp(k.into());

    [
        blinn_8x8(clamp(c.into()), k),
        blinn_8x8(clamp(m.into()), k),
        blinn_8x8(clamp(y.into()), k)
    ]
}

/// YCbCr with an inverted key channel
#[inline(always)]
pub(crate) fn ycck_to_rgb(y: i16, cb: i16, cr: i16, k: i16) -> [u8; 3] {
    let k = clamp(k.into());

    ycbcr_to_rgb(y, cb, cr).map(|x| blinn_8x8(255 - x, k))
}

/// Undo the colour transform of a YCCK pixel giving the stored CMYK values
#[inline(always)]
pub(crate) fn ycck_to_cmyk(y: i16, cb: i16, cr: i16, k: i16) -> [u8; 4] {
    let [r, g, b] = ycbcr_to_rgb(y, cb, cr);

    [255 - r, 255 - g, 255 - b, clamp(k.into())]
}

/// Bt.601 luma of an RGB pixel
#[inline(always)]
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn rgb_to_luma([r, g, b]: [u8; 3]) -> u8 {
    ((u32::from(r) * 77 + u32::from(g) * 150 + u32::from(b) * 29 + 128) >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_chroma_is_gray() {
        for y in [0, 1, 64, 128, 200, 255] {
            assert_eq!(ycbcr_to_rgb(y, 128, 128), [y as u8; 3]);
        }
    }

    #[test]
    fn primaries() {
        // pure red, green and blue encoded with Bt.601 full range
        let close = |a: [u8; 3], b: [u8; 3]| a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 1);

        assert!(close(ycbcr_to_rgb(76, 85, 255), [254, 0, 0]));
        assert!(close(ycbcr_to_rgb(150, 44, 21), [0, 255, 0]));
        assert!(close(ycbcr_to_rgb(29, 255, 107), [0, 0, 255]));
    }

    #[test]
    fn blinn_is_exact() {
        for a in 0..=255_u32 {
            for b in 0..=255_u32 {
                let exact = ((a * b) as f64 / 255.0).round() as u8;
                assert_eq!(blinn_8x8(a as u8, b as u8), exact, "{a} {b}");
            }
        }
    }

    #[test]
    fn cmyk_scaling() {
        assert_eq!(cmyk_to_rgb(255, 0, 128, 255), [255, 0, 128]);
        assert_eq!(cmyk_to_rgb(255, 255, 255, 0), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(200, 100, 50, 128), [100, 50, 25]);
    }

    #[test]
    fn ycck_inverts_through_key() {
        // white in YCC, full key
        assert_eq!(ycck_to_rgb(255, 128, 128, 255), [0, 0, 0]);
        assert_eq!(ycck_to_rgb(0, 128, 128, 255), [255, 255, 255]);
        assert_eq!(ycck_to_cmyk(0, 128, 128, 17), [255, 255, 255, 17]);
    }

    #[test]
    fn luma_weights() {
        assert_eq!(rgb_to_luma([0, 0, 0]), 0);
        assert_eq!(rgb_to_luma([255, 255, 255]), 255);
        assert_eq!(rgb_to_luma([100, 100, 100]), 100);
    }
}
