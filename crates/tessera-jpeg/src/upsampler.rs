/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Up-sampling routines
//!
//! The main upsampling method is a bi-linear interpolation or a "triangle
//! filter " or libjpeg turbo `fancy_upsampling` which is a good compromise
//! between speed and visual quality. It is used for 2x1, 1x2 and 2x2
//! ratios, other integral ratios replicate samples.
//!
//! # The filter
//! Each output pixel is made from `(3*A+B)/4` where A is the original
//! pixel closer to the output and B is the one further.
//!
//! ```text
//!+---+---+
//! | A | B |
//! +---+---+
//! +-+-+-+-+
//! | |P| | |
//! +-+-+-+-+
//! ```
//!
//! # Horizontal
//! `A` becomes the input closest to the output.
//!
//! `B` varies depending on output.
//!  - For odd positions, input is the `next` pixel after A
//!  - For even positions, input is the `previous` value before A.
//!
//! The first and last outputs copy the edge samples.
//!
//! # Vertical
//! ```text
//! +----+----+
//! | A1 | A2 |
//! +----+----+
//! +----+----+
//! | p1 | p2 |
//! +----+-+--+
//! +----+-+--+
//! | p3 | p4 |
//! +----+-+--+
//! +----+----+
//! | B1 | B2 |
//! +----+----+
//! ```
//!
//! For `p1`
//! - `A1` is given a weight of `3` and `B1` is given a weight of 1.
//!
//! For `p3`
//! - `B1` is given a weight of `3` and `A1` is given a weight of 1
//!
//! Rows outside the plane are clamped to the first or last row.
//!
//! # Horizontal and vertical
//!
//! Carry out a vertical filter in the first pass, then a horizontal filter in the second pass.
//!
//! Upsampling works one output row at a time so that it can be
//! fused with colour conversion and split between threads.

pub(crate) mod scalar;

/// A decoded component plane
#[derive(Copy, Clone, Debug)]
pub(crate) struct Plane<'a> {
    pub data:   &'a [i16],
    /// distance between rows in `data`
    pub stride: usize,
    /// samples per row that carry image data
    pub width:  usize,
    /// rows that carry image data
    pub height: usize
}

impl<'a> Plane<'a> {
    #[inline]
    fn row(&self, row: usize) -> &'a [i16] {
        let row = row.min(self.height.saturating_sub(1));
        let start = row * self.stride;

        &self.data[start..start + self.width]
    }
}

/// How a component is brought to full resolution
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum UpSampler {
    /// Component already at full resolution
    None,
    /// Triangle filter, twice the width
    Horizontal,
    /// Triangle filter, twice the height
    Vertical,
    /// Triangle filter in both directions
    HorizontalVertical,
    /// Repeat every sample `h` times across and `v` times down
    Replicate { h: usize, v: usize }
}

impl UpSampler {
    /// Pick an upsampler for a component sampled `h_factor` and
    /// `v_factor` times coarser than the image
    pub(crate) fn new(h_factor: usize, v_factor: usize) -> UpSampler {
        match (h_factor, v_factor) {
            (1, 1) => UpSampler::None,
            (2, 1) => UpSampler::Horizontal,
            (1, 2) => UpSampler::Vertical,
            (2, 2) => UpSampler::HorizontalVertical,
            (h, v) => UpSampler::Replicate { h, v }
        }
    }

    /// Write output row `y` of the full resolution plane into `output`
    ///
    /// `output` holds one row of the image, it may be shorter than the
    /// upsampled row, in which case the excess is dropped.
    /// `scratch` is reused between calls.
    pub(crate) fn upsample_row(
        &self, plane: &Plane, y: usize, scratch: &mut Vec<i16>, output: &mut [i16]
    ) {
        let width = plane.width;

        scratch.resize(width * 5, 0);
        let (vertical, horizontal) = scratch.split_at_mut(width);

        let row = match self {
            UpSampler::None | UpSampler::Horizontal => plane.row(y),
            UpSampler::Vertical | UpSampler::HorizontalVertical => {
                let near = y / 2;
                let far = if y % 2 == 0 {
                    near.saturating_sub(1)
                } else {
                    near + 1
                };
                scalar::upsample_vertical(plane.row(near), plane.row(far), vertical);
                &*vertical
            }
            UpSampler::Replicate { v, .. } => plane.row(y / v)
        };

        let upsampled: &[i16] = match self {
            UpSampler::None | UpSampler::Vertical => row,
            UpSampler::Horizontal | UpSampler::HorizontalVertical => {
                let out = &mut horizontal[..width * 2];
                scalar::upsample_horizontal(row, out);
                out
            }
            UpSampler::Replicate { h, .. } => {
                if *h == 1 {
                    row
                } else {
                    // sampling factors stop at 4, so h fits in the scratch space
                    let out = &mut horizontal[..width * h];
                    scalar::upsample_replicate(row, *h, out);
                    out
                }
            }
        };
        copy_row(upsampled, output);
    }
}

/// Copy a row, repeating the last sample if the source is short
fn copy_row(source: &[i16], output: &mut [i16]) {
    let len = source.len().min(output.len());

    output[..len].copy_from_slice(&source[..len]);

    if let Some(last) = source.last() {
        output[len..].fill(*last);
    }
}
