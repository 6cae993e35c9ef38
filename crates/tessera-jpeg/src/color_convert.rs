/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

//! Color space conversion routines
//!
//! A converter is picked once per image from the number of components,
//! the Adobe transform flag and the component ids. It then turns one
//! row of upsampled component samples at a time into the layout the
//! caller asked for.
//!
//! Currently supported conversions are
//!
//! | Input      | Outputs                                      |
//! |------------|----------------------------------------------|
//! | Grayscale  | RGB, RGBA, BGR, BGRA, Luma, LumaA, YCbCr     |
//! | YCbCr      | RGB, RGBA, BGR, BGRA, Luma, LumaA, YCbCr     |
//! | RGB        | RGB, RGBA, BGR, BGRA, Luma, LumaA            |
//! | CMYK, YCCK | RGB, RGBA, BGR, BGRA, Luma, LumaA, CMYK      |

use tessera_core::colorspace::ColorSpace;
use tessera_core::log::debug;

use crate::errors::{DecodeErrors, UnsupportedSchemes};

mod scalar;

use scalar::{clamp, cmyk_to_rgb, rgb_to_luma, ycbcr_to_rgb, ycck_to_cmyk, ycck_to_rgb};

/// The colour model of the samples stored in the image
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ColorConverter {
    Grayscale,
    Rgb,
    YCbCr,
    Cmyk,
    Ycck
}

impl ColorConverter {
    /// Work out how the components of an image should be interpreted
    ///
    /// `adobe_transform` is the transform byte of an Adobe APP14 segment,
    /// `ids` the component identifiers in frame order.
    pub(crate) fn select(
        components: usize, adobe_transform: Option<u8>, ids: &[u8]
    ) -> Result<ColorConverter, DecodeErrors> {
        let converter = match components {
            1 => ColorConverter::Grayscale,
            3 => match adobe_transform {
                Some(0) => ColorConverter::Rgb,
                None if ids == b"RGB" => ColorConverter::Rgb,
                _ => ColorConverter::YCbCr
            },
            4 => match adobe_transform {
                Some(2) => ColorConverter::Ycck,
                _ => ColorConverter::Cmyk
            },
            n => {
                return Err(DecodeErrors::Unsupported(UnsupportedSchemes::ComponentCount(
                    n as u8
                )))
            }
        };
        debug!("Color converter: {:?}", converter);

        Ok(converter)
    }

    /// The colorspace the samples are stored in
    pub(crate) const fn colorspace(self) -> ColorSpace {
        match self {
            ColorConverter::Grayscale => ColorSpace::Luma,
            ColorConverter::Rgb => ColorSpace::RGB,
            ColorConverter::YCbCr => ColorSpace::YCbCr,
            ColorConverter::Cmyk => ColorSpace::CMYK,
            ColorConverter::Ycck => ColorSpace::YCCK
        }
    }

    /// Check that the samples can be written out as `output`
    pub(crate) fn check_output(self, output: ColorSpace) -> Result<(), DecodeErrors> {
        let supported = match output {
            ColorSpace::RGB
            | ColorSpace::RGBA
            | ColorSpace::BGR
            | ColorSpace::BGRA
            | ColorSpace::Luma
            | ColorSpace::LumaA => true,
            ColorSpace::YCbCr => matches!(self, ColorConverter::Grayscale | ColorConverter::YCbCr),
            ColorSpace::CMYK => matches!(self, ColorConverter::Cmyk | ColorConverter::Ycck),
            _ => false
        };
        if supported {
            Ok(())
        } else {
            Err(DecodeErrors::Unsupported(UnsupportedSchemes::ColorConversion(
                self.colorspace(),
                output
            )))
        }
    }

    /// Convert one row of pixels
    ///
    /// `rows` holds one full resolution row per component, `output`
    /// receives as many pixels as fit, laid out as `colorspace`.
    /// The layout must have passed [`check_output`](Self::check_output).
    pub(crate) fn convert_row(self, rows: &[&[i16]], colorspace: ColorSpace, output: &mut [u8]) {
        let channels = colorspace.num_components();

        match colorspace {
            ColorSpace::YCbCr | ColorSpace::CMYK => self.convert_raw(rows, channels, output),
            ColorSpace::Luma | ColorSpace::LumaA => {
                for (x, pixel) in output.chunks_exact_mut(channels).enumerate() {
                    pixel[0] = self.luma(rows, x);

                    if channels == 2 {
                        pixel[1] = 255;
                    }
                }
            }
            _ => {
                let bgr = matches!(colorspace, ColorSpace::BGR | ColorSpace::BGRA);

                for (x, pixel) in output.chunks_exact_mut(channels).enumerate() {
                    let [r, g, b] = self.rgb(rows, x);

                    if bgr {
                        pixel[..3].copy_from_slice(&[b, g, r]);
                    } else {
                        pixel[..3].copy_from_slice(&[r, g, b]);
                    }
                    if channels == 4 {
                        pixel[3] = 255;
                    }
                }
            }
        }
    }

    #[inline(always)]
    fn rgb(self, rows: &[&[i16]], x: usize) -> [u8; 3] {
        match self {
            ColorConverter::Grayscale => [clamp(rows[0][x].into()); 3],
            ColorConverter::Rgb => [
                clamp(rows[0][x].into()),
                clamp(rows[1][x].into()),
                clamp(rows[2][x].into())
            ],
            ColorConverter::YCbCr => ycbcr_to_rgb(rows[0][x], rows[1][x], rows[2][x]),
            ColorConverter::Cmyk => cmyk_to_rgb(rows[0][x], rows[1][x], rows[2][x], rows[3][x]),
            ColorConverter::Ycck => ycck_to_rgb(rows[0][x], rows[1][x], rows[2][x], rows[3][x])
        }
    }

    #[inline(always)]
    fn luma(self, rows: &[&[i16]], x: usize) -> u8 {
        match self {
            // luma is stored directly
            ColorConverter::Grayscale | ColorConverter::YCbCr => clamp(rows[0][x].into()),
            _ => rgb_to_luma(self.rgb(rows, x))
        }
    }

    /// Write stored samples without a colour transform
    fn convert_raw(self, rows: &[&[i16]], channels: usize, output: &mut [u8]) {
        for (x, pixel) in output.chunks_exact_mut(channels).enumerate() {
            match self {
                ColorConverter::Grayscale => {
                    pixel.copy_from_slice(&[clamp(rows[0][x].into()), 128, 128]);
                }
                ColorConverter::Ycck => {
                    pixel.copy_from_slice(&ycck_to_cmyk(
                        rows[0][x], rows[1][x], rows[2][x], rows[3][x]
                    ));
                }
                _ => {
                    for (out, row) in pixel.iter_mut().zip(rows.iter()) {
                        *out = clamp(row[x].into());
                    }
                }
            }
        }
    }
}
