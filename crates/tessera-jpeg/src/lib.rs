/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//!This crate provides a library for decoding valid
//! ITU-T Rec. T.81 (JPEG-1) baseline, extended sequential and progressive images.
//!
//! # Features
//!  - Huffman coded baseline, extended (8 bit) and progressive frames
//!  - Interleaved and non interleaved scans, restart intervals with resynchronization
//!  - Triangle filter chroma upsampling
//!  - Grayscale, YCbCr, RGB, CMYK and YCCK inputs
//!  - RGB, RGBA, BGR, BGRA, Luma, LumaA, YCbCr and CMYK outputs
//!  - Multithreaded IDCT and colour conversion
//!
//! # Examples
//!
//! ## Decode a JPEG file with default arguments.
//! ```no_run
//! use tessera_jpeg::JpegDecoder;
//!
//! let data = std::fs::read("a_jpeg_file").unwrap();
//! //will contain pixels
//! let pixels = JpegDecoder::new(&data).decode().unwrap();
//! ```
//!
//! ## Decode a JPEG file to RGBA format
//!```no_run
//! use tessera_jpeg::tessera_core::colorspace::ColorSpace;
//! use tessera_jpeg::tessera_core::options::DecoderOptions;
//! use tessera_jpeg::JpegDecoder;
//!
//! let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
//!
//! let mut decoder = JpegDecoder::new_with_options(&[], options);
//! let pixels = decoder.decode().unwrap();
//! ```
//!
//! ## Get an image's width and height without decoding it
//!```no_run
//! let data = std::fs::read("a_jpeg_file").unwrap();
//! let info = tessera_jpeg::identify(&data).unwrap();
//!
//! println!("{},{}", info.width, info.height)
//! ```
//!
//! # Errors and warnings
//! The decoder tries to decode as many images as possible, as a best effort.
//! Damage it can recover from, like a corrupt restart marker or data after
//! the end of the image, is recorded as a [`DecodeWarning`] and can be read back
//! with [`JpegDecoder::warnings`]. If you are sure you will be handling
//! images that follow the standard, enable strict mode with
//! [`DecoderOptions::set_strict_mode`](tessera_core::options::DecoderOptions::set_strict_mode)
//! and every warning becomes an error.
//!
//! # Crate features
//!  - `log` (default): forward decoder diagnostics to the [log](https://docs.rs/log) crate.

#![warn(
    clippy::correctness,
    clippy::perf,
    clippy::pedantic,
    clippy::inline_always,
    clippy::missing_errors_doc,
    clippy::panic
)]
#![allow(
    clippy::needless_return,
    clippy::similar_names,
    clippy::inline_always,
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]
#![forbid(unsafe_code)]

use std::io::Read;

pub use tessera_core;
use tessera_core::options::DecoderOptions;

pub use crate::components::ComponentMetadata;
pub use crate::decoder::{ImageInfo, JfifDensity, JpegDecoder};
pub use crate::errors::{DecodeErrors, DecodeWarning, ErrorKind, UnsupportedSchemes};
pub use crate::misc::SOFMarkers;
pub use crate::restart::ResyncAction;

mod bitstream;
mod color_convert;
mod components;
mod decoder;
pub mod errors;
mod headers;
mod huffman;
pub mod idct;
mod marker;
mod mcu;
mod mcu_prog;
mod misc;
mod pool;
mod restart;
mod upsampler;
mod worker;

/// Decode an image held in memory
///
/// Returns the image information together with the pixels, laid out as
/// the options' output colorspace.
///
/// # Errors
/// See [`DecodeErrors`]. No pixels are returned if decoding fails.
pub fn decode(data: &[u8], options: DecoderOptions) -> Result<(ImageInfo, Vec<u8>), DecodeErrors> {
    let mut decoder = JpegDecoder::new_with_options(data, options);

    let pixels = decoder.decode()?;
    let info = decoder
        .info()
        .ok_or(DecodeErrors::FormatStatic("Image information missing after decode"))?;

    Ok((info, pixels))
}

/// Read the frame header of an image without decoding any scan
///
/// Parsing stops right after the start of frame segment, so segments
/// following it are not validated.
///
/// # Errors
/// Any error found before and inside the frame header
pub fn identify(data: &[u8]) -> Result<ImageInfo, DecodeErrors> {
    let mut decoder = JpegDecoder::new(data);

    decoder.decode_frame_header()?;

    decoder
        .info()
        .ok_or(DecodeErrors::FormatStatic("Premature end of data, missing frame header"))
}

/// Read a whole image from `reader` and decode it
///
/// # Errors
/// Read failures are reported as [`DecodeErrors::Format`], everything
/// else as in [`decode`]
pub fn decode_reader<R: Read>(
    mut reader: R, options: DecoderOptions
) -> Result<(ImageInfo, Vec<u8>), DecodeErrors> {
    let mut data = Vec::new();

    reader
        .read_to_end(&mut data)
        .map_err(|e| DecodeErrors::Format(format!("Could not read image: {e}")))?;

    decode(&data, options)
}
