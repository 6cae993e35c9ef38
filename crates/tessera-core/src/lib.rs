/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Core routines shared by all libraries
//!
//! This crate provides a set of core routines shared
//! by the decoders under the `tessera` umbrella
//!
//! It currently contains
//!
//! - A bytestream reader with endian aware reads
//! - Colorspace information shared by images
//! - Image decoder options
//! - Logging macros that compile to nothing unless the `log` feature is enabled
//!
//! # Features
//!  - `log`: Forward the macros in [`log`] to the [log](https://docs.rs/log) crate.
#![warn(clippy::correctness, clippy::perf, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod bytestream;
pub mod colorspace;
#[cfg(not(feature = "log"))]
pub mod log;
#[cfg(feature = "log")]
pub use log;
pub mod options;
