/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A simple implementation of a bytestream reader
//!
//! Useful for a lot of image readers, it's put
//! here to minimize code reuse
pub use reader::{ByteIoError, ByteReader};

mod reader;
