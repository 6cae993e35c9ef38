/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Contains most common errors that may be encountered in decoding a Decoder
//! image
//!
//! Fatal conditions are reported as [`DecodeErrors`], recoverable ones
//! are collected as [`DecodeWarning`]s and exposed by the decoder.

use core::fmt::{Debug, Display, Formatter};

use tessera_core::bytestream::ByteIoError;
use tessera_core::colorspace::ColorSpace;

use crate::misc::{
    START_OF_FRAME_EXT_AR, START_OF_FRAME_HIER_AR_DIFF, START_OF_FRAME_HIER_AR_PROG,
    START_OF_FRAME_HIER_AR_SEQ, START_OF_FRAME_HIER_DIFF, START_OF_FRAME_HIER_PROG,
    START_OF_FRAME_HIER_SEQ, START_OF_FRAME_LOS_SEQ, START_OF_FRAME_LOS_SEQ_AR,
    START_OF_FRAME_PROG_DCT_AR
};
use crate::restart::ResyncAction;

/// Common Decode errors
#[allow(clippy::module_name_repetitions)]
pub enum DecodeErrors {
    /// Any other thing we do not know
    Format(String),
    /// Any other thing we do not know but we
    /// don't need to allocate space on the heap
    FormatStatic(&'static str),
    /// Illegal Magic Bytes
    IllegalMagicBytes(u16),
    /// problems with the Huffman Tables in a Decoder file
    HuffmanDecode(String),
    /// Image has zero width
    ZeroError,
    /// Discrete Quantization Tables error
    DqtError(String),
    /// Start of scan errors
    SosError(String),
    /// Start of frame errors
    SofError(String),
    /// UnsupportedImages
    Unsupported(UnsupportedSchemes),
    /// MCU errors
    MCUError(String),
    /// Exhausted data before any scan could be decoded
    ExhaustedData,
    /// Large image dimensions(Corrupted data)?
    LargeDimensions(usize),
    /// The caller asked the decoder to stop
    Cancelled,
    /// A recoverable problem found while strict mode is on
    StrictMode(DecodeWarning),
    /// Errors from the underlying byte reader
    IoErrors(ByteIoError)
}

/// Broad classes of decode failures
///
/// Callers use this to tell a broken stream apart from
/// a valid stream the decoder does not handle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The stream is not a well formed jpeg
    Structural,
    /// A Huffman or quantization table is malformed, missing or misused
    Table,
    /// The stream is valid but uses a feature the decoder does not implement
    Unsupported,
    /// Decoding was aborted by the caller
    Cancelled
}

impl DecodeErrors {
    /// Classify this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::HuffmanDecode(_) | Self::DqtError(_) => ErrorKind::Table,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Format(_)
            | Self::FormatStatic(_)
            | Self::IllegalMagicBytes(_)
            | Self::ZeroError
            | Self::SosError(_)
            | Self::SofError(_)
            | Self::MCUError(_)
            | Self::ExhaustedData
            | Self::LargeDimensions(_)
            | Self::StrictMode(_)
            | Self::IoErrors(_) => ErrorKind::Structural
        }
    }
}

impl From<&'static str> for DecodeErrors {
    fn from(data: &'static str) -> Self {
        return Self::FormatStatic(data);
    }
}

impl From<ByteIoError> for DecodeErrors {
    fn from(data: ByteIoError) -> Self {
        return Self::IoErrors(data);
    }
}

impl Debug for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Format(a) => write!(f, "{a:?}"),
            Self::FormatStatic(a) => write!(f, "{:?}", &a),

            Self::HuffmanDecode(reason) => {
                write!(f, "Error decoding huffman values: {reason}")
            }
            Self::ZeroError => write!(f, "Image width or height is set to zero, cannot continue"),
            Self::DqtError(reason) => write!(f, "Error parsing DQT segment. Reason:{reason}"),
            Self::SosError(reason) => write!(f, "Error parsing SOS Segment. Reason:{reason}"),
            Self::SofError(reason) => write!(f, "Error parsing SOF segment. Reason:{reason}"),
            Self::IllegalMagicBytes(bytes) => {
                write!(f, "Error parsing image. Illegal start bytes:{bytes:X}")
            }
            Self::MCUError(reason) => write!(f, "Error in decoding MCU. Reason {reason}"),
            Self::Unsupported(image_type) => {
                write!(f, "{image_type:?}")
            }
            Self::ExhaustedData => write!(f, "Exhausted data in the image"),
            Self::LargeDimensions(dimensions) => write!(
                f,
                "Too large dimensions {dimensions},library supports up to {}",
                crate::decoder::MAX_DIMENSIONS
            ),
            Self::Cancelled => write!(f, "Decoding was cancelled"),
            Self::StrictMode(warning) => write!(f, "[strict-mode]: {warning}"),
            Self::IoErrors(e) => write!(f, "I/O error: {e:?}")
        }
    }
}

impl Display for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for DecodeErrors {}

/// Contains Unsupported/Yet-to-be supported Decoder image encoding types.
#[derive(Eq, PartialEq, Copy, Clone)]
pub enum UnsupportedSchemes {
    /// SOF_9, extended sequential DCT, arithmetic coding
    ExtendedSequentialDctArithmetic,
    /// SOF_3, Lossless (sequential), huffman coding,
    LosslessHuffman,
    /// SOF_10, Progressive DCT, arithmetic coding,
    ProgressiveDctArithmetic,
    /// SOF_11, Lossless ( sequential), arithmetic coding
    LosslessArithmetic,
    /// SOF_5..7 and SOF_13..15, differential (hierarchical) frames
    Hierarchical,
    /// Arithmetic conditioning tables (DAC)
    ArithmeticConditioning,
    /// Sample precision other than 8 bits
    SamplePrecision(u8),
    /// Frames with a component count other than 1, 3 or 4
    ComponentCount(u8),
    /// Component sampling factors that do not evenly divide the maximum
    NonIntegralSampling,
    /// No conversion exists between the two colorspaces
    ColorConversion(ColorSpace, ColorSpace)
}

impl Debug for UnsupportedSchemes {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ExtendedSequentialDctArithmetic => {
                write!(f,"The library cannot yet decode images encoded using Extended Sequential DCT Arithmetic scheme yet.")
            }
            Self::LosslessHuffman => {
                write!(f,"The library cannot yet decode images encoded with Lossless Huffman encoding scheme yet.")
            }
            Self::ProgressiveDctArithmetic => {
                write!(f,"The library cannot yet decode Images Encoded with Progressive DCT Arithmetic scheme yet.")
            }
            Self::LosslessArithmetic => {
                write!(f,"The library cannot yet decode images encoded with Lossless Arithmetic encoding scheme yet.")
            }
            Self::Hierarchical => {
                write!(f, "The library cannot decode hierarchical (differential) frames.")
            }
            Self::ArithmeticConditioning => {
                write!(f, "The library does not support arithmetic conditioning tables.")
            }
            Self::SamplePrecision(precision) => {
                write!(f, "The library can only decode 8-bit images, the image has {precision} bits of precision")
            }
            Self::ComponentCount(count) => {
                write!(f, "The library can decode images with 1, 3 or 4 components, the image has {count}")
            }
            Self::NonIntegralSampling => {
                write!(f, "The library cannot decode images whose sampling factors are not integral ratios.")
            }
            Self::ColorConversion(from, to) => {
                write!(f, "Unimplemented colorspace mapping from {from:?} to {to:?}")
            }
        }
    }
}

impl UnsupportedSchemes {
    /// Create an unsupported scheme from the second byte of a SOF marker
    #[must_use]
    pub fn from_int(int: u8) -> Option<UnsupportedSchemes> {
        let int = u16::from_be_bytes([0xff, int]);

        match int {
            START_OF_FRAME_PROG_DCT_AR => Some(Self::ProgressiveDctArithmetic),
            START_OF_FRAME_LOS_SEQ => Some(Self::LosslessHuffman),
            START_OF_FRAME_LOS_SEQ_AR => Some(Self::LosslessArithmetic),
            START_OF_FRAME_EXT_AR => Some(Self::ExtendedSequentialDctArithmetic),
            START_OF_FRAME_HIER_SEQ
            | START_OF_FRAME_HIER_PROG
            | START_OF_FRAME_HIER_DIFF
            | START_OF_FRAME_HIER_AR_SEQ
            | START_OF_FRAME_HIER_AR_PROG
            | START_OF_FRAME_HIER_AR_DIFF => Some(Self::Hierarchical),
            _ => None
        }
    }
}

/// Recoverable problems found while decoding
///
/// None of these stop decoding unless strict mode is enabled,
/// they are kept in the order they occurred and can be read back
/// with [`JpegDecoder::warnings`](crate::JpegDecoder::warnings)
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeWarning {
    /// Bytes that are not part of any segment appeared before a marker
    ExtraneousBytes { count: usize, marker: u8 },
    /// A restart marker other than the expected one was found
    RestartResync {
        expected: u8,
        found:    u8,
        action:   ResyncAction
    },
    /// The stream ended where a restart marker was expected
    MissingRestartMarker { expected: u8 },
    /// Entropy coded data ended before all blocks of a scan were decoded
    TruncatedSegment,
    /// A marker that is not allowed inside entropy coded data
    UnexpectedMarker(u8),
    /// Data present after the end of image marker
    TrailingBytesAfterEoi(usize),
    /// The stream ended without an end of image marker
    MissingEoi,
    /// A single component image declared sampling factors other than 1x1
    DownsampledGrayscale
}

impl Display for DecodeWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ExtraneousBytes { count, marker } => {
                write!(f, "Extra bytes {count} before marker 0xFF{marker:X}")
            }
            Self::RestartResync {
                expected,
                found,
                action
            } => write!(
                f,
                "Expected RST{expected} but found marker 0xFF{found:X}, resynchronizing with {action:?}"
            ),
            Self::MissingRestartMarker { expected } => {
                write!(f, "Data ended while looking for RST{expected}")
            }
            Self::TruncatedSegment => write!(f, "Premature end of entropy coded data"),
            Self::UnexpectedMarker(marker) => {
                write!(f, "Marker 0xFF{marker:X} found inside entropy coded data")
            }
            Self::TrailingBytesAfterEoi(count) => {
                write!(f, "{count} bytes found after the end of image marker")
            }
            Self::MissingEoi => write!(f, "No end of image marker"),
            Self::DownsampledGrayscale => {
                write!(f, "Grayscale image with down-sampled component, resetting component details")
            }
        }
    }
}
