/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//!Miscellaneous stuff
use core::fmt;

/// Start of baseline DCT Huffman coding
pub const START_OF_FRAME_BASE: u16 = 0xffc0;

/// Start of another frame
pub const START_OF_FRAME_EXT_SEQ: u16 = 0xffc1;

/// Start of progressive DCT encoding
pub const START_OF_FRAME_PROG_DCT: u16 = 0xffc2;

/// Start of Lossless sequential Huffman coding
pub const START_OF_FRAME_LOS_SEQ: u16 = 0xffc3;

/// Differential sequential DCT, Huffman coding
pub const START_OF_FRAME_HIER_SEQ: u16 = 0xffc5;

/// Differential progressive DCT, Huffman coding
pub const START_OF_FRAME_HIER_PROG: u16 = 0xffc6;

/// Differential lossless, Huffman coding
pub const START_OF_FRAME_HIER_DIFF: u16 = 0xffc7;

/// Start of extended sequential DCT arithmetic coding
pub const START_OF_FRAME_EXT_AR: u16 = 0xffc9;

/// Start of Progressive DCT arithmetic coding
pub const START_OF_FRAME_PROG_DCT_AR: u16 = 0xffca;

/// Start of Lossless sequential Arithmetic coding
pub const START_OF_FRAME_LOS_SEQ_AR: u16 = 0xffcb;

/// Differential sequential DCT, arithmetic coding
pub const START_OF_FRAME_HIER_AR_SEQ: u16 = 0xffcd;

/// Differential progressive DCT, arithmetic coding
pub const START_OF_FRAME_HIER_AR_PROG: u16 = 0xffce;

/// Differential lossless, arithmetic coding
pub const START_OF_FRAME_HIER_AR_DIFF: u16 = 0xffcf;

/// Undo run length encoding of coefficients by placing them in natural order
#[rustfmt::skip]
pub const UN_ZIGZAG: [usize; 64 + 16] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
    // Prevent overflowing
    63, 63, 63, 63, 63, 63, 63, 63,
    63, 63, 63, 63, 63, 63, 63, 63
];

/// The frame types this decoder reads
///
/// Everything else a SOF marker can announce is reported through
/// [`UnsupportedSchemes`](crate::errors::UnsupportedSchemes)
#[derive(Eq, PartialEq, Copy, Clone, Hash, Default)]
#[allow(clippy::upper_case_acronyms)]
pub enum SOFMarkers {
    /// SOF0
    #[default]
    BaselineDct,
    /// SOF1, like baseline but allows four Huffman tables per class
    ExtendedSequentialHuffman,
    /// SOF2
    ProgressiveDctHuffman
}

impl SOFMarkers {
    /// Whether blocks arrive complete, one scan per component group
    pub fn is_sequential_dct(self) -> bool {
        !self.is_progressive()
    }

    pub fn is_progressive(self) -> bool {
        self == Self::ProgressiveDctHuffman
    }

    /// Map a full SOF marker to a frame type, `None` for frames we cannot read
    pub fn from_int(int: u16) -> Option<SOFMarkers> {
        match int {
            START_OF_FRAME_BASE => Some(Self::BaselineDct),
            START_OF_FRAME_EXT_SEQ => Some(Self::ExtendedSequentialHuffman),
            START_OF_FRAME_PROG_DCT => Some(Self::ProgressiveDctHuffman),
            _ => None
        }
    }
}

impl fmt::Debug for SOFMarkers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::BaselineDct => "Baseline DCT",
            Self::ExtendedSequentialHuffman => "Extended sequential DCT, Huffman coding",
            Self::ProgressiveDctHuffman => "Progressive DCT, Huffman coding"
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zigzag_is_a_permutation() {
        let mut seen = [false; 64];
        for pos in &UN_ZIGZAG[..64] {
            assert!(!seen[*pos]);
            seen[*pos] = true;
        }
        assert!(seen.iter().all(|x| *x));
    }

    #[test]
    fn sof_kinds() {
        assert!(SOFMarkers::from_int(0xffc2).unwrap().is_progressive());
        assert!(SOFMarkers::from_int(0xffc1).unwrap().is_sequential_dct());
        assert!(SOFMarkers::from_int(0xffc0).unwrap().is_sequential_dct());
        // lossless and arithmetic frames have no variant
        assert_eq!(SOFMarkers::from_int(0xffc3), None);
        assert_eq!(SOFMarkers::from_int(0xffca), None);
        assert_eq!(SOFMarkers::from_int(0xffc4), None);
    }
}
