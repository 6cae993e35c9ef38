/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

#![allow(clippy::upper_case_acronyms)]

use tessera_core::bytestream::ByteReader;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    /// Start Of Frame markers
    ///
    /// - SOF(0):  Baseline DCT (Huffman coding)
    /// - SOF(1):  Extended sequential DCT (Huffman coding)
    /// - SOF(2):  Progressive DCT (Huffman coding)
    /// - SOF(3):  Lossless (sequential) (Huffman coding)
    /// - SOF(5):  Differential sequential DCT (Huffman coding)
    /// - SOF(6):  Differential progressive DCT (Huffman coding)
    /// - SOF(7):  Differential lossless (Huffman coding)
    /// - SOF(9):  Extended sequential DCT (arithmetic coding)
    /// - SOF(10): Progressive DCT (arithmetic coding)
    /// - SOF(11): Lossless (sequential) (arithmetic coding)
    /// - SOF(13): Differential sequential DCT (arithmetic coding)
    /// - SOF(14): Differential progressive DCT (arithmetic coding)
    /// - SOF(15): Differential lossless (arithmetic coding)
    SOF(u8),
    /// Define Huffman table(s)
    DHT,
    /// Define arithmetic coding conditioning(s)
    DAC,
    /// Restart with modulo 8 count `m`
    RST(u8),
    /// Start of image
    SOI,
    /// End of image
    EOI,
    /// Start of scan
    SOS,
    /// Define quantization table(s)
    DQT,
    /// Define number of lines
    DNL,
    /// Define restart interval
    DRI,
    /// Define hierarchical progression
    DHP,
    /// Expand reference component(s)
    EXP,
    /// Reserved for application segments
    APP(u8),
    /// Comment
    COM
}

impl Marker {
    pub fn from_u8(n: u8) -> Option<Marker> {
        use self::Marker::{APP, COM, DAC, DHP, DHT, DNL, DQT, DRI, EOI, EXP, RST, SOF, SOI, SOS};

        match n {
            0xFE => Some(COM),
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => Some(SOF(n - 0xC0)),
            0xC4 => Some(DHT),
            0xCC => Some(DAC),
            0xD0..=0xD7 => Some(RST(n - 0xD0)),
            0xD8 => Some(SOI),
            0xD9 => Some(EOI),
            0xDA => Some(SOS),
            0xDB => Some(DQT),
            0xDC => Some(DNL),
            0xDD => Some(DRI),
            0xDE => Some(DHP),
            0xDF => Some(EXP),
            0xE0..=0xEF => Some(APP(n - 0xE0)),
            _ => None
        }
    }
}

/// Scan forward for the next marker
///
/// Returns the marker code (the byte after `0xFF`) and the number of
/// bytes that had to be skipped before it. Stuffed `0xFF00` pairs and
/// `0xFF` fill bytes are not markers. Both marker bytes are consumed.
///
/// Returns `None` for the code if the stream ended first.
pub(crate) fn find_marker(reader: &mut ByteReader) -> (Option<u8>, usize) {
    let mut discarded = 0;

    while !reader.eof() {
        if reader.get_u8() != 0xFF {
            discarded += 1;
            continue;
        }
        // 0xFF 0xFF is a fill sequence
        let mut code = reader.get_u8();

        while code == 0xFF {
            code = reader.get_u8();
        }
        match code {
            // stuffed byte, or the stream ended after 0xFF
            0 => discarded += 2,
            code => return (Some(code), discarded)
        }
    }
    (None, discarded)
}

#[cfg(test)]
mod tests {
    use tessera_core::bytestream::ByteReader;

    use super::{find_marker, Marker};

    #[test]
    fn find_marker_skips_garbage() {
        let mut reader = ByteReader::new(&[0x12, 0xFF, 0x00, 0x34, 0xFF, 0xFF, 0xD9, 0x01]);
        assert_eq!(find_marker(&mut reader), (Some(0xD9), 4));
        assert_eq!(reader.position(), 7);

        let mut reader = ByteReader::new(&[0x01, 0x02, 0xFF]);
        assert_eq!(find_marker(&mut reader).0, None);
    }

    #[test]
    fn marker_codes() {
        assert_eq!(Marker::from_u8(0xD8), Some(Marker::SOI));
        assert_eq!(Marker::from_u8(0xD3), Some(Marker::RST(3)));
        assert_eq!(Marker::from_u8(0xC2), Some(Marker::SOF(2)));
        assert_eq!(Marker::from_u8(0xEE), Some(Marker::APP(14)));
        // JPG extensions and the reserved range are not markers we know
        assert_eq!(Marker::from_u8(0xC8), None);
        assert_eq!(Marker::from_u8(0x00), None);
        assert_eq!(Marker::from_u8(0x01), None);
    }
}
