/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Routines for progressive decoding
//!
//! A progressive image sends its coefficients over several scans, each
//! scan carries either the DC coefficients or a band of AC coefficients,
//! and either their most significant bits or one more bit of precision.
//! Scans are applied in the order they appear, coefficients keep
//! accumulating in the component block grids until the end of the image.

use tessera_core::bytestream::ByteReader;

use crate::bitstream::BitStream;
use crate::errors::DecodeErrors;
use crate::huffman::HuffmanTable;

/// The kinds of scans an image can carry
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ScanKind {
    /// Baseline or extended sequential, every coefficient at once
    Sequential,
    /// First bits of the DC coefficients
    DcFirst,
    /// One more bit of the DC coefficients
    DcRefine,
    /// First bits of a band of AC coefficients
    AcFirst,
    /// One more bit of a band of AC coefficients
    AcRefine
}

impl ScanKind {
    /// Classify a scan from its header
    pub(crate) const fn new(is_progressive: bool, spec_start: u8, succ_high: u8) -> ScanKind {
        match (is_progressive, spec_start == 0, succ_high == 0) {
            (false, _, _) => ScanKind::Sequential,
            (true, true, true) => ScanKind::DcFirst,
            (true, true, false) => ScanKind::DcRefine,
            (true, false, true) => ScanKind::AcFirst,
            (true, false, false) => ScanKind::AcRefine
        }
    }

    pub(crate) const fn needs_dc_table(self) -> bool {
        matches!(self, ScanKind::Sequential | ScanKind::DcFirst)
    }

    pub(crate) const fn needs_ac_table(self) -> bool {
        matches!(
            self,
            ScanKind::Sequential | ScanKind::AcFirst | ScanKind::AcRefine
        )
    }

    /// Decode one block of a progressive scan
    ///
    /// Tables this kind of scan needs were checked before the scan
    /// started, a missing one is still reported as an error.
    #[inline(always)]
    pub(crate) fn decode_block(
        self, stream: &mut BitStream, reader: &mut ByteReader, dc_table: Option<&HuffmanTable>,
        ac_table: Option<&HuffmanTable>, block: &mut [i16; 64], prediction: &mut i32
    ) -> Result<(), DecodeErrors> {
        let missing = || DecodeErrors::HuffmanDecode("Missing table for progressive scan".to_string());

        match self {
            ScanKind::Sequential => {
                let dc_table = dc_table.ok_or_else(missing)?;
                let ac_table = ac_table.ok_or_else(missing)?;

                stream.decode_mcu_block(reader, dc_table, ac_table, block, prediction)
            }
            ScanKind::DcFirst => {
                let dc_table = dc_table.ok_or_else(missing)?;

                stream.decode_prog_dc_first(reader, dc_table, &mut block[0], prediction)
            }
            ScanKind::DcRefine => {
                stream.decode_prog_dc_refine(reader, &mut block[0]);
                Ok(())
            }
            ScanKind::AcFirst => {
                if stream.eob_run > 0 {
                    // block is inside an end of band run, nothing to decode
                    stream.eob_run -= 1;
                    return Ok(());
                }
                let ac_table = ac_table.ok_or_else(missing)?;

                stream.decode_mcu_ac_first(reader, ac_table, block)
            }
            ScanKind::AcRefine => {
                let ac_table = ac_table.ok_or_else(missing)?;

                stream.decode_mcu_ac_refine(reader, ac_table, block)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScanKind;

    #[test]
    fn classify_scans() {
        assert_eq!(ScanKind::new(false, 0, 0), ScanKind::Sequential);
        assert_eq!(ScanKind::new(false, 1, 1), ScanKind::Sequential);
        assert_eq!(ScanKind::new(true, 0, 0), ScanKind::DcFirst);
        assert_eq!(ScanKind::new(true, 0, 1), ScanKind::DcRefine);
        assert_eq!(ScanKind::new(true, 1, 0), ScanKind::AcFirst);
        assert_eq!(ScanKind::new(true, 6, 2), ScanKind::AcRefine);
    }

    #[test]
    fn table_requirements() {
        assert!(ScanKind::Sequential.needs_dc_table() && ScanKind::Sequential.needs_ac_table());
        assert!(ScanKind::DcFirst.needs_dc_table() && !ScanKind::DcFirst.needs_ac_table());
        assert!(!ScanKind::DcRefine.needs_dc_table() && !ScanKind::DcRefine.needs_ac_table());
        assert!(!ScanKind::AcRefine.needs_dc_table() && ScanKind::AcRefine.needs_ac_table());
    }
}
