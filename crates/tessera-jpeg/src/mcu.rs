/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Entropy decoding of a single scan
//!
//! Coefficients are decoded into each component's block grid and are
//! only turned into samples once every scan has been read.

use tessera_core::log::trace;

use crate::bitstream::BitStream;
use crate::errors::{DecodeErrors, DecodeWarning};
use crate::huffman::HuffmanTable;
use crate::mcu_prog::ScanKind;
use crate::restart::RestartState;
use crate::JpegDecoder;

/// Look up a Huffman table referenced by a scan
#[inline(always)]
pub(crate) fn huffman_table<'t>(
    tables: &'t [Option<HuffmanTable>; 4], index: usize, what: &'static str
) -> Result<&'t HuffmanTable, DecodeErrors> {
    tables
        .get(index)
        .and_then(Option::as_ref)
        .ok_or_else(|| DecodeErrors::HuffmanDecode(format!("No {what} table at index {index}")))
}

impl<'a> JpegDecoder<'a> {
    /// Check for existence of the tables the current scan uses and
    /// prepare the scan's components
    pub(crate) fn check_tables(&mut self, kind: ScanKind) -> Result<(), DecodeErrors> {
        for &k in &self.z_order[..usize::from(self.num_scans)] {
            let component = &mut self.components[k];

            if kind.needs_dc_table() {
                huffman_table(&self.dc_huffman_tables, component.dc_huff_table, "DC")?;
            }
            if kind.needs_ac_table() {
                huffman_table(&self.ac_huffman_tables, component.ac_huff_table, "AC")?;
            }
            if !component.quantization_latched {
                let table = self
                    .qt_tables
                    .get(usize::from(component.quantization_table_number))
                    .copied()
                    .flatten()
                    .ok_or_else(|| {
                        DecodeErrors::DqtError(format!(
                            "No quantization table {} for component {}",
                            component.quantization_table_number, component.id
                        ))
                    })?;

                component.quantization_table = table;
                component.quantization_latched = true;
            }
            component.allocate();
        }
        Ok(())
    }

    /// Decode the entropy coded data following a start of scan header
    ///
    /// On return the reader sits on the marker that ended the data, or at
    /// the end of the stream.
    pub(crate) fn decode_scan(&mut self) -> Result<(), DecodeErrors> {
        let kind = ScanKind::new(self.is_progressive, self.spec_start, self.succ_high);

        self.check_tables(kind)?;

        let mut stream = if self.is_progressive {
            BitStream::new_progressive(self.succ_low, self.spec_start, self.spec_end)
        } else {
            BitStream::new()
        };
        let mut state = RestartState::new(self.restart_interval);

        self.components.iter_mut().for_each(|x| x.dc_pred = 0);

        trace!("Decoding {kind:?} scan of {} component(s)", self.num_scans);

        if self.is_interleaved {
            for mcu_row in 0..self.mcu_y {
                for mcu_col in 0..self.mcu_x {
                    if !self.begin_mcu(&mut stream, &mut state)? {
                        continue;
                    }
                    for i in 0..usize::from(self.num_scans) {
                        let k = self.z_order[i];
                        let h = self.components[k].horizontal_sample;
                        let v = self.components[k].vertical_sample;

                        for v_samp in 0..v {
                            for h_samp in 0..h {
                                let row = mcu_row * v + v_samp;
                                let col = mcu_col * h + h_samp;

                                self.decode_block(&mut stream, kind, k, row, col)?;
                            }
                        }
                    }
                }
            }
        } else {
            // a non interleaved scan only covers blocks holding image data
            let k = self.z_order[0];
            let rows = self.components[k].blocks_per_column;
            let cols = self.components[k].blocks_per_line;

            for row in 0..rows {
                for col in 0..cols {
                    if !self.begin_mcu(&mut stream, &mut state)? {
                        continue;
                    }
                    self.decode_block(&mut stream, kind, k, row, col)?;
                }
            }
        }
        // unread bits belong to this scan, a pending marker stays
        // in the stream for the header parser
        stream.reset();

        Ok(())
    }

    /// Get ready to decode one MCU
    ///
    /// Returns false if the MCU has no data and should stay zero.
    #[inline]
    fn begin_mcu(
        &mut self, stream: &mut BitStream, state: &mut RestartState
    ) -> Result<bool, DecodeErrors> {
        if state.restart_due() {
            self.handle_rst(stream, state)?;
        }
        if stream.eob_run == 0 && stream.is_exhausted(&mut self.stream) {
            self.report_missing_data(stream, state)?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Record why an MCU could not be decoded, once per restart interval
    #[cold]
    fn report_missing_data(
        &mut self, stream: &BitStream, state: &mut RestartState
    ) -> Result<(), DecodeErrors> {
        if state.truncation_reported {
            return Ok(());
        }
        state.truncation_reported = true;

        let warning = match stream.marker {
            // intervals skipped by a restart resync are expected to be empty
            Some(0xD0..=0xD7) if state.dummy_segment => return Ok(()),
            Some(0xD0..=0xD7 | 0xD9) | None => DecodeWarning::TruncatedSegment,
            Some(marker) => DecodeWarning::UnexpectedMarker(marker)
        };
        self.push_warning(warning)
    }

    /// Decode one block of component `k` at `row`, `col` of its block grid
    #[inline(always)]
    fn decode_block(
        &mut self, stream: &mut BitStream, kind: ScanKind, k: usize, row: usize, col: usize
    ) -> Result<(), DecodeErrors> {
        let component = &mut self.components[k];
        let (dc_index, ac_index) = (component.dc_huff_table, component.ac_huff_table);

        let Some((block, prediction)) = component.block_and_prediction(row, col) else {
            return Ok(());
        };
        let reader = &mut self.stream;

        match kind {
            ScanKind::Sequential => {
                let dc_table = huffman_table(&self.dc_huffman_tables, dc_index, "DC")?;
                let ac_table = huffman_table(&self.ac_huffman_tables, ac_index, "AC")?;

                stream.decode_mcu_block(reader, dc_table, ac_table, block, prediction)
            }
            _ => {
                let dc_table = self.dc_huffman_tables.get(dc_index).and_then(Option::as_ref);
                let ac_table = self.ac_huffman_tables.get(ac_index).and_then(Option::as_ref);

                kind.decode_block(stream, reader, dc_table, ac_table, block, prediction)
            }
        }
    }
}
