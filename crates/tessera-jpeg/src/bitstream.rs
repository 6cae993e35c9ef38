/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! This file exposes a single struct that can decode a huffman encoded
//! Bitstream in a JPEG file
//!
//! The buffer is kept MSB aligned, the next bit of the stream is always
//! bit 63. Bytes are pulled in one at a time so that stuffed bytes and
//! markers can be handled as they appear.
//!
//! Once a marker is seen or the input runs out, the buffer is topped up
//! with zero bits instead. Those bits are counted so callers can tell
//! real data from padding.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]

use tessera_core::bytestream::ByteReader;

use crate::errors::DecodeErrors;
use crate::huffman::{extend, HuffmanTable, HUFF_LOOKAHEAD};
use crate::misc::UN_ZIGZAG;

/// Result of topping up the bit buffer
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum BitStatus {
    /// The buffer only holds data from the stream
    Ok,
    /// The input ended before a marker, the buffer was padded with zeros
    NeedMoreInput,
    /// A marker stopped the refill, the buffer was padded with zeros
    HitMarker
}

/// A `BitStream` struct, a bit by bit reader with super powers
pub(crate) struct BitStream {
    /// Bits waiting to be consumed, MSB first
    buffer:        u64,
    /// Number of valid bits in `buffer`, including padding
    bits_left:     u8,
    /// Number of zero bits added after the data ended
    padding:       u8,
    /// A marker found during refill and not yet handled.
    ///
    /// When set, the reader is positioned at the `0xFF` preceding the code.
    pub marker:    Option<u8>,
    /// Blocks left in the current end of band run (progressive only)
    pub eob_run:   u32,
    // Progressive decoding
    pub spec_start: u8,
    pub spec_end:   u8,
    pub succ_low:   u8
}

impl BitStream {
    /// Create a new BitStream
    pub(crate) const fn new() -> BitStream {
        BitStream {
            buffer:     0,
            bits_left:  0,
            padding:    0,
            marker:     None,
            eob_run:    0,
            spec_start: 0,
            spec_end:   0,
            succ_low:   0
        }
    }

    /// Create a new Bitstream for progressive decoding
    pub(crate) const fn new_progressive(al: u8, spec_start: u8, spec_end: u8) -> BitStream {
        BitStream {
            buffer: 0,
            bits_left: 0,
            padding: 0,
            marker: None,
            eob_run: 0,
            spec_start,
            spec_end,
            succ_low: al
        }
    }

    /// Top up the bit buffer so that it holds more than 56 bits
    ///
    /// Stuffed `0xFF00` pairs yield a single `0xFF` data byte and `0xFF`
    /// fill bytes are dropped. Any other byte after `0xFF` is a marker,
    /// it is recorded in [`marker`](Self::marker) and left in the stream.
    pub(crate) fn refill(&mut self, reader: &mut ByteReader) -> BitStatus {
        // padding already consumed no longer counts
        self.padding = self.padding.min(self.bits_left);

        while self.bits_left <= 56 {
            if self.marker.is_some() || reader.eof() {
                let pad = 64 - self.bits_left;

                self.padding += pad;
                self.bits_left = 64;
                break;
            }
            let byte = reader.get_u8();

            if byte != 0xFF {
                self.push_byte(byte);
                continue;
            }
            loop {
                match reader.peek_at(0, 1).map(|x| x[0]) {
                    Ok(0x00) => {
                        reader.skip(1);
                        self.push_byte(0xFF);
                        break;
                    }
                    Ok(0xFF) => reader.skip(1),
                    Ok(code) => {
                        // leave the reader at the 0xFF so the marker can be read again
                        self.marker = Some(code);
                        reader.set_position(reader.position().saturating_sub(1));
                        break;
                    }
                    // a lone 0xFF at the end of the stream carries no data
                    Err(_) => break
                }
            }
        }
        self.status()
    }

    #[inline(always)]
    fn push_byte(&mut self, byte: u8) {
        self.buffer |= u64::from(byte) << (56 - self.bits_left);
        self.bits_left += 8;
    }

    fn status(&self) -> BitStatus {
        if self.padding == 0 {
            BitStatus::Ok
        } else if self.marker.is_some() {
            BitStatus::HitMarker
        } else {
            BitStatus::NeedMoreInput
        }
    }

    /// Refill only when a symbol and its magnitude bits may not fit
    #[inline(always)]
    fn ensure(&mut self, reader: &mut ByteReader) {
        if self.bits_left < 32 {
            self.refill(reader);
        }
    }

    /// Returns true when every bit left in the buffer is padding
    ///
    /// This refills first, so the answer reflects the stream.
    pub(crate) fn is_exhausted(&mut self, reader: &mut ByteReader) -> bool {
        if self.refill(reader) == BitStatus::Ok {
            return false;
        }
        self.padding >= self.bits_left
    }

    #[inline(always)]
    const fn peek_bits(&self, n: u8) -> u32 {
        (self.buffer >> (64 - n)) as u32
    }

    #[inline(always)]
    fn drop_bits(&mut self, n: u8) {
        debug_assert!(self.bits_left >= n);
        self.buffer <<= n;
        self.bits_left -= n;
    }

    /// Read `n` bits, `n` must not exceed 16
    #[inline(always)]
    fn get_bits(&mut self, n: u8) -> i32 {
        if n == 0 {
            return 0;
        }
        let value = self.peek_bits(n) as i32;
        self.drop_bits(n);
        value
    }

    #[inline(always)]
    fn get_bit(&mut self) -> bool {
        let bit = self.buffer >> 63 == 1;
        self.drop_bits(1);
        bit
    }

    /// Read `n` raw bits and sign extend them
    #[inline(always)]
    fn receive_extend(&mut self, n: u8) -> i32 {
        let bits = self.get_bits(n);
        extend(bits, n)
    }

    /// Decode one Huffman symbol
    #[inline(always)]
    fn decode_huff(&mut self, table: &HuffmanTable) -> Result<u8, DecodeErrors> {
        match table.lookup(self.peek_bits(16)) {
            Some((symbol, length)) => {
                self.drop_bits(length);
                Ok(symbol)
            }
            None if self.padding > 0 => {
                // the data ended inside this code, treat it as end of block
                // and turn whatever is left into padding
                self.buffer = 0;
                self.padding = self.bits_left;
                Ok(0)
            }
            None => Err(DecodeErrors::HuffmanDecode(
                "Bad Huffman code, corrupt JPEG".to_string()
            ))
        }
    }

    fn decode_dc(&mut self, reader: &mut ByteReader, dc_table: &HuffmanTable) -> Result<i32, DecodeErrors> {
        self.ensure(reader);

        let s = self.decode_huff(dc_table)?;

        if s > 16 {
            return Err(DecodeErrors::HuffmanDecode(format!(
                "Invalid DC magnitude category {s}"
            )));
        }
        Ok(self.receive_extend(s))
    }

    /// Decode a single baseline block
    ///
    /// Coefficients are written to `block` in natural order and are not
    /// dequantized.
    pub(crate) fn decode_mcu_block(
        &mut self, reader: &mut ByteReader, dc_table: &HuffmanTable, ac_table: &HuffmanTable,
        block: &mut [i16; 64], dc_prediction: &mut i32
    ) -> Result<(), DecodeErrors> {
        block.fill(0);

        let diff = self.decode_dc(reader, dc_table)?;

        *dc_prediction = dc_prediction.wrapping_add(diff);
        block[0] = *dc_prediction as i16;

        let mut pos = 1;

        while pos < 64 {
            self.ensure(reader);

            if let Some(fast) = &ac_table.ac_lookup {
                let entry = fast[self.peek_bits(HUFF_LOOKAHEAD) as usize];

                if entry != 0 {
                    pos += ((entry >> 4) & 15) as usize;
                    self.drop_bits((entry & 15) as u8);
                    block[UN_ZIGZAG[pos]] = entry >> 8;
                    pos += 1;
                    continue;
                }
            }
            let rs = self.decode_huff(ac_table)?;
            let run = rs >> 4;
            let magnitude = rs & 15;

            if magnitude == 0 {
                if run == 15 {
                    // ZRL, sixteen zeros
                    pos += 16;
                    continue;
                }
                // end of block
                break;
            }
            pos += usize::from(run);

            let value = self.receive_extend(magnitude);
            block[UN_ZIGZAG[pos]] = value as i16;
            pos += 1;
        }
        Ok(())
    }

    /// Decode the DC coefficient of a block in the first scan of a
    /// progressive image
    pub(crate) fn decode_prog_dc_first(
        &mut self, reader: &mut ByteReader, dc_table: &HuffmanTable, coefficient: &mut i16,
        dc_prediction: &mut i32
    ) -> Result<(), DecodeErrors> {
        let diff = self.decode_dc(reader, dc_table)?;

        *dc_prediction = dc_prediction.wrapping_add(diff);
        *coefficient = (*dc_prediction).wrapping_shl(u32::from(self.succ_low)) as i16;

        Ok(())
    }

    /// Add one bit of precision to a DC coefficient
    pub(crate) fn decode_prog_dc_refine(&mut self, reader: &mut ByteReader, coefficient: &mut i16) {
        self.ensure(reader);

        if self.get_bit() {
            *coefficient |= 1 << self.succ_low;
        }
    }

    /// Decode a band of AC coefficients for the first time
    ///
    /// The caller is expected to skip the block when an end of band
    /// run is in progress.
    pub(crate) fn decode_mcu_ac_first(
        &mut self, reader: &mut ByteReader, ac_table: &HuffmanTable, block: &mut [i16; 64]
    ) -> Result<(), DecodeErrors> {
        let shift = u32::from(self.succ_low);
        let mut k = usize::from(self.spec_start);

        while k <= usize::from(self.spec_end) {
            self.ensure(reader);

            let rs = self.decode_huff(ac_table)?;
            let run = rs >> 4;
            let magnitude = rs & 15;

            if magnitude == 0 {
                if run < 15 {
                    // EOB run of 2^r + extra bits, this block included
                    self.eob_run = (1 << run) + self.get_bits(run) as u32 - 1;
                    break;
                }
                k += 16;
                continue;
            }
            k += usize::from(run);

            let value = self.receive_extend(magnitude);

            block[UN_ZIGZAG[k]] = value.wrapping_shl(shift) as i16;
            k += 1;
        }
        Ok(())
    }

    /// Refine AC coefficients of a block, adding one bit of precision
    /// to every coefficient in the band
    pub(crate) fn decode_mcu_ac_refine(
        &mut self, reader: &mut ByteReader, ac_table: &HuffmanTable, block: &mut [i16; 64]
    ) -> Result<(), DecodeErrors> {
        let bit = 1_i16 << self.succ_low;
        let minus_bit = (-1_i16) << self.succ_low;
        let end = usize::from(self.spec_end);

        let mut k = usize::from(self.spec_start);

        if self.eob_run == 0 {
            while k <= end {
                self.ensure(reader);

                let rs = self.decode_huff(ac_table)?;
                let mut run = i32::from(rs >> 4);
                let magnitude = rs & 15;
                let mut value = 0;

                if magnitude != 0 {
                    // magnitude of refinement coefficients is always one
                    value = if self.get_bit() { bit } else { minus_bit };
                } else if run != 15 {
                    self.eob_run = 1 << run;
                    self.eob_run += self.get_bits(run as u8) as u32;
                    break;
                }

                // advance over already non-zero coefficients, refining them
                // and over `run` zero coefficients
                while k <= end {
                    let coefficient = &mut block[UN_ZIGZAG[k]];

                    if *coefficient != 0 {
                        self.ensure(reader);
                        refine(coefficient, self.get_bit(), bit, minus_bit);
                    } else {
                        run -= 1;

                        if run < 0 {
                            break;
                        }
                    }
                    k += 1;
                }

                if value != 0 {
                    block[UN_ZIGZAG[k]] = value;
                }
                k += 1;
            }
        }

        if self.eob_run > 0 {
            // inside an end of band run, only already non-zero
            // coefficients receive correction bits
            while k <= end {
                let coefficient = &mut block[UN_ZIGZAG[k]];

                if *coefficient != 0 {
                    self.ensure(reader);
                    refine(coefficient, self.get_bit(), bit, minus_bit);
                }
                k += 1;
            }
            self.eob_run -= 1;
        }
        Ok(())
    }

    /// Discard buffered bits, as done at the start of a scan or restart interval.
    ///
    /// A pending marker is kept.
    pub(crate) fn reset(&mut self) {
        self.buffer = 0;
        self.bits_left = 0;
        self.padding = 0;
        self.eob_run = 0;
    }
}

#[inline(always)]
fn refine(coefficient: &mut i16, correction: bool, bit: i16, minus_bit: i16) {
    if correction && (*coefficient & bit) == 0 {
        if *coefficient >= 0 {
            *coefficient = coefficient.wrapping_add(bit);
        } else {
            *coefficient = coefficient.wrapping_add(minus_bit);
        }
    }
}

#[cfg(test)]
mod tests {
    use tessera_core::bytestream::ByteReader;

    use super::{BitStatus, BitStream};
    use crate::huffman::HuffmanTable;

    /// A table with a single one bit code, `0`, for `symbol`
    fn single_code_table(symbol: u8, is_dc: bool) -> HuffmanTable {
        let mut bits = [0; 17];
        bits[1] = 1;
        let mut values = [0; 256];
        values[0] = symbol;
        HuffmanTable::new(&bits, values, is_dc, false).unwrap()
    }

    #[test]
    fn stuffed_bytes_are_data() {
        let data = [0xFF, 0x00, 0xAB];
        let mut reader = ByteReader::new(&data);
        let mut stream = BitStream::new();

        assert_eq!(stream.refill(&mut reader), BitStatus::NeedMoreInput);
        assert_eq!(stream.get_bits(8), 0xFF);
        assert_eq!(stream.get_bits(8), 0xAB);
        assert!(stream.marker.is_none());
        assert!(stream.is_exhausted(&mut reader));
    }

    #[test]
    fn marker_stops_refill() {
        let data = [0x12, 0xFF, 0xFF, 0xD3, 0x34];
        let mut reader = ByteReader::new(&data);
        let mut stream = BitStream::new();

        assert_eq!(stream.refill(&mut reader), BitStatus::HitMarker);
        assert_eq!(stream.marker, Some(0xD3));
        // positioned on the last 0xFF before the marker code
        assert_eq!(reader.position(), 2);
        assert_eq!(stream.get_bits(8), 0x12);
        assert!(stream.is_exhausted(&mut reader));
    }

    #[test]
    fn long_data_is_ok() {
        let data = [0x55; 16];
        let mut reader = ByteReader::new(&data);
        let mut stream = BitStream::new();

        assert_eq!(stream.refill(&mut reader), BitStatus::Ok);
        assert!(!stream.is_exhausted(&mut reader));
    }

    #[test]
    fn decode_dc_only_block() {
        // DC category 4 (code `0`), then bits 0011 = -12, then EOB (code `0`)
        // 0 0011 0 11 = 0x1B padded with ones
        let data = [0b0001_1011];
        let dc = single_code_table(4, true);
        let ac = single_code_table(0x00, false);

        let mut reader = ByteReader::new(&data);
        let mut stream = BitStream::new();
        let mut block = [7; 64];
        let mut pred = 2;

        stream.refill(&mut reader);
        stream
            .decode_mcu_block(&mut reader, &dc, &ac, &mut block, &mut pred)
            .unwrap();

        assert_eq!(pred, -10);
        assert_eq!(block[0], -10);
        assert!(block[1..].iter().all(|x| *x == 0));
    }

    #[test]
    fn refine_dc_sets_bit() {
        let data = [0b1000_0000];
        let mut reader = ByteReader::new(&data);
        let mut stream = BitStream::new_progressive(0, 0, 0);
        let mut coefficient = 4;

        stream.decode_prog_dc_refine(&mut reader, &mut coefficient);
        assert_eq!(coefficient, 5);
        stream.decode_prog_dc_refine(&mut reader, &mut coefficient);
        assert_eq!(coefficient, 5);
    }

    #[test]
    fn ac_first_eob_run() {
        // symbol 0x20 is EOBRUN with two extra bits, `11` gives a run of 4 + 3 - 1
        let data = [0b0110_0000];
        let ac = single_code_table(0x20, false);

        let mut reader = ByteReader::new(&data);
        let mut stream = BitStream::new_progressive(0, 1, 63);
        let mut block = [0; 64];

        stream.refill(&mut reader);
        stream.decode_mcu_ac_first(&mut reader, &ac, &mut block).unwrap();
        assert_eq!(stream.eob_run, 6);
    }
}
