/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! This file contains a single struct `HuffmanTable` that
//! stores Huffman tables needed during `BitStream` decoding.
#![allow(clippy::similar_names, clippy::module_name_repetitions)]

use crate::errors::DecodeErrors;

/// Determines how many bits of lookahead we have for our bitstream decoder.
pub const HUFF_LOOKAHEAD: u8 = 9;

/// A lookup entry for codes longer than the lookahead window
const SLOW_PATH: i32 = (HUFF_LOOKAHEAD as i32 + 1) << HUFF_LOOKAHEAD;

/// A struct which contains necessary tables for decoding a JPEG
/// huffman encoded bitstream
#[derive(Clone)]
pub struct HuffmanTable {
    // element `[0]` of each array is unused
    /// largest code of length k
    pub(crate) maxcode:   [i32; 18],
    /// offset for codes of length k
    /// Answers the question, where do code-lengths of length k end
    /// Element 0 is unused
    pub(crate) offset:    [i32; 18],
    /// lookup table for fast decoding
    ///
    /// top  bits above HUFF_LOOKAHEAD contain the code length.
    ///
    /// Lower (8) bits contain the symbol in order of increasing code length.
    pub(crate) lookup:    [i32; 1 << HUFF_LOOKAHEAD],
    /// A table which can be used to decode small AC coefficients and
    /// do an equivalent of receive_extend
    ///
    /// Layout is `(value << 8) | (run << 4) | bits_consumed`, zero if
    /// the code cannot be resolved in the lookahead window.
    pub(crate) ac_lookup: Option<[i16; 1 << HUFF_LOOKAHEAD]>,
    /// Directly represent contents of a JPEG DHT marker
    ///
    /// \# number of symbols with codes of length `k` bits
    pub(crate) bits:      [u8; 17],
    /// Symbols in order of increasing code length
    pub(crate) values:    [u8; 256]
}

impl HuffmanTable {
    /// Build a table from a DHT code length histogram and its symbols
    ///
    /// `codes[0]` is unused, `codes[k]` is the number of codes of
    /// length `k`.
    ///
    /// # Errors
    /// If the histogram describes more codes than the symbols provided,
    /// more than 256 codes, or codes that do not fit in their length
    pub fn new(
        codes: &[u8; 17], values: [u8; 256], is_dc: bool, is_progressive: bool
    ) -> Result<HuffmanTable, DecodeErrors> {
        let too_long_code = (i32::from(HUFF_LOOKAHEAD) + 1) << HUFF_LOOKAHEAD;

        let mut p = HuffmanTable {
            maxcode: [0; 18],
            offset: [0; 18],
            lookup: [too_long_code; 1 << HUFF_LOOKAHEAD],
            bits: *codes,
            values,
            ac_lookup: None
        };

        p.make_derived_table(is_dc, is_progressive)?;

        Ok(p)
    }

    /// Compute derived values for a Huffman table
    ///
    /// This routine performs some validation checks on the table
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss,
        clippy::needless_range_loop
    )]
    fn make_derived_table(&mut self, is_dc: bool, is_progressive: bool) -> Result<(), DecodeErrors> {
        let (huff_size, huff_code, num_symbols) = canonical_codes(&self.bits)?;

        // Figure F.15 generate decoding tables for bit-sequential decoding
        let mut p = 0;

        for l in 1..=16 {
            if self.bits[l] != 0 {
                // offset[l]=codes[index of 1st symbol of code length l
                // minus minimum code of length l]
                self.offset[l] = (p as i32) - (huff_code[p] as i32);
                p += usize::from(self.bits[l]);
                // maximum code of length l
                self.maxcode[l] = huff_code[p - 1] as i32;
            } else {
                // -1 if no codes of this length
                self.maxcode[l] = -1;
            }
        }
        // sentinel, ensures the slow path always terminates
        self.maxcode[17] = 0x000F_FFFF;

        // Compute lookahead tables to speed up decoding.
        // First we set all the table entries to SLOW_PATH, indicating "too long";
        // then we iterate through the Huffman codes that are short enough and
        // fill in all the entries that correspond to bit sequences starting
        // with that code.
        for k in 0..num_symbols {
            let size = huff_size[k];

            if size <= HUFF_LOOKAHEAD {
                let bits_remaining = HUFF_LOOKAHEAD - size;
                let start = (huff_code[k] << bits_remaining) as usize;
                let entry = (i32::from(size) << HUFF_LOOKAHEAD) | i32::from(self.values[k]);

                self.lookup[start..start + (1 << bits_remaining)].fill(entry);
            }
        }

        // build an ac table that does an equivalent of decode and receive_extend
        if !is_dc && !is_progressive {
            let mut fast = [0; 1 << HUFF_LOOKAHEAD];

            // Iterate over number of symbols
            for i in 0..(1 << HUFF_LOOKAHEAD) {
                let entry = self.lookup[i];

                if entry == SLOW_PATH {
                    continue;
                }
                let code_length = (entry >> HUFF_LOOKAHEAD) as u8;
                let rs = (entry & 0xFF) as u8;
                let run = rs >> 4;
                let magnitude = rs & 15;
                let total = code_length + magnitude;

                if magnitude != 0 && total <= HUFF_LOOKAHEAD {
                    // magnitude code followed by receive_extend code
                    let bits = (i >> (HUFF_LOOKAHEAD - total)) & ((1 << magnitude) - 1);
                    let value = extend(bits as i32, magnitude);

                    // if value fits in the 8 bits we have for it
                    if (-128..=127).contains(&value) {
                        fast[i] = ((value << 8) + (i32::from(run) << 4) + i32::from(total)) as i16;
                    }
                }
            }
            self.ac_lookup = Some(fast);
        }

        Ok(())
    }

    /// Resolve the code at the top of `bits`
    ///
    /// `bits` holds the next 16 bits of the stream, most significant bit first.
    /// Returns the symbol and the length of its code, or `None` if no code
    /// of this table is a prefix of `bits`
    #[inline(always)]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn lookup(&self, bits: u32) -> Option<(u8, u8)> {
        let entry = self.lookup[(bits >> (16 - HUFF_LOOKAHEAD)) as usize & ((1 << HUFF_LOOKAHEAD) - 1)];

        if entry != SLOW_PATH {
            return Some(((entry & 0xFF) as u8, (entry >> HUFF_LOOKAHEAD) as u8));
        }
        self.lookup_slow(bits)
    }

    #[cold]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn lookup_slow(&self, bits: u32) -> Option<(u8, u8)> {
        for length in (HUFF_LOOKAHEAD + 1)..=16 {
            let code = (bits >> (16 - length)) as i32;

            if code <= self.maxcode[usize::from(length)] {
                let index = (code + self.offset[usize::from(length)]) as usize;

                return Some((self.values[index & 0xFF], length));
            }
        }
        None
    }
}

/// Generate the canonical code lengths and codes of a table
///
/// Section C.2 figures C.1 and C.2 of the standard.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn canonical_codes(
    bits: &[u8; 17]
) -> Result<([u8; 257], [u32; 257], usize), DecodeErrors> {
    let mut huff_size = [0_u8; 257];
    let mut huff_code = [0_u32; 257];
    let mut p = 0;

    for (length, count) in bits.iter().enumerate().skip(1) {
        let count = usize::from(*count);

        if p + count > 256 {
            return Err(DecodeErrors::HuffmanDecode(
                "Encountered Huffman table with excessive length in DHT".to_string()
            ));
        }
        huff_size[p..p + count].fill(length as u8);
        p += count;
    }

    let num_symbols = p;

    let mut code = 0;
    let mut si = u32::from(huff_size[0]);

    p = 0;

    while huff_size[p] != 0 {
        while u32::from(huff_size[p]) == si {
            huff_code[p] = code;
            code += 1;
            p += 1;
        }
        // code is now 1 more than the last code used for code-length si; but
        // it must still fit in si bits, since no code is allowed to be all ones.
        if code >= (1 << si) {
            return Err(DecodeErrors::HuffmanDecode(format!(
                "Bad Huffman Table, {code} codes cannot be represented in {si} bits"
            )));
        }

        code <<= 1;
        si += 1;
    }

    Ok((huff_size, huff_code, num_symbols))
}

/// Sign extend `v`, a `t` bit two's complement magnitude category value
#[inline(always)]
pub(crate) fn extend(v: i32, t: u8) -> i32 {
    if t == 0 {
        return 0;
    }
    if v < (1 << (t - 1)) {
        v - (1 << t) + 1
    } else {
        v
    }
}
