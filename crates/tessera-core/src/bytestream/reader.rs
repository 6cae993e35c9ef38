/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use core::fmt::{Debug, Display, Formatter};

/// Errors that can occur when reading from a [`ByteReader`]
#[derive(Clone, PartialEq, Eq)]
pub enum ByteIoError {
    /// Not enough bytes to satisfy a read, (requested, remaining)
    NotEnoughBytes(usize, usize),
    /// Attempted to move before the start of the stream
    SeekError(&'static str),
    Generic(&'static str)
}

impl Debug for ByteIoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            ByteIoError::NotEnoughBytes(expected, found) => {
                write!(f, "Not enough bytes, expected {expected} but found {found}")
            }
            ByteIoError::SeekError(err) => {
                write!(f, "Seek error: {err}")
            }
            ByteIoError::Generic(err) => {
                write!(f, "Generic I/O error: {err}")
            }
        }
    }
}

impl Display for ByteIoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl std::error::Error for ByteIoError {}

impl From<&'static str> for ByteIoError {
    fn from(value: &'static str) -> Self {
        ByteIoError::Generic(value)
    }
}

/// Generate `get_*` functions for fixed size integer types
///
/// Each type gets two variants, one that returns zero when the
/// stream is exhausted and one that returns an error.
macro_rules! get_single_type {
    ($name:tt,$name2:tt,$int_type:tt,$from:tt) => {
        #[inline(always)]
        #[doc = concat!("Read a `", stringify!($int_type), "` from the stream, returning an error when there are not enough bytes")]
        pub fn $name2(&mut self) -> Result<$int_type, ByteIoError> {
            const SIZE_OF_VAL: usize = core::mem::size_of::<$int_type>();

            match self.stream.get(self.position..self.position + SIZE_OF_VAL) {
                Some(bytes) => {
                    self.position += SIZE_OF_VAL;
                    let mut space = [0; SIZE_OF_VAL];
                    space.copy_from_slice(bytes);
                    Ok($int_type::$from(space))
                }
                None => Err(ByteIoError::NotEnoughBytes(SIZE_OF_VAL, self.remaining()))
            }
        }

        #[inline(always)]
        #[doc = concat!("Read a `", stringify!($int_type), "` from the stream, returning zero when there are not enough bytes")]
        pub fn $name(&mut self) -> $int_type {
            self.$name2().unwrap_or(0)
        }
    };
}

/// An in-memory reader over a byte slice
///
/// Reads past the end either return zero (the `get_*` family)
/// or an error (the `get_*_err` family); the position never
/// moves past the end of the slice.
#[derive(Clone)]
pub struct ByteReader<'a> {
    stream:   &'a [u8],
    position: usize
}

impl<'a> ByteReader<'a> {
    /// Create a new reader starting at the first byte of `stream`
    pub const fn new(stream: &'a [u8]) -> ByteReader<'a> {
        ByteReader {
            stream,
            position: 0
        }
    }

    /// Skip `num` bytes, saturating at the end of the stream
    #[inline(always)]
    pub fn skip(&mut self, num: usize) {
        self.position = self.position.saturating_add(num).min(self.stream.len());
    }

    /// Move back `num` bytes
    #[inline(always)]
    pub fn rewind(&mut self, num: usize) -> Result<(), ByteIoError> {
        match self.position.checked_sub(num) {
            Some(pos) => {
                self.position = pos;
                Ok(())
            }
            None => Err(ByteIoError::SeekError("Cannot rewind before the start of the stream"))
        }
    }

    /// Return true if there are no more bytes to read
    #[inline(always)]
    pub const fn eof(&self) -> bool {
        self.position >= self.stream.len()
    }

    /// Current offset from the start of the stream
    #[inline(always)]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Move to an absolute offset, clamped to the end of the stream
    #[inline(always)]
    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.stream.len());
    }

    /// Number of bytes left
    #[inline(always)]
    pub const fn remaining(&self) -> usize {
        self.stream.len().saturating_sub(self.position)
    }

    /// Whether `num` more bytes can be read
    #[inline(always)]
    pub const fn has(&self, num: usize) -> bool {
        self.remaining() >= num
    }

    /// The unread part of the stream
    #[inline(always)]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.stream[self.position..]
    }

    /// Look at `num_bytes` bytes starting `position` bytes ahead
    /// of the current offset, without consuming them
    pub fn peek_at(&self, position: usize, num_bytes: usize) -> Result<&'a [u8], ByteIoError> {
        let start = self.position.saturating_add(position);
        let end = start.saturating_add(num_bytes);

        self.stream
            .get(start..end)
            .ok_or(ByteIoError::NotEnoughBytes(num_bytes, self.remaining()))
    }

    /// Read exactly `num_bytes`, returning a slice borrowed from the stream
    pub fn read_exact_bytes(&mut self, num_bytes: usize) -> Result<&'a [u8], ByteIoError> {
        let bytes = self.peek_at(0, num_bytes)?;
        self.position += num_bytes;
        Ok(bytes)
    }

    /// Read a single byte, or zero when the stream is exhausted
    #[inline(always)]
    pub fn get_u8(&mut self) -> u8 {
        self.get_u8_err().unwrap_or(0)
    }

    /// Read a single byte, or an error when the stream is exhausted
    #[inline(always)]
    pub fn get_u8_err(&mut self) -> Result<u8, ByteIoError> {
        match self.stream.get(self.position) {
            Some(byte) => {
                self.position += 1;
                Ok(*byte)
            }
            None => Err(ByteIoError::NotEnoughBytes(1, 0))
        }
    }

    get_single_type!(get_u16_be, get_u16_be_err, u16, from_be_bytes);
    get_single_type!(get_u16_le, get_u16_le_err, u16, from_le_bytes);
    get_single_type!(get_u32_be, get_u32_be_err, u32, from_be_bytes);
    get_single_type!(get_u32_le, get_u32_le_err, u32, from_le_bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_big_endian() {
        let mut reader = ByteReader::new(&[0xFF, 0xD8, 0x00, 0x10]);
        assert_eq!(reader.get_u16_be(), 0xFFD8);
        assert_eq!(reader.get_u16_be_err().unwrap(), 0x0010);
        assert!(reader.eof());
    }

    #[test]
    fn exhausted_reads() {
        let mut reader = ByteReader::new(&[0x01]);
        assert_eq!(reader.get_u16_be(), 0);
        // failed reads do not move the cursor
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.get_u8(), 1);
        assert_eq!(reader.get_u8(), 0);
        assert_eq!(reader.get_u8_err(), Err(ByteIoError::NotEnoughBytes(1, 0)));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut reader = ByteReader::new(b"JFIF\0rest");
        assert_eq!(reader.peek_at(0, 5).unwrap(), b"JFIF\0");
        assert_eq!(reader.peek_at(5, 4).unwrap(), b"rest");
        assert!(reader.peek_at(5, 5).is_err());
        assert_eq!(reader.read_exact_bytes(4).unwrap(), b"JFIF");
        assert_eq!(reader.remaining(), 5);
    }

    #[test]
    fn skip_and_rewind() {
        let mut reader = ByteReader::new(&[1, 2, 3, 4]);
        reader.skip(10);
        assert!(reader.eof());
        reader.rewind(2).unwrap();
        assert_eq!(reader.get_u8(), 3);
        assert!(reader.rewind(10).is_err());
    }
}
