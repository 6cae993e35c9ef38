/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! This module exports a single struct to store information about
//! JPEG image components
//!
//! The data is extracted from a SOF header, the block grid is
//! computed once every component of the frame is known.

use tessera_core::log::trace;

use crate::decoder::MAX_COMPONENTS;
use crate::errors::DecodeErrors;

/// Component Data from start of frame
#[derive(Clone)]
pub(crate) struct Components {
    /// The identifier of this component, used by SOS to select it
    pub id: u8,
    /// Horizontal sampling factor
    pub horizontal_sample: usize,
    /// Vertical sampling factor
    pub vertical_sample: usize,
    /// Quantization table number
    pub quantization_table_number: u8,
    /// Quantization table in natural order, copied from the decoder
    /// the first time a scan uses this component
    pub quantization_table: [i32; 64],
    /// Whether `quantization_table` has been filled
    pub quantization_latched: bool,
    /// dc huffman table position
    pub dc_huff_table: usize,
    /// ac huffman table position for this element.
    pub ac_huff_table: usize,
    /// Current dc prediction for this component
    pub dc_pred: i32,
    /// Blocks covering the component's samples horizontally
    pub blocks_per_line: usize,
    /// Blocks covering the component's samples vertically
    pub blocks_per_column: usize,
    /// Blocks per row of storage, a whole number of MCUs wide
    pub stride_blocks: usize,
    /// Rows of blocks in storage, a whole number of MCUs high
    pub rows_blocks: usize,
    /// Coefficients of every block in natural order, row major by block.
    ///
    /// Allocated when the first scan touches this component.
    pub coefficients: Vec<i16>
}

impl Components {
    /// Create a new instance from three bytes from the start of frame
    #[inline]
    pub fn from(a: [u8; 3], pos: u8) -> Result<Components, DecodeErrors> {
        let id = a[0];

        let horizontal_sample = usize::from(a[1] >> 4);
        let vertical_sample = usize::from(a[1] & 0x0f);

        if !(1..=4).contains(&horizontal_sample) || !(1..=4).contains(&vertical_sample) {
            return Err(DecodeErrors::SofError(format!(
                "Sampling factors {horizontal_sample}x{vertical_sample} of component {pos} are outside 1..=4"
            )));
        }

        let quantization_table_number = a[2];

        if usize::from(quantization_table_number) >= MAX_COMPONENTS {
            return Err(DecodeErrors::SofError(format!(
                "Too large quantization number :{quantization_table_number}, expected value between 0 and {MAX_COMPONENTS}"
            )));
        }

        trace!(
            "Component ID:{id} \tHS:{horizontal_sample} VS:{vertical_sample} QT:{quantization_table_number}"
        );

        Ok(Components {
            id,
            horizontal_sample,
            vertical_sample,
            quantization_table_number,
            quantization_table: [0; 64],
            quantization_latched: false,
            dc_huff_table: 0,
            ac_huff_table: 0,
            dc_pred: 0,
            blocks_per_line: 0,
            blocks_per_column: 0,
            stride_blocks: 0,
            rows_blocks: 0,
            coefficients: vec![]
        })
    }

    /// Compute the block grid for this component
    pub fn setup_blocks(
        &mut self, width: usize, height: usize, h_max: usize, v_max: usize, mcu_x: usize,
        mcu_y: usize
    ) {
        let sample_width = (width * self.horizontal_sample).div_ceil(h_max);
        let sample_height = (height * self.vertical_sample).div_ceil(v_max);

        self.blocks_per_line = sample_width.div_ceil(8);
        self.blocks_per_column = sample_height.div_ceil(8);
        self.stride_blocks = mcu_x * self.horizontal_sample;
        self.rows_blocks = mcu_y * self.vertical_sample;
    }

    /// Allocate storage for the coefficients, no-op if already allocated
    pub fn allocate(&mut self) {
        if self.coefficients.is_empty() {
            self.coefficients = vec![0; self.stride_blocks * self.rows_blocks * 64];
        }
    }

    /// Width of the decoded sample plane, in samples
    pub const fn plane_width(&self) -> usize {
        self.stride_blocks * 8
    }

    /// Height of the decoded sample plane, in samples
    pub const fn plane_height(&self) -> usize {
        self.rows_blocks * 8
    }

    /// Get the block at `row`, `col` of the block grid together with
    /// the running DC prediction
    #[inline(always)]
    pub fn block_and_prediction(
        &mut self, row: usize, col: usize
    ) -> Option<(&mut [i16; 64], &mut i32)> {
        let start = (row * self.stride_blocks + col) * 64;

        let block = self
            .coefficients
            .get_mut(start..start + 64)
            .and_then(|block| block.try_into().ok())?;

        Some((block, &mut self.dc_pred))
    }

    pub fn metadata(&self) -> ComponentMetadata {
        ComponentMetadata {
            id:                   self.id,
            horizontal_sample:    self.horizontal_sample,
            vertical_sample:      self.vertical_sample,
            quantization_table:   self.quantization_table_number,
            blocks_per_line:      self.blocks_per_line,
            blocks_per_column:    self.blocks_per_column
        }
    }
}

/// Public description of a frame component
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ComponentMetadata {
    /// Component identifier
    pub id:                 u8,
    /// Horizontal sampling factor
    pub horizontal_sample:  usize,
    /// Vertical sampling factor
    pub vertical_sample:    usize,
    /// Index of the quantization table used by this component
    pub quantization_table: u8,
    /// Number of 8x8 blocks covering one row of the component
    pub blocks_per_line:    usize,
    /// Number of 8x8 blocks covering one column of the component
    pub blocks_per_column:  usize
}

#[cfg(test)]
mod tests {
    use super::Components;

    #[test]
    fn parse_component() {
        let comp = Components::from([1, 0x21, 0], 0).unwrap();
        assert_eq!(comp.horizontal_sample, 2);
        assert_eq!(comp.vertical_sample, 1);

        assert!(Components::from([1, 0x51, 0], 0).is_err());
        assert!(Components::from([1, 0x10, 0], 0).is_err());
        assert!(Components::from([1, 0x11, 4], 0).is_err());
    }

    #[test]
    fn block_grid_for_subsampled_chroma() {
        // 17x9 image, 2x2 luma with 1x1 chroma
        let mut luma = Components::from([1, 0x22, 0], 0).unwrap();
        let mut chroma = Components::from([2, 0x11, 1], 1).unwrap();

        let (mcu_x, mcu_y) = (17_usize.div_ceil(16), 9_usize.div_ceil(16));

        luma.setup_blocks(17, 9, 2, 2, mcu_x, mcu_y);
        chroma.setup_blocks(17, 9, 2, 2, mcu_x, mcu_y);

        assert_eq!((luma.blocks_per_line, luma.blocks_per_column), (3, 2));
        assert_eq!((chroma.blocks_per_line, chroma.blocks_per_column), (2, 1));
        assert_eq!((luma.stride_blocks, luma.rows_blocks), (4, 2));
        assert_eq!((chroma.stride_blocks, chroma.rows_blocks), (2, 1));

        luma.allocate();
        assert_eq!(luma.coefficients.len(), 4 * 2 * 64);
        assert!(luma.block_and_prediction(1, 3).is_some());
        assert!(luma.block_and_prediction(2, 0).is_none());
    }
}
