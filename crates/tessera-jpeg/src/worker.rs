/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Turning coefficients into pixels
//!
//! Runs once every scan has been decoded. Each component is
//! dequantized and transformed into a sample plane, then rows of the
//! planes are upsampled and colour converted into the output buffer.
//! Both steps split their output into bands of rows, one per thread.

use tessera_core::colorspace::ColorSpace;
use tessera_core::log::{debug, trace};

use crate::color_convert::ColorConverter;
use crate::components::Components;
use crate::decoder::{IDCTPtr, MAX_COMPONENTS};
use crate::errors::DecodeErrors;
use crate::idct::dequantize;
use crate::pool::BlockPool;
use crate::upsampler::{Plane, UpSampler};
use crate::JpegDecoder;

/// Split `data` into bands of whole rows and call `function` on each
/// band with the index of its first row
///
/// Bands are processed on up to `threads` threads.
fn for_each_row_band<T, F>(data: &mut [T], row_len: usize, threads: usize, function: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync
{
    if row_len == 0 || data.is_empty() {
        return;
    }
    let rows = data.len() / row_len;
    let threads = threads.clamp(1, rows.max(1));

    if threads == 1 {
        function(0, data);
        return;
    }
    let rows_per_band = rows.div_ceil(threads);

    std::thread::scope(|s| {
        for (i, band) in data.chunks_mut(rows_per_band * row_len).enumerate() {
            let function = &function;

            s.spawn(move || function(i * rows_per_band, band));
        }
    });
}

/// Dequantize and transform every block of a component into a plane of
/// `plane_width()` by `plane_height()` samples
pub(crate) fn idct_component(component: &Components, idct: IDCTPtr, threads: usize) -> Vec<i16> {
    let stride = component.plane_width();
    let block_row_len = stride * 8;

    let mut plane = vec![0_i16; stride * component.plane_height()];

    for_each_row_band(&mut plane, block_row_len, threads, |first_row, band| {
        let pool = BlockPool::new();

        for (i, samples) in band.chunks_exact_mut(block_row_len).enumerate() {
            let block_row = first_row + i;

            for col in 0..component.stride_blocks {
                let start = (block_row * component.stride_blocks + col) * 64;

                let Some(coefficients) = component.coefficients.get(start..start + 64) else {
                    continue;
                };
                let mut block = pool.take();

                dequantize(coefficients, &component.quantization_table, &mut block);
                idct(&mut block, &mut samples[col * 8..], stride);
            }
        }
        trace!("IDCT band used {} scratch block(s)", pool.allocated());
    });

    plane
}

/// Upsample component planes to full resolution and write pixels in
/// `colorspace`, `width` by `height`
#[allow(clippy::too_many_arguments)]
pub(crate) fn upsample_and_color_convert(
    planes: &[Plane], samplers: &[UpSampler], converter: ColorConverter, colorspace: ColorSpace,
    width: usize, height: usize, threads: usize
) -> Vec<u8> {
    let row_len = width * colorspace.num_components();
    // luma outputs of luma carrying images only need the first plane
    let used = if colorspace.is_grayscale()
        && matches!(converter, ColorConverter::Grayscale | ColorConverter::YCbCr)
    {
        1
    } else {
        planes.len().min(MAX_COMPONENTS)
    };

    let mut output = vec![0_u8; row_len * height];

    for_each_row_band(&mut output, row_len, threads, |first_row, band| {
        let mut scratch = vec![];
        let mut rows = vec![vec![0_i16; width]; used];

        for (i, pixels) in band.chunks_exact_mut(row_len).enumerate() {
            let y = first_row + i;

            for ((plane, sampler), row) in planes.iter().zip(samplers).zip(rows.iter_mut()) {
                sampler.upsample_row(plane, y, &mut scratch, row);
            }
            let mut refs: [&[i16]; MAX_COMPONENTS] = [&[]; MAX_COMPONENTS];

            for (slot, row) in refs.iter_mut().zip(rows.iter()) {
                *slot = row;
            }
            converter.convert_row(&refs[..used], colorspace, pixels);
        }
    });

    output
}

impl<'a> JpegDecoder<'a> {
    /// Produce the output image from the decoded coefficients
    pub(crate) fn post_process(
        &mut self, converter: ColorConverter, colorspace: ColorSpace
    ) -> Result<Vec<u8>, DecodeErrors> {
        let threads = self.options.jpeg_get_num_threads();
        let width = usize::from(self.info.width);
        let height = usize::from(self.info.height);

        debug!("Post processing with up to {threads} thread(s)");

        let mut samples = Vec::with_capacity(self.components.len());

        for component in &mut self.components {
            // components no scan referred to decode as flat gray
            component.allocate();
            samples.push(idct_component(component, self.idct_func, threads));
        }

        let planes: Vec<Plane> = self
            .components
            .iter()
            .zip(samples.iter())
            .map(|(component, data)| Plane {
                data,
                stride: component.plane_width(),
                width: (width * component.horizontal_sample).div_ceil(self.h_max),
                height: (height * component.vertical_sample).div_ceil(self.v_max)
            })
            .collect();

        let samplers: Vec<UpSampler> = self
            .components
            .iter()
            .map(|component| {
                UpSampler::new(
                    self.h_max / component.horizontal_sample,
                    self.v_max / component.vertical_sample
                )
            })
            .collect();

        trace!("Upsamplers {:?}", samplers);

        Ok(upsample_and_color_convert(
            &planes, &samplers, converter, colorspace, width, height, threads
        ))
    }
}
