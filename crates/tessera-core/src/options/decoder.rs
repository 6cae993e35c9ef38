/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Global Decoder options

use crate::colorspace::ColorSpace;

/// Decoder options
///
/// Not all options are respected by decoders
/// Each option specifies decoders that respect it
///
/// Options are set with the builder style `set_*` functions
/// and read back with the matching `get_*` functions
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Maximum width for which decoders will
    /// not try to decode images larger than
    /// the specified width.
    ///
    /// - Default value: 16384
    /// - Respected by: `all decoders`
    max_width:      usize,
    /// Maximum height for which decoders will not
    /// try to decode images larger than the
    /// specified height
    ///
    /// - Default value: 16384
    /// - Respected by: `all decoders`
    max_height:     usize,
    /// Treat recoverable stream problems as errors
    ///
    /// - Default value: false
    /// - Respected by: `jpeg`
    strict_mode:    bool,
    /// Do not retain metadata segments (EXIF, XMP, ICC, comments)
    ///
    /// - Default value: false
    /// - Respected by: `jpeg`
    skip_metadata:  bool,
    /// Output colorspace
    ///
    /// The jpeg decoder allows conversion to a separate colorspace
    /// than the input.
    ///
    /// I.e you can convert a RGB jpeg image to grayscale without
    /// first decoding it to RGB to get
    ///
    /// - Default value: `ColorSpace::RGB`
    /// - Respected by: `jpeg`
    out_colorspace: ColorSpace,
    /// Maximum number of scans allowed
    /// for progressive jpeg images
    ///
    /// Progressive jpegs have scans
    ///
    /// - Default value:100
    /// - Respected by: `jpeg`
    max_scans:      usize,
    /// Number of threads used for block reconstruction
    /// and color conversion
    ///
    /// - Default value: 4
    /// - Respected by: `jpeg`
    num_threads:    usize,
    /// Whether to use the four lane IDCT
    ///
    /// Both implementations give the same output,
    /// this exists mainly to allow testing one against the other
    ///
    /// - Default value: true
    /// - Respected by: `jpeg`
    use_lanes:      bool
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_width:      1 << 14,
            max_height:     1 << 14,
            strict_mode:    false,
            skip_metadata:  false,
            out_colorspace: ColorSpace::RGB,
            max_scans:      100,
            num_threads:    4,
            use_lanes:      true
        }
    }
}

/// Global options respected by all decoders
impl DecoderOptions {
    /// Get maximum width configured for which the decoder
    /// should not try to decode images greater than this width
    pub const fn get_max_width(&self) -> usize {
        self.max_width
    }

    /// Get maximum height configured for which the decoder should
    /// not try to decode images greater than this height
    pub const fn get_max_height(&self) -> usize {
        self.max_height
    }

    /// Return true whether the decoder should be in strict mode
    /// And reject most errors
    pub const fn get_strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// Return true if metadata segments should be skipped
    pub const fn get_skip_metadata(&self) -> bool {
        self.skip_metadata
    }

    /// Set maximum width for which the decoder should not try
    /// decoding images greater than that width
    ///
    /// # Arguments
    ///
    /// * `width`:  The maximum width allowed
    ///
    /// returns: DecoderOptions
    #[must_use]
    pub fn set_max_width(mut self, width: usize) -> Self {
        self.max_width = width;
        self
    }

    /// Set maximum height for which the decoder should not try
    /// decoding images greater than that height
    /// # Arguments
    ///
    /// * `height`: The maximum height allowed
    ///
    /// returns: DecoderOptions
    ///
    #[must_use]
    pub fn set_max_height(mut self, height: usize) -> Self {
        self.max_height = height;
        self
    }

    /// Set whether the decoder should be in standards conforming/
    /// strict mode
    ///
    /// This reduces the error tolerance level for the decoders and
    /// problems that would otherwise be reported as warnings
    /// will be returned as errors
    #[must_use]
    pub fn set_strict_mode(mut self, yes: bool) -> Self {
        self.strict_mode = yes;
        self
    }

    /// Set whether metadata segments should be skipped
    /// instead of being retained by the decoder
    #[must_use]
    pub fn set_skip_metadata(mut self, yes: bool) -> Self {
        self.skip_metadata = yes;
        self
    }
}

/// JPEG specific options
impl DecoderOptions {
    /// Get maximum scans for which the jpeg decoder
    /// should not go above for progressive images
    pub const fn jpeg_get_max_scans(&self) -> usize {
        self.max_scans
    }

    /// Set maximum scans for which the jpeg decoder should
    /// not exceed when reconstructing images.
    #[must_use]
    pub fn jpeg_set_max_scans(mut self, max_scans: usize) -> Self {
        self.max_scans = max_scans;
        self
    }

    /// Get expected output colorspace set by the user for which the image
    /// is expected to be reconstructed into.
    ///
    /// This may be different from the colorspace the image was encoded in
    pub const fn jpeg_get_out_colorspace(&self) -> ColorSpace {
        self.out_colorspace
    }

    /// Set expected colorspace for which the jpeg output is expected to be in
    ///
    /// This is mainly provided as is, we do not guarantee the decoder can convert to all colorspaces
    /// and the decoder can change it internally when it sees fit.
    #[must_use]
    pub fn jpeg_set_out_colorspace(mut self, colorspace: ColorSpace) -> Self {
        self.out_colorspace = colorspace;
        self
    }

    /// Number of threads the jpeg decoder may use
    ///
    /// A value of zero is treated as one
    pub const fn jpeg_get_num_threads(&self) -> usize {
        if self.num_threads == 0 {
            1
        } else {
            self.num_threads
        }
    }

    /// Set the number of threads the jpeg decoder may use
    /// for reconstruction.
    ///
    /// Setting this to 1 decodes everything on the calling thread
    #[must_use]
    pub fn jpeg_set_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Return true if the four lane IDCT should be used
    pub const fn jpeg_get_use_lanes(&self) -> bool {
        self.use_lanes
    }

    /// Choose between the four lane and the scalar IDCT
    #[must_use]
    pub fn jpeg_set_use_lanes(mut self, yes: bool) -> Self {
        self.use_lanes = yes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = DecoderOptions::default();
        assert_eq!(options.get_max_width(), 16384);
        assert_eq!(options.get_max_height(), 16384);
        assert!(!options.get_strict_mode());
        assert_eq!(options.jpeg_get_out_colorspace(), ColorSpace::RGB);
        assert_eq!(options.jpeg_get_max_scans(), 100);
        assert_eq!(options.jpeg_get_num_threads(), 4);
    }

    #[test]
    fn zero_threads_means_one() {
        let options = DecoderOptions::default().jpeg_set_num_threads(0);
        assert_eq!(options.jpeg_get_num_threads(), 1);
    }
}
