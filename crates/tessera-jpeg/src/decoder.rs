/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Main image logic.
#![allow(clippy::doc_markdown)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tessera_core::bytestream::ByteReader;
use tessera_core::colorspace::ColorSpace;
use tessera_core::log::{debug, info, trace, warn};
use tessera_core::options::DecoderOptions;

use crate::color_convert::ColorConverter;
use crate::components::{ComponentMetadata, Components};
use crate::errors::{DecodeErrors, DecodeWarning, UnsupportedSchemes};
use crate::headers::{
    parse_app0, parse_app1, parse_app14, parse_app2, parse_com, parse_dqt, parse_dri,
    parse_huffman, parse_sos, parse_start_of_frame, skip_marker
};
use crate::huffman::HuffmanTable;
use crate::idct::choose_idct_func;
use crate::marker::{find_marker, Marker};
use crate::misc::SOFMarkers;

/// Maximum components
pub(crate) const MAX_COMPONENTS: usize = 4;

/// Maximum image dimensions supported.
pub(crate) const MAX_DIMENSIONS: usize = 1 << 27;

/// IDCT  function prototype
///
/// Carries out an inverse DCT on a block of 64 dequantized coefficients
/// in natural order, writing 8 rows of 8 samples `stride` apart.
/// The coefficient block may be clobbered.
pub type IDCTPtr = fn(&mut [i32; 64], &mut [i16], usize);

/// Pixel density declared in a JFIF APP0 segment
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct JfifDensity {
    /// 0 for an aspect ratio only, 1 for dots per inch, 2 for dots per cm
    pub units:     u8,
    pub x_density: u16,
    pub y_density: u16
}

/// One APP2 chunk of an ICC profile
#[derive(Clone, Debug)]
pub(crate) struct ICCChunk {
    pub seq_no:      u8,
    pub num_markers: u8,
    pub data:        Vec<u8>
}

/// A struct representing Image Information
#[derive(Default, Clone, Debug, Eq, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct ImageInfo {
    /// Width of the image
    pub width:           u16,
    /// Height of image
    pub height:          u16,
    /// Sample precision in bits
    pub precision:       u8,
    /// Start of frame markers
    pub sof:             SOFMarkers,
    /// Number of components
    pub components:      u8,
    /// Layout of each component, in frame order
    pub component_info:  Vec<ComponentMetadata>,
    /// Largest horizontal sampling factor
    pub h_max:           usize,
    /// Largest vertical sampling factor
    pub v_max:           usize,
    /// Pixel density, if the image has a JFIF header
    pub jfif:            Option<JfifDensity>,
    /// Colour transform of an Adobe APP14 segment
    pub adobe_transform: Option<u8>
}

/// A JPEG Decoder Instance.
#[allow(clippy::upper_case_acronyms)]
pub struct JpegDecoder<'a> {
    /// Struct to hold image information from SOI
    pub(crate) info:              ImageInfo,
    /// Quantization tables, copied into components at their first scan
    pub(crate) qt_tables:         [Option<[i32; 64]>; MAX_COMPONENTS],
    /// DC Huffman Tables with a maximum of 4 tables for each  component
    pub(crate) dc_huffman_tables: [Option<HuffmanTable>; MAX_COMPONENTS],
    /// AC Huffman Tables with a maximum of 4 tables for each component
    pub(crate) ac_huffman_tables: [Option<HuffmanTable>; MAX_COMPONENTS],
    /// Image components, holds information like DC prediction and quantization
    /// tables of a component
    pub(crate) components:        Vec<Components>,
    /// maximum horizontal component of all channels in the image
    pub(crate) h_max:             usize,
    // maximum vertical component of all channels in the image
    pub(crate) v_max:             usize,
    /// Number of MCU's in the x plane
    pub(crate) mcu_x:             usize,
    /// Number of MCU's in the y plane
    pub(crate) mcu_y:             usize,
    /// Is the current scan interleaved?
    pub(crate) is_interleaved:    bool,
    /// Is the image progressive?
    pub(crate) is_progressive:    bool,
    /// A frame header was parsed
    pub(crate) seen_sof:          bool,

    /// Start of spectral scan
    pub(crate) spec_start:       u8,
    /// End of spectral scan
    pub(crate) spec_end:         u8,
    /// Successive approximation bit position high
    pub(crate) succ_high:        u8,
    /// Successive approximation bit position low
    pub(crate) succ_low:         u8,
    /// Number of components in the current scan.
    pub(crate) num_scans:        u8,
    /// Indexes into `components` in scan order
    pub(crate) z_order:          [usize; MAX_COMPONENTS],
    /// Dequantize and idct function
    pub(crate) idct_func:        IDCTPtr,
    /// restart markers
    pub(crate) restart_interval: usize,
    // decoder options
    pub(crate) options:          DecoderOptions,
    // byte-stream
    pub(crate) stream:           ByteReader<'a>,
    // Indicate whether headers have been decoded
    pub(crate) headers_decoded:  bool,
    /// Recoverable problems found so far
    pub(crate) warnings:         Vec<DecodeWarning>,
    pub(crate) cancel:           Option<Arc<AtomicBool>>,
    // metadata
    pub(crate) exif_data:        Option<Vec<u8>>,
    pub(crate) xmp_data:         Option<Vec<u8>>,
    pub(crate) icc_data:         Vec<ICCChunk>,
    pub(crate) comments:         Vec<Vec<u8>>
}

impl<'a> JpegDecoder<'a> {
    fn default(options: DecoderOptions, buffer: &'a [u8]) -> Self {
        JpegDecoder {
            info: ImageInfo::default(),
            qt_tables: [None, None, None, None],
            dc_huffman_tables: [None, None, None, None],
            ac_huffman_tables: [None, None, None, None],
            components: vec![],
            // Interleaved information
            h_max: 1,
            v_max: 1,
            mcu_x: 0,
            mcu_y: 0,
            is_interleaved: false,
            is_progressive: false,
            seen_sof: false,

            // Progressive information
            spec_start: 0,
            spec_end: 0,
            succ_high: 0,
            succ_low: 0,
            num_scans: 0,
            z_order: [0; MAX_COMPONENTS],

            // Function pointers
            idct_func: choose_idct_func(&options),

            restart_interval: 0,
            // options
            options,
            stream: ByteReader::new(buffer),
            headers_decoded: false,
            warnings: vec![],
            cancel: None,
            exif_data: None,
            xmp_data: None,
            icc_data: vec![],
            comments: vec![]
        }
    }

    /// Create a new Decoder instance
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new(stream: &'a [u8]) -> JpegDecoder<'a> {
        JpegDecoder::default(DecoderOptions::default(), stream)
    }

    /// Create a new decoder with the specified options to be used for decoding
    /// an image
    #[must_use]
    pub fn new_with_options(stream: &'a [u8], options: DecoderOptions) -> JpegDecoder<'a> {
        JpegDecoder::default(options, stream)
    }

    /// Decode a buffer already in memory
    ///
    /// The buffer should be a valid jpeg file, perhaps created by the command
    /// `std:::fs::read()` or a JPEG file downloaded from the internet.
    ///
    /// Pixels are returned in the colorspace set with
    /// [`DecoderOptions::jpeg_set_out_colorspace`], row by row without padding.
    ///
    /// # Errors
    /// See DecodeErrors for an explanation
    pub fn decode(&mut self) -> Result<Vec<u8>, DecodeErrors> {
        self.decode_internal()
    }

    /// Read only headers from a jpeg image buffer
    ///
    /// This allows you to extract important information like
    /// image width and height without decoding the full image.
    /// Headers are read up to the first start of scan segment.
    ///
    /// # Examples
    /// ```no_run
    /// use tessera_jpeg::JpegDecoder;
    ///
    /// let img_data = std::fs::read("a_valid.jpeg").unwrap();
    /// let mut decoder = JpegDecoder::new(&img_data);
    /// decoder.decode_headers().unwrap();
    ///
    /// println!("Total decoder dimensions are : {} pixels",usize::from(decoder.width()) * usize::from(decoder.height()));
    /// println!("Number of components in the image are {}", decoder.info().unwrap().components);
    /// ```
    /// # Errors
    /// See DecodeErrors enum for list of possible errors during decoding
    pub fn decode_headers(&mut self) -> Result<(), DecodeErrors> {
        self.decode_headers_internal(false)
    }

    /// Read headers up to and including the frame header
    pub(crate) fn decode_frame_header(&mut self) -> Result<(), DecodeErrors> {
        self.decode_headers_internal(true)
    }

    /// Returns the image information
    ///
    /// This **must** be called after a subsequent call to `decode` or
    /// `decode_headers` otherwise it will return None
    #[must_use]
    pub fn info(&self) -> Option<ImageInfo> {
        if !self.headers_decoded {
            return None;
        }
        Some(self.info.clone())
    }

    /// Get the width of the image as a u16
    ///
    /// The width lies between 1 and 65535, zero before headers are decoded
    pub const fn width(&self) -> u16 {
        self.info.width
    }

    /// Get the height of the image as a u16
    ///
    /// The height lies between 1 and 65535, zero before headers are decoded
    pub const fn height(&self) -> u16 {
        self.info.height
    }

    /// Get the output colorspace the image pixels will be decoded into
    #[must_use]
    pub const fn output_colorspace(&self) -> ColorSpace {
        self.options.jpeg_get_out_colorspace()
    }

    /// The colorspace the image was stored in
    ///
    /// Returns `None` until headers are decoded
    #[must_use]
    pub fn input_colorspace(&self) -> Option<ColorSpace> {
        if !self.headers_decoded {
            return None;
        }
        self.color_converter().ok().map(ColorConverter::colorspace)
    }

    /// Recoverable problems met while decoding, in the order they were found
    #[must_use]
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// Let another thread stop decoding
    ///
    /// The flag is checked before every scan, once it is set decoding
    /// fails with [`DecodeErrors::Cancelled`].
    pub fn set_cancellation_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel = Some(flag);
    }

    /// The EXIF payload of an APP1 segment, without the `Exif\0\0` header
    #[must_use]
    pub fn exif(&self) -> Option<&[u8]> {
        self.exif_data.as_deref()
    }

    /// The XMP packet of an APP1 segment
    #[must_use]
    pub fn xmp(&self) -> Option<&[u8]> {
        self.xmp_data.as_deref()
    }

    /// The embedded ICC profile
    ///
    /// Profiles split over several APP2 segments are joined in sequence
    /// order. Returns `None` if there is no profile or a chunk is missing.
    #[must_use]
    pub fn icc_profile(&self) -> Option<Vec<u8>> {
        if self.icc_data.is_empty() {
            return None;
        }
        let mut chunks: Vec<&ICCChunk> = self.icc_data.iter().collect();

        chunks.sort_by_key(|chunk| chunk.seq_no);

        let total = usize::from(chunks[0].num_markers);

        let complete = chunks.len() == total
            && chunks
                .iter()
                .enumerate()
                .all(|(i, chunk)| usize::from(chunk.seq_no) == i + 1 && chunk.num_markers == chunks[0].num_markers);

        if !complete {
            warn!("Incomplete ICC profile, {} of {} chunks", chunks.len(), total);
            return None;
        }
        Some(chunks.iter().flat_map(|chunk| chunk.data.iter().copied()).collect())
    }

    /// Contents of every COM segment
    #[must_use]
    pub fn comments(&self) -> &[Vec<u8>] {
        &self.comments
    }

    /// Record a recoverable problem
    ///
    /// In strict mode the warning is returned as an error instead.
    pub(crate) fn push_warning(&mut self, warning: DecodeWarning) -> Result<(), DecodeErrors> {
        warn!("{}", warning);

        if self.options.get_strict_mode() {
            return Err(DecodeErrors::StrictMode(warning));
        }
        self.warnings.push(warning);

        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), DecodeErrors> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => {
                info!("Decoding cancelled");
                Err(DecodeErrors::Cancelled)
            }
            _ => Ok(())
        }
    }

    pub(crate) fn color_converter(&self) -> Result<ColorConverter, DecodeErrors> {
        let ids: Vec<u8> = self.components.iter().map(|c| c.id).collect();

        ColorConverter::select(self.components.len(), self.info.adobe_transform, &ids)
    }

    /// Find the next marker, warning about any bytes skipped to reach it
    ///
    /// Returns `None` at the end of the stream.
    fn next_marker(&mut self) -> Result<Option<u8>, DecodeErrors> {
        let (marker, skipped) = find_marker(&mut self.stream);

        if skipped > 0 {
            if let Some(marker) = marker {
                self.push_warning(DecodeWarning::ExtraneousBytes {
                    count: skipped,
                    marker
                })?;
            }
        }
        Ok(marker)
    }

    /// Decode Decoder headers
    ///
    /// This routine takes care of parsing supported headers from a Decoder
    /// image
    ///
    /// # Supported Headers
    ///  - APP(0), APP(1), APP(2), APP(14), COM
    ///  - SOF(0), SOF(1), SOF(2)
    ///  - DQT -> Quantization tables
    ///  - DHT -> Huffman tables
    ///  - DRI -> Restart interval
    ///  - SOS -> Start of Scan
    /// # Unsupported Headers
    ///  - SOF(n) -> Decoder images which are not baseline/progressive
    ///  - DAC -> Images using Arithmetic tables
    ///  - DHP, EXP -> Hierarchical images
    fn decode_headers_internal(&mut self, stop_after_sof: bool) -> Result<(), DecodeErrors> {
        if self.headers_decoded {
            trace!("Headers decoded!");
            return Ok(());
        }
        // First two bytes should be jpeg soi marker
        let magic_bytes = self.stream.get_u16_be_err()?;

        if magic_bytes != 0xffd8 {
            return Err(DecodeErrors::IllegalMagicBytes(magic_bytes));
        }

        loop {
            let Some(code) = self.next_marker()? else {
                if self.seen_sof && !stop_after_sof {
                    return Err(DecodeErrors::ExhaustedData);
                }
                if self.seen_sof {
                    break;
                }
                return Err(DecodeErrors::FormatStatic(
                    "Premature end of data, missing frame header"
                ));
            };
            let Some(marker) = Marker::from_u8(code) else {
                self.skip_unknown_marker(code)?;
                continue;
            };

            match marker {
                Marker::SOS => {
                    parse_sos(self)?;
                    break;
                }
                Marker::EOI => {
                    return Err(if self.seen_sof {
                        DecodeErrors::FormatStatic("Premature end of image, no scan found")
                    } else {
                        DecodeErrors::FormatStatic("Premature end of image, missing frame header")
                    });
                }
                _ => self.parse_marker_inner(marker)?
            }

            if stop_after_sof && self.seen_sof {
                break;
            }
        }
        self.headers_decoded = true;

        Ok(())
    }

    /// Parse every segment that may appear between SOI and EOI except
    /// SOS and EOI themselves
    pub(crate) fn parse_marker_inner(&mut self, m: Marker) -> Result<(), DecodeErrors> {
        match m {
            Marker::SOF(n @ 0..=2) => {
                let sof = u16::from_be_bytes([0xFF, 0xC0 + n]);
                let marker = SOFMarkers::from_int(sof).unwrap_or_default();

                info!("Image encoding scheme =`{:?}`", marker);
                // get components
                parse_start_of_frame(marker, self)?;
            }
            // Start of Frame Segments not supported
            Marker::SOF(v) => {
                return Err(match UnsupportedSchemes::from_int(0xC0 + v) {
                    Some(feature) => DecodeErrors::Unsupported(feature),
                    None => DecodeErrors::Format(format!("Unsupported frame type SOF{v}"))
                });
            }
            Marker::DQT => parse_dqt(self)?,
            Marker::DHT => parse_huffman(self)?,
            Marker::DRI => parse_dri(self)?,
            Marker::APP(0) => parse_app0(self)?,
            Marker::APP(1) => parse_app1(self)?,
            Marker::APP(2) => parse_app2(self)?,
            Marker::APP(14) => parse_app14(self)?,
            Marker::COM => parse_com(self)?,
            Marker::DAC => {
                return Err(DecodeErrors::Unsupported(
                    UnsupportedSchemes::ArithmeticConditioning
                ))
            }
            Marker::DHP | Marker::EXP => {
                return Err(DecodeErrors::Unsupported(UnsupportedSchemes::Hierarchical))
            }
            Marker::RST(n) => {
                // no entropy coded data to restart
                trace!("Ignoring RST{n} outside of a scan");
            }
            Marker::SOI => {
                return Err(DecodeErrors::FormatStatic("Start of image marker inside image"))
            }
            Marker::SOS => parse_sos(self)?,
            Marker::EOI => return Err(DecodeErrors::FormatStatic("Premature End of image")),
            Marker::APP(_) | Marker::DNL => {
                debug!("Skipping marker {:?}", m);
                skip_marker(self)?;
            }
        }
        Ok(())
    }

    /// Skip a marker code that has no meaning for the decoder
    fn skip_unknown_marker(&mut self, code: u8) -> Result<(), DecodeErrors> {
        warn!("Marker 0xFF{:X} not known", code);

        match code {
            // TEM and the reserved codes carry no payload
            0x01..=0xBF => Ok(()),
            _ => skip_marker(self)
        }
    }

    fn decode_internal(&mut self) -> Result<Vec<u8>, DecodeErrors> {
        self.decode_headers_internal(false)?;

        let converter = self.color_converter()?;
        let out_colorspace = self.options.jpeg_get_out_colorspace();

        converter.check_output(out_colorspace)?;

        let mut scans = 0;

        'scans: loop {
            self.check_cancelled()?;

            scans += 1;

            if scans > self.options.jpeg_get_max_scans() {
                return Err(DecodeErrors::Format(format!(
                    "Too many scans, the limit is {}",
                    self.options.jpeg_get_max_scans()
                )));
            }
            self.decode_scan()?;

            loop {
                let Some(code) = self.next_marker()? else {
                    self.push_warning(DecodeWarning::MissingEoi)?;
                    break 'scans;
                };
                let Some(marker) = Marker::from_u8(code) else {
                    self.skip_unknown_marker(code)?;
                    continue;
                };

                match marker {
                    Marker::EOI => {
                        let remaining = self.stream.remaining();

                        if remaining > 0 {
                            self.push_warning(DecodeWarning::TrailingBytesAfterEoi(remaining))?;
                        }
                        break 'scans;
                    }
                    Marker::SOS => {
                        parse_sos(self)?;
                        continue 'scans;
                    }
                    _ => self.parse_marker_inner(marker)?
                }
            }
        }
        debug!("Decoded {} scan(s)", scans);

        self.post_process(converter, out_colorspace)
    }
}
