/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Decode Decoder markers/segments
//!
//! This file deals with decoding header information in a jpeg file
//!
use tessera_core::bytestream::ByteIoError;
use tessera_core::log::{info, trace, warn};

use crate::components::Components;
use crate::decoder::{ICCChunk, JfifDensity, JpegDecoder, MAX_COMPONENTS, MAX_DIMENSIONS};
use crate::errors::{DecodeErrors, DecodeWarning, UnsupportedSchemes};
use crate::huffman::HuffmanTable;
use crate::misc::{SOFMarkers, UN_ZIGZAG};

/// Read a segment length and return the number of payload bytes after it
fn segment_length(decoder: &mut JpegDecoder, what: &'static str) -> Result<usize, DecodeErrors> {
    let length = usize::from(decoder.stream.get_u16_be_err()?);

    length
        .checked_sub(2)
        .ok_or(DecodeErrors::FormatStatic(what))
}

///**B.2.4.2 Huffman table-specification syntax**
#[allow(clippy::similar_names)]
pub(crate) fn parse_huffman(decoder: &mut JpegDecoder) -> Result<(), DecodeErrors> {
    // Read the length of the Huffman table
    let mut dht_length = segment_length(decoder, "Invalid Huffman length in image")?;

    while dht_length > 16 {
        // HT information
        let ht_info = decoder.stream.get_u8_err().map_err(truncated_dht)?;
        // third bit indicates whether the huffman encoding is DC or AC type
        let dc_or_ac = (ht_info >> 4) & 0xF;
        // Indicate the position of this table, should be less than 4;
        let index = usize::from(ht_info & 0xF);
        // read the number of symbols
        let mut num_symbols: [u8; 17] = [0; 17];

        if index >= MAX_COMPONENTS {
            return Err(DecodeErrors::HuffmanDecode(format!(
                "Invalid DHT index {index}, expected between 0 and 3"
            )));
        }

        if dc_or_ac > 1 {
            return Err(DecodeErrors::HuffmanDecode(format!(
                "Invalid DHT position {dc_or_ac}, should be 0 or 1"
            )));
        }

        let counts = decoder.stream.read_exact_bytes(16).map_err(truncated_dht)?;
        num_symbols[1..17].copy_from_slice(counts);

        dht_length -= 1 + 16;

        let symbols_sum: usize = num_symbols.iter().map(|f| usize::from(*f)).sum();

        // The sum of the number of symbols cannot be greater than 256;
        if symbols_sum > 256 {
            return Err(DecodeErrors::HuffmanDecode(
                "Encountered Huffman table with excessive length in DHT".to_string()
            ));
        }
        if symbols_sum > dht_length {
            return Err(DecodeErrors::HuffmanDecode(format!(
                "Excessive Huffman table of length {symbols_sum} found when header length is {dht_length}"
            )));
        }
        dht_length -= symbols_sum;
        // A table containing symbols in increasing code length
        let mut symbols = [0; 256];

        let coded = decoder.stream.read_exact_bytes(symbols_sum).map_err(truncated_dht)?;
        symbols[..symbols_sum].copy_from_slice(coded);

        let table = HuffmanTable::new(&num_symbols, symbols, dc_or_ac == 0, decoder.is_progressive)?;

        trace!("Assigning {} huffman table {index}", if dc_or_ac == 0 { "DC" } else { "AC" });
        // store
        match dc_or_ac {
            0 => decoder.dc_huffman_tables[index] = Some(table),
            _ => decoder.ac_huffman_tables[index] = Some(table)
        }
    }

    if dht_length > 0 {
        return Err(DecodeErrors::HuffmanDecode(
            "Bogus Huffman table definition".to_string()
        ));
    }

    Ok(())
}

fn truncated_dht(err: ByteIoError) -> DecodeErrors {
    DecodeErrors::HuffmanDecode(format!("Huffman table ends early: {err}"))
}

fn truncated_dqt(err: ByteIoError) -> DecodeErrors {
    DecodeErrors::DqtError(format!("Quantization table ends early: {err}"))
}

///**B.2.4.1 Quantization table-specification syntax**
#[allow(clippy::needless_range_loop)]
pub(crate) fn parse_dqt(img: &mut JpegDecoder) -> Result<(), DecodeErrors> {
    // read length
    let mut qt_length = segment_length(img, "Invalid DQT length. Length should be greater than 2")?;

    // A single DQT header may have multiple QT's
    while qt_length > 0 {
        let qt_info = img.stream.get_u8_err().map_err(truncated_dqt)?;
        // 0 = 8 bit otherwise 16 bit dqt
        let precision = usize::from(qt_info >> 4);
        // last 4 bits give us position
        let table_position = usize::from(qt_info & 0x0f);
        let precision_value = 64 * (precision + 1);

        if precision > 1 {
            return Err(DecodeErrors::DqtError(format!(
                "Expected QT precision value of either 0 or 1, found {precision:?}"
            )));
        }
        if precision_value + 1 > qt_length {
            return Err(DecodeErrors::DqtError(format!("Invalid QT table bytes left :{}. Too small to construct a valid qt table which should be {} long", qt_length, precision_value + 1)));
        }

        let mut qt_values = [0_u16; 64];

        if precision == 0 {
            let bytes = img.stream.read_exact_bytes(64).map_err(truncated_dqt)?;

            for (value, byte) in qt_values.iter_mut().zip(bytes) {
                *value = u16::from(*byte);
            }
        } else {
            // 16 bit quantization tables
            for i in 0..64 {
                qt_values[i] = img.stream.get_u16_be_err().map_err(truncated_dqt)?;
            }
        }
        qt_length -= precision_value + 1;

        if table_position >= MAX_COMPONENTS {
            return Err(DecodeErrors::DqtError(format!(
                "Too large table position for QT :{table_position}, expected between 0 and 3"
            )));
        }

        trace!("Assigning qt table {table_position} with precision {precision}");
        // carry out un zig-zag here
        img.qt_tables[table_position] = Some(un_zig_zag(&qt_values));
    }

    Ok(())
}

/// Section:`B.2.2 Frame header syntax`
pub(crate) fn parse_start_of_frame(
    sof: SOFMarkers, img: &mut JpegDecoder
) -> Result<(), DecodeErrors> {
    if img.seen_sof {
        return Err(DecodeErrors::SofError(
            "multiple frames unsupported".to_string()
        ));
    }
    // Get length of the frame header
    let length = img.stream.get_u16_be_err()?;
    // usually 8, but can be 12 and 16, we currently support only 8
    let dt_precision = img.stream.get_u8_err()?;

    if dt_precision != 8 {
        return Err(DecodeErrors::Unsupported(UnsupportedSchemes::SamplePrecision(
            dt_precision
        )));
    }

    img.info.precision = dt_precision;

    // read  and set the image height.
    let img_height = img.stream.get_u16_be_err()?;
    // read and set the image width
    let img_width = img.stream.get_u16_be_err()?;

    trace!("Image width  :{}", img_width);
    trace!("Image height :{}", img_height);

    // Check image width or height is zero
    if img_width == 0 || img_height == 0 {
        return Err(DecodeErrors::ZeroError);
    }

    if usize::from(img_width) > img.options.get_max_width() {
        return Err(DecodeErrors::Format(format!("Image width {} greater than width limit {}. Use `set_max_width` if you want to support huge images", img_width, img.options.get_max_width())));
    }

    if usize::from(img_height) > img.options.get_max_height() {
        return Err(DecodeErrors::Format(format!("Image height {} greater than height limit {}. Use `set_max_height` if you want to support huge images", img_height, img.options.get_max_height())));
    }

    let dimensions = usize::from(img_width) * usize::from(img_height);

    if dimensions > MAX_DIMENSIONS {
        return Err(DecodeErrors::LargeDimensions(dimensions));
    }

    // Number of components for the image.
    let num_components = img.stream.get_u8_err()?;

    if !matches!(num_components, 1 | 3 | 4) {
        return Err(DecodeErrors::Unsupported(UnsupportedSchemes::ComponentCount(
            num_components
        )));
    }

    let expected = 8 + 3 * u16::from(num_components);
    // length should be equal to num components
    if length != expected {
        return Err(DecodeErrors::SofError(format!(
            "Length of start of frame differs from expected {expected},value is {length}"
        )));
    }

    trace!("Image components : {}", num_components);

    let mut components = Vec::with_capacity(usize::from(num_components));

    for pos in 0..num_components {
        // read 3 bytes for each component
        let mut temp = [0; 3];

        temp.copy_from_slice(img.stream.read_exact_bytes(3)?);
        // create a component.
        components.push(Components::from(temp, pos)?);
    }

    if num_components == 1 {
        let component = &mut components[0];

        if component.horizontal_sample != 1 || component.vertical_sample != 1 {
            // a single component is never subsampled against anything,
            // decode it as one block per MCU
            component.horizontal_sample = 1;
            component.vertical_sample = 1;
            img.push_warning(DecodeWarning::DownsampledGrayscale)?;
        }
    }

    let h_max = components.iter().map(|c| c.horizontal_sample).max().unwrap_or(1);
    let v_max = components.iter().map(|c| c.vertical_sample).max().unwrap_or(1);

    if components
        .iter()
        .any(|c| h_max % c.horizontal_sample != 0 || v_max % c.vertical_sample != 0)
    {
        return Err(DecodeErrors::Unsupported(UnsupportedSchemes::NonIntegralSampling));
    }

    let (width, height) = (usize::from(img_width), usize::from(img_height));

    img.h_max = h_max;
    img.v_max = v_max;
    img.mcu_x = width.div_ceil(8 * h_max);
    img.mcu_y = height.div_ceil(8 * v_max);

    for component in &mut components {
        component.setup_blocks(width, height, h_max, v_max, img.mcu_x, img.mcu_y);
    }

    img.info.width = img_width;
    img.info.height = img_height;
    img.info.sof = sof;
    img.info.components = num_components;
    img.info.h_max = h_max;
    img.info.v_max = v_max;
    img.info.component_info = components.iter().map(Components::metadata).collect();

    img.is_progressive = sof.is_progressive();
    img.seen_sof = true;
    img.components = components;

    trace!("Frame {sof:?}, max sampling {h_max}x{v_max}, {}x{} MCUs", img.mcu_x, img.mcu_y);

    Ok(())
}

/// Parse a start of scan data
pub(crate) fn parse_sos(image: &mut JpegDecoder) -> Result<(), DecodeErrors> {
    if !image.seen_sof {
        return Err(DecodeErrors::FormatStatic("Start of scan found before a frame header"));
    }
    // Scan header length
    let ls = usize::from(image.stream.get_u16_be_err()?);
    // Number of image components in scan
    let ns = image.stream.get_u8_err()?;

    let smallest_size = 6 + 2 * usize::from(ns);

    if ls != smallest_size {
        return Err(DecodeErrors::SosError(format!(
            "Bad SOS length {ls},corrupt jpeg"
        )));
    }

    // Check number of components.
    if !(1..5).contains(&ns) || usize::from(ns) > image.components.len() {
        return Err(DecodeErrors::SosError(format!(
            "Invalid number of components in start of scan {ns}, expected in range 1..={}",
            image.components.len()
        )));
    }

    let mut seen = [None; MAX_COMPONENTS];

    image.num_scans = ns;

    for i in 0..usize::from(ns) {
        let id = image.stream.get_u8_err()?;

        if seen.contains(&Some(id)) {
            return Err(DecodeErrors::SosError(format!(
                "Duplicate ID {id} seen twice in the same scan"
            )));
        }

        seen[i] = Some(id);
        // DC and AC huffman table position
        // top 4 bits contain dc huffman destination table
        // lower four bits contain ac huffman destination table
        let y = image.stream.get_u8_err()?;

        let j = image
            .components
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| {
                DecodeErrors::SosError(format!(
                    "Invalid component id {}, expected one one of {:?}",
                    id,
                    image.components.iter().map(|c| c.id).collect::<Vec<_>>()
                ))
            })?;

        let component = &mut image.components[j];

        component.dc_huff_table = usize::from((y >> 4) & 0xF);
        component.ac_huff_table = usize::from(y & 0xF);
        image.z_order[i] = j;

        trace!(
            "Assigned huffman tables {}/{} to component {j}, id={}",
            component.dc_huff_table,
            component.ac_huff_table,
            component.id,
        );
    }

    if ns > 1 {
        let blocks: usize = image.z_order[..usize::from(ns)]
            .iter()
            .map(|x| image.components[*x].horizontal_sample * image.components[*x].vertical_sample)
            .sum();

        if blocks > 10 {
            return Err(DecodeErrors::SosError(format!(
                "An MCU of {blocks} blocks is larger than the limit of 10"
            )));
        }
    }
    image.is_interleaved = ns > 1;

    // Start of spectral / predictor selection. (between 0 and 63)
    image.spec_start = image.stream.get_u8_err()?;
    // End of spectral selection
    image.spec_end = image.stream.get_u8_err()?;

    let bit_approx = image.stream.get_u8_err()?;
    // successive approximation bit position high
    image.succ_high = bit_approx >> 4;
    // successive approximation bit position low
    image.succ_low = bit_approx & 0xF;

    if image.spec_end > 63 {
        return Err(DecodeErrors::SosError(format!(
            "Invalid Se parameter {}, range should be 0-63",
            image.spec_end
        )));
    }
    if image.spec_start > 63 {
        return Err(DecodeErrors::SosError(format!(
            "Invalid Ss parameter {}, range should be 0-63",
            image.spec_start
        )));
    }
    if image.is_progressive {
        validate_progressive_scan(image)?;
    }

    trace!(
        "Ss={}, Se={} Ah={} Al={}",
        image.spec_start,
        image.spec_end,
        image.succ_high,
        image.succ_low
    );

    Ok(())
}

/// Section G.1.1.1.1, the spectral selection and successive
/// approximation parameters must agree with each other
fn validate_progressive_scan(image: &JpegDecoder) -> Result<(), DecodeErrors> {
    let (ss, se, ah, al) = (image.spec_start, image.spec_end, image.succ_high, image.succ_low);

    if ss == 0 && se != 0 {
        return Err(DecodeErrors::SosError(
            "Can't merge DC and AC, corrupt jpeg".to_string()
        ));
    }
    if ss != 0 && (se < ss || image.num_scans != 1) {
        return Err(DecodeErrors::SosError(format!(
            "Invalid AC scan Ss={ss} Se={se} with {} components",
            image.num_scans
        )));
    }
    if ah != 0 && al + 1 != ah {
        return Err(DecodeErrors::SosError(format!(
            "Invalid successive approximation Ah={ah} Al={al}"
        )));
    }
    if al > 13 {
        return Err(DecodeErrors::SosError(format!(
            "Invalid Al parameter {al}, range should be 0-13"
        )));
    }
    Ok(())
}

/// **B.2.4.4 Restart interval definition syntax**
pub(crate) fn parse_dri(decoder: &mut JpegDecoder) -> Result<(), DecodeErrors> {
    let length = decoder.stream.get_u16_be_err()?;

    if length != 4 {
        return Err(DecodeErrors::Format(format!(
            "Bad DRI length {length}, expected 4"
        )));
    }
    decoder.restart_interval = usize::from(decoder.stream.get_u16_be_err()?);

    info!("Restart interval {}", decoder.restart_interval);

    Ok(())
}

/// Parse the APP0 segment, looking for a JFIF header
pub(crate) fn parse_app0(decoder: &mut JpegDecoder) -> Result<(), DecodeErrors> {
    let mut length = segment_length(decoder, "Too small APP0 length")?;

    if length >= 12 && decoder.stream.peek_at(0, 5)? == b"JFIF\0" {
        decoder.stream.skip(5);
        let version = decoder.stream.get_u16_be_err()?;
        let units = decoder.stream.get_u8_err()?;
        let x_density = decoder.stream.get_u16_be_err()?;
        let y_density = decoder.stream.get_u16_be_err()?;

        info!("JFIF version {}.{:02}", version >> 8, version & 0xFF);

        decoder.info.jfif = Some(JfifDensity {
            units,
            x_density,
            y_density
        });
        length -= 12;
    }
    // thumbnails and JFXX extensions are not needed
    skip_payload(decoder, length)
}

/// Parse the APP1 segment
///
/// This contains the exif tag
pub(crate) fn parse_app1(decoder: &mut JpegDecoder) -> Result<(), DecodeErrors> {
    const XMP_NAMESPACE_PREFIX: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

    // contains exif data
    let mut length = segment_length(decoder, "Too small app1 length")?;

    if decoder.options.get_skip_metadata() {
        return skip_payload(decoder, length);
    }

    if length > 6 && decoder.stream.peek_at(0, 6)? == b"Exif\x00\x00" {
        trace!("Exif segment present");
        // skip bytes we read above
        decoder.stream.skip(6);
        length -= 6;

        decoder.exif_data = Some(decoder.stream.read_exact_bytes(length)?.to_vec());
        length = 0;
    } else if length > XMP_NAMESPACE_PREFIX.len()
        && decoder.stream.peek_at(0, XMP_NAMESPACE_PREFIX.len())? == XMP_NAMESPACE_PREFIX
    {
        trace!("XMP Data Present");
        decoder.stream.skip(XMP_NAMESPACE_PREFIX.len());
        length -= XMP_NAMESPACE_PREFIX.len();

        decoder.xmp_data = Some(decoder.stream.read_exact_bytes(length)?.to_vec());
        length = 0;
    } else {
        warn!("Unknown format for APP1 tag, skipping");
    }

    skip_payload(decoder, length)
}

/// Parse the APP2 segment, collecting ICC profile chunks
pub(crate) fn parse_app2(decoder: &mut JpegDecoder) -> Result<(), DecodeErrors> {
    let mut length = segment_length(decoder, "Too small app2 segment")?;

    if decoder.options.get_skip_metadata() {
        return skip_payload(decoder, length);
    }

    if length > 14 && decoder.stream.peek_at(0, 12)? == *b"ICC_PROFILE\0" {
        trace!("ICC Profile present");
        // skip 12 bytes which indicate ICC profile
        length -= 12;
        decoder.stream.skip(12);
        let seq_no = decoder.stream.get_u8();
        let num_markers = decoder.stream.get_u8();
        // deduct the two bytes we read above
        length -= 2;

        let data = decoder.stream.read_exact_bytes(length)?.to_vec();

        decoder.icc_data.push(ICCChunk {
            seq_no,
            num_markers,
            data
        });
        length = 0;
    }

    skip_payload(decoder, length)
}

/// Parse Adobe App14 segment
pub(crate) fn parse_app14(decoder: &mut JpegDecoder) -> Result<(), DecodeErrors> {
    // skip length
    let mut length = segment_length(decoder, "Too small APP14 length")?;

    if length >= 12 && decoder.stream.peek_at(0, 5)? == b"Adobe" {
        // move stream 5 bytes to remove adobe id
        decoder.stream.skip(5);
        // skip version, flags0 and flags1
        decoder.stream.skip(6);
        // get color transform
        let transform = decoder.stream.get_u8_err()?;

        // https://exiftool.org/TagNames/JPEG.html#Adobe
        info!("Adobe APP14 marker, color transform {transform}");

        decoder.info.adobe_transform = Some(transform);
        // adobe id = 5
        // version, flags0, flags1 = 6
        // transform = 1
        length -= 12;
    } else {
        warn!("Not a valid Adobe APP14 Segment, skipping");
    }
    // skip any proceeding lengths.
    // we do not need them
    skip_payload(decoder, length)
}

/// Parse a comment segment
pub(crate) fn parse_com(decoder: &mut JpegDecoder) -> Result<(), DecodeErrors> {
    let length = segment_length(decoder, "Too small COM segment")?;

    if decoder.options.get_skip_metadata() {
        return skip_payload(decoder, length);
    }
    let comment = decoder.stream.read_exact_bytes(length)?.to_vec();

    trace!("Comment of {length} bytes");
    decoder.comments.push(comment);

    Ok(())
}

/// Skip a segment we do not interpret
pub(crate) fn skip_marker(decoder: &mut JpegDecoder) -> Result<(), DecodeErrors> {
    let length = segment_length(decoder, "Invalid segment length")?;

    skip_payload(decoder, length)
}

fn skip_payload(decoder: &mut JpegDecoder, length: usize) -> Result<(), DecodeErrors> {
    if !decoder.stream.has(length) {
        return Err(DecodeErrors::FormatStatic("Segment extends past the end of the stream"));
    }
    decoder.stream.skip(length);

    Ok(())
}

/// Place zig-zag ordered quantization values in natural order
fn un_zig_zag(a: &[u16; 64]) -> [i32; 64] {
    let mut output = [0; 64];

    for (i, value) in a.iter().enumerate() {
        output[UN_ZIGZAG[i]] = i32::from(*value);
    }

    output
}
