//! MDEC bitstream encoder
//!
//! Turns a sequence of `MdecCode`s back into a frame buffer that
//! `FrameDecoder` reproduces exactly.

use crate::decoder::{BitstreamVersion, DcCoding, HEADER_SIZE, IKI_HEADER_SIZE, TAG_3800};
use crate::error::{Error, Result};
use crate::lzss;
use crate::reader::BitOrder;
use crate::tables::{
    AC_ENCODINGS, CHROMA_DC_SIZE_CODES, END_OF_BLOCK_BITS, END_OF_BLOCK_LENGTH, ESCAPE_BITS,
    ESCAPE_LENGTH, LUMA_DC_SIZE_CODES, V3_END_OF_FRAME_BITS, V3_END_OF_FRAME_LENGTH,
};
use crate::types::{macroblock_count, BlockKind, MdecCode};
use crate::writer::BitWriter;
use log::debug;

/// Write one AC code, preferring the table over the escape.
pub(crate) fn write_ac_code(writer: &mut BitWriter, code: MdecCode) -> Result<()> {
    if code.is_end_of_block() {
        writer.write_bits(END_OF_BLOCK_BITS, END_OF_BLOCK_LENGTH);
        return Ok(());
    }

    if !code.is_representable() {
        return Err(Error::ValueOutOfRange(i32::from(code.level)));
    }

    let magnitude = i32::from(code.level).abs();
    if magnitude > 0 && magnitude <= i32::from(u8::MAX) {
        if let Some(&(bits, length)) = AC_ENCODINGS.get(&(code.run, magnitude as u8)) {
            writer.write_bits(bits, length);
            writer.write_bits(if code.level < 0 { 1 } else { 0 }, 1);
            return Ok(());
        }
    }

    writer.write_bits(ESCAPE_BITS, ESCAPE_LENGTH);
    writer.write_bits(u32::from(code.run), 6);
    writer.write_signed_bits(i32::from(code.level), 10);

    Ok(())
}

/// Write a version 3 DC differential, already divided down from DC units.
fn write_dc_differential(writer: &mut BitWriter, block: BlockKind, differential: i32) -> Result<()> {
    let size = 32 - differential.abs().leading_zeros();
    let codes = if block.is_luma() {
        &LUMA_DC_SIZE_CODES
    } else {
        &CHROMA_DC_SIZE_CODES
    };
    let size_code = codes
        .iter()
        .find(|code| u32::from(code.value) == size)
        .ok_or(Error::ValueOutOfRange(differential))?;

    writer.write_bits(size_code.bits, size_code.length);
    if size > 0 {
        let bits = if differential < 0 {
            differential + (1 << size) - 1
        } else {
            differential
        };
        writer.write_bits(bits as u32, size);
    }

    Ok(())
}

/// Split a code sequence into blocks, dropping the terminators.
fn split_blocks(codes: &[MdecCode]) -> Result<Vec<&[MdecCode]>> {
    let mut blocks = Vec::new();
    let mut rest = codes;

    while !rest.is_empty() {
        // The first code of a block is never a terminator, whatever it holds.
        let end = rest[1..]
            .iter()
            .position(|code| code.is_end_of_block())
            .ok_or(Error::Unencodable("final block is not terminated"))?
            + 1;

        let block = &rest[..end];
        let mut position = 1;
        for code in &block[1..] {
            position += usize::from(code.run) + 1;
            if position > 64 {
                return Err(Error::BlockOverflow);
            }
        }

        blocks.push(block);
        rest = &rest[end + 1..];
    }

    Ok(blocks)
}

/// Encode a frame's worth of codes as a frame buffer.
///
/// The codes must describe exactly six blocks for each macroblock of a
/// `width` by `height` frame, each block ending in `MdecCode::END_OF_BLOCK`.
/// Every version but Iki has a single quantization scale per frame, so all
/// blocks must then share the same qscale. Version 3 can only express DC
/// values that move in steps of four.
pub fn encode_frame(
    version: BitstreamVersion,
    width: u16,
    height: u16,
    codes: &[MdecCode],
) -> Result<Vec<u8>> {
    let macroblocks = macroblock_count(width, height);
    if macroblocks == 0 {
        return Err(Error::Unencodable("frame has no macroblocks"));
    }

    let blocks = split_blocks(codes)?;
    if blocks.len() != macroblocks * 6 {
        return Err(Error::Unencodable("block count does not match frame size"));
    }

    for block in blocks.iter() {
        if !block[0].is_representable() {
            return Err(Error::ValueOutOfRange(i32::from(block[0].level)));
        }
    }

    let half_code_count = (codes.len() + 1) / 2;
    if half_code_count > usize::from(u16::MAX) {
        return Err(Error::Unencodable("too many codes for the header count"));
    }

    let mut writer = BitWriter::new(BitOrder::LittleEndian16);
    let mut predictors = [0i32; 3];

    for (index, block) in blocks.iter().enumerate() {
        let kind = BlockKind::from_index(index % 6).ok_or(Error::InternalDecoderError)?;
        let dc = block[0];

        match version.dc_coding() {
            DcCoding::Fixed10 => writer.write_signed_bits(i32::from(dc.level), 10),
            DcCoding::Differential => {
                let channel = kind.dc_channel();
                let step = i32::from(dc.level) - predictors[channel];
                if step % 4 != 0 {
                    return Err(Error::Unencodable("DC change is not a multiple of four"));
                }

                write_dc_differential(&mut writer, kind, step / 4)?;
                predictors[channel] = i32::from(dc.level);
            }
            DcCoding::SideTable => {}
        }

        for &code in &block[1..] {
            write_ac_code(&mut writer, code)?;
        }
        write_ac_code(&mut writer, MdecCode::END_OF_BLOCK)?;
    }

    if version == BitstreamVersion::V3 {
        writer.write_bits(V3_END_OF_FRAME_BITS, V3_END_OF_FRAME_LENGTH);
    }

    let mut out = Vec::with_capacity(HEADER_SIZE + writer.bits_written() / 8 + 2);
    out.extend_from_slice(&(half_code_count as u16).to_le_bytes());
    out.extend_from_slice(&TAG_3800.to_le_bytes());

    match version.header_field() {
        Some(field) => {
            let quant_scale = blocks[0][0].run;
            if quant_scale == 0 || blocks.iter().any(|block| block[0].run != quant_scale) {
                return Err(Error::Unencodable(
                    "blocks do not share a single nonzero qscale",
                ));
            }

            out.extend_from_slice(&u16::from(quant_scale).to_le_bytes());
            out.extend_from_slice(&field.to_le_bytes());
        }
        None => {
            if (1..=63).contains(&width) && BitstreamVersion::from_header_field(height).is_some()
            {
                return Err(Error::Unencodable(
                    "Iki dimensions would read back as another version",
                ));
            }

            let words: Vec<u16> = blocks.iter().map(|block| block[0].to_word()).collect();
            let mut table: Vec<u8> = words.iter().map(|word| (word >> 8) as u8).collect();
            table.extend(words.iter().map(|word| (word & 0xFF) as u8));

            let compressed = lzss::compress(&table);
            if compressed.len() > usize::from(u16::MAX) {
                return Err(Error::Unencodable("side table is too large"));
            }

            out.extend_from_slice(&width.to_le_bytes());
            out.extend_from_slice(&height.to_le_bytes());
            out.extend_from_slice(&(compressed.len() as u16).to_le_bytes());
            debug_assert_eq!(IKI_HEADER_SIZE, out.len());

            out.extend(compressed);
            if out.len() % 2 != 0 {
                out.push(0);
            }
        }
    }

    let bitstream = writer.into_bytes();
    debug!(
        "Encoded {} blocks as {} header and {} bitstream bytes",
        blocks.len(),
        out.len(),
        bitstream.len()
    );
    out.extend(bitstream);

    Ok(out)
}
