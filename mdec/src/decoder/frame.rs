//! Frame decoding state machine

use crate::decoder::header::{BitstreamVersion, DcCoding, FrameHeader, IKI_HEADER_SIZE};
use crate::decoder::types::DecoderOption;
use crate::error::{Error, Result};
use crate::lzss;
use crate::reader::{BitOrder, BitReader};
use crate::tables::{
    AcCode, AC_TREE, CHROMA_DC_TREE, LUMA_DC_TREE, V3_END_OF_FRAME_BITS, V3_END_OF_FRAME_LENGTH,
};
use crate::types::{macroblock_count, BlockKind, MdecCode};
use log::{debug, warn};

/// Where the decoder is within the current block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BlockState {
    /// The next code is the block's qscale/DC code.
    StartOfBlock,

    /// The next code is an AC coefficient or the end of the block.
    MidBlock,
}

/// Read one AC code: a table coefficient, an escape, or end-of-block.
pub(crate) fn read_ac_code(reader: &mut BitReader<'_>) -> Result<MdecCode> {
    reader.with_transaction(|reader| {
        match reader.read_vlc(&AC_TREE[..])?.ok_or(Error::InvalidVlc)? {
            AcCode::EndOfBlock => Ok(MdecCode::END_OF_BLOCK),
            AcCode::Escape => {
                let run: u8 = reader.read_bits(6)?;
                let level: i16 = reader.read_signed_bits(10)?;
                let code = MdecCode::new(run, level);

                // Run 63 never fits after a DC code, and this one would also
                // pass for the end-of-block word.
                if code.is_end_of_block() {
                    return Err(Error::BlockOverflow);
                }

                Ok(code)
            }
            AcCode::Coefficient { run, level } => {
                let sign: u8 = reader.read_bits(1)?;
                let level = i16::from(level);

                Ok(MdecCode::new(run, if sign == 0 { level } else { -level }))
            }
        }
    })
}

/// Read a version 3 DC differential for the given block.
///
/// The returned value has already been scaled to DC units.
fn read_dc_differential(reader: &mut BitReader<'_>, block: BlockKind) -> Result<i16> {
    reader.with_transaction(|reader| {
        let tree = if block.is_luma() {
            &LUMA_DC_TREE[..]
        } else {
            &CHROMA_DC_TREE[..]
        };
        let size = reader.read_vlc(tree)?.ok_or(Error::InvalidVlc)?;

        if size == 0 {
            return Ok(0);
        }

        let bits: i16 = reader.read_bits(u32::from(size))?;
        let differential = if bits < 1i16 << (size - 1) {
            bits - ((1i16 << size) - 1)
        } else {
            bits
        };

        Ok(differential * 4)
    })
}

/// Inflate the Iki side table into one qscale/DC code per block.
fn inflate_side_table(buffer: &[u8], header: &FrameHeader, blocks: usize) -> Result<Vec<MdecCode>> {
    let iki = header.iki.ok_or(Error::InternalDecoderError)?;
    let table_end = IKI_HEADER_SIZE + usize::from(iki.side_table_size);
    let compressed = buffer
        .get(IKI_HEADER_SIZE..table_end)
        .ok_or(Error::EndOfData)?;

    let table = lzss::decompress(compressed, blocks * 2)?;
    let (high, low) = table.split_at(blocks);

    Ok(high
        .iter()
        .zip(low.iter())
        .map(|(&high, &low)| MdecCode::from_word(u16::from(high) << 8 | u16::from(low)))
        .collect())
}

/// Decodes one frame buffer into a lazy sequence of MDEC codes.
///
/// Codes come out block by block: a qscale/DC code, any number of AC codes,
/// then `MdecCode::END_OF_BLOCK`. Blocks come in groups of six per
/// macroblock, ordered as in `BlockKind::ORDER`.
///
/// Decoding stops after the last macroblock of the frame, or earlier if a
/// version 3 frame carries its end-of-frame marker. The first error is
/// yielded once, after which the iterator is exhausted; errors never affect
/// any other frame.
pub struct FrameDecoder<'a> {
    header: FrameHeader,
    options: DecoderOption,
    reader: BitReader<'a>,
    state: BlockState,

    /// Index of the macroblock being decoded.
    macroblock: usize,

    /// Total macroblocks in the frame.
    macroblocks: usize,

    /// Index of the block within the current macroblock.
    block: usize,

    /// Coefficient positions already used in the current block.
    position: usize,

    /// Running DC values for Cr, Cb and Y, used by version 3.
    predictors: [i16; 3],

    /// Pre-expanded qscale/DC codes, used by Iki.
    side_table: Vec<MdecCode>,

    codes_emitted: usize,
    finished: bool,
}

impl<'a> FrameDecoder<'a> {
    /// Prepare to decode a frame of the given dimensions.
    pub fn new(buffer: &'a [u8], width: u16, height: u16) -> Result<Self> {
        Self::with_options(buffer, width, height, DecoderOption::empty())
    }

    /// Prepare to decode a frame with a particular set of options.
    ///
    /// The header is parsed (and, for Iki frames, the side table inflated)
    /// right away, so a frame that is not an MDEC bitstream at all is
    /// rejected here.
    pub fn with_options(
        buffer: &'a [u8],
        width: u16,
        height: u16,
        options: DecoderOption,
    ) -> Result<Self> {
        let macroblocks = macroblock_count(width, height);
        if macroblocks == 0 {
            return Err(Error::InvalidHeader);
        }

        let header = FrameHeader::parse(buffer, width, height)?;
        let side_table = if header.version.dc_coding() == DcCoding::SideTable {
            inflate_side_table(buffer, &header, macroblocks * 6)?
        } else {
            Vec::new()
        };

        let reader = BitReader::with_offset(
            buffer,
            header.bitstream_offset * 8,
            BitOrder::LittleEndian16,
        );

        Ok(Self {
            header,
            options,
            reader,
            state: BlockState::StartOfBlock,
            macroblock: 0,
            macroblocks,
            block: 0,
            position: 0,
            predictors: [0; 3],
            side_table,
            codes_emitted: 0,
            finished: false,
        })
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// The macroblock the next code belongs to.
    pub fn macroblock_index(&self) -> usize {
        self.macroblock
    }

    /// The block the next code belongs to.
    pub fn block_kind(&self) -> Option<BlockKind> {
        BlockKind::from_index(self.block)
    }

    pub fn codes_emitted(&self) -> usize {
        self.codes_emitted
    }

    /// Check for the version 3 end-of-frame marker without consuming it.
    fn at_end_of_frame_marker(&self) -> bool {
        self.reader
            .peek_bits::<u32>(V3_END_OF_FRAME_LENGTH)
            .map_or(false, |bits| bits == V3_END_OF_FRAME_BITS)
    }

    fn end_of_frame(&mut self) -> Result<Option<MdecCode>> {
        if self.options.contains(DecoderOption::STRICT_CODE_COUNT) {
            let expected = usize::from(self.header.half_code_count);
            let actual = (self.codes_emitted + 1) / 2;

            if expected != actual {
                return Err(Error::CodeCountMismatch { expected, actual });
            }
        }

        debug!(
            "Decoded {} codes in {} macroblocks",
            self.codes_emitted, self.macroblock
        );

        Ok(None)
    }

    fn read_dc(&mut self) -> Result<MdecCode> {
        let block = BlockKind::from_index(self.block).ok_or(Error::InternalDecoderError)?;

        match self.header.version.dc_coding() {
            DcCoding::Fixed10 => {
                let dc: i16 = self.reader.read_signed_bits(10)?;

                Ok(MdecCode::new(self.header.quant_scale as u8, dc))
            }
            DcCoding::Differential => {
                let differential = read_dc_differential(&mut self.reader, block)?;
                let channel = block.dc_channel();
                let dc = self.predictors[channel] + differential;

                if !(-512..=511).contains(&dc) {
                    return Err(Error::ValueOutOfRange(i32::from(dc)));
                }

                self.predictors[channel] = dc;

                Ok(MdecCode::new(self.header.quant_scale as u8, dc))
            }
            DcCoding::SideTable => self
                .side_table
                .get(self.macroblock * 6 + self.block)
                .copied()
                .ok_or(Error::InvalidSideTable),
        }
    }

    /// Produce the next code, or `None` once the frame is complete.
    fn next_code(&mut self) -> Result<Option<MdecCode>> {
        match self.state {
            BlockState::StartOfBlock => {
                if self.macroblock >= self.macroblocks {
                    return self.end_of_frame();
                }

                if self.block == 0
                    && self.header.version == BitstreamVersion::V3
                    && self.at_end_of_frame_marker()
                {
                    return self.end_of_frame();
                }

                let code = self.read_dc()?;
                self.position = 1;
                self.state = BlockState::MidBlock;

                Ok(Some(code))
            }
            BlockState::MidBlock => {
                let code = read_ac_code(&mut self.reader)?;

                if code.is_end_of_block() {
                    self.state = BlockState::StartOfBlock;
                    self.block += 1;
                    if self.block == 6 {
                        self.block = 0;
                        self.macroblock += 1;
                    }
                } else {
                    let next_position = self.position + usize::from(code.run) + 1;
                    if next_position > 64 {
                        return Err(Error::BlockOverflow);
                    }

                    self.position = next_position;
                }

                Ok(Some(code))
            }
        }
    }
}

impl<'a> Iterator for FrameDecoder<'a> {
    type Item = Result<MdecCode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_code() {
            Ok(Some(code)) => {
                self.codes_emitted += 1;
                Some(Ok(code))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                warn!(
                    "Frame decode failed at macroblock {} block {}: {}",
                    self.macroblock, self.block, e
                );
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Decode an entire frame at once.
pub fn decode_frame(buffer: &[u8], width: u16, height: u16) -> Result<Vec<MdecCode>> {
    FrameDecoder::new(buffer, width, height)?.collect()
}

#[cfg(test)]
mod tests {
    use crate::decoder::frame::{decode_frame, read_ac_code, FrameDecoder};
    use crate::decoder::types::DecoderOption;
    use crate::error::Error;
    use crate::reader::{BitOrder, BitReader};
    use crate::types::{BlockKind, MdecCode};
    use crate::writer::BitWriter;

    /// Assemble a frame from a header and a closure writing its bitstream.
    fn frame(header: [u16; 4], body: impl FnOnce(&mut BitWriter)) -> Vec<u8> {
        let mut bytes: Vec<u8> = header.iter().flat_map(|h| h.to_le_bytes().to_vec()).collect();
        let mut writer = BitWriter::new(BitOrder::LittleEndian16);
        body(&mut writer);
        bytes.extend(writer.into_bytes());

        bytes
    }

    /// Write a block holding only a flat DC value.
    fn flat_block(writer: &mut BitWriter, dc: i32) {
        writer.write_signed_bits(dc, 10);
        writer.write_bits(0b10, 2);
    }

    #[test]
    fn v2_dc_carries_qscale() {
        let data = frame([0, 0x3800, 1, 2], |w| {
            flat_block(w, -5);
            for _ in 0..5 {
                flat_block(w, 0);
            }
        });

        let codes = decode_frame(&data, 16, 16).unwrap();
        assert_eq!(12, codes.len());
        assert_eq!(MdecCode::new(1, -5), codes[0]);
        assert!(codes[1].is_end_of_block());
        assert_eq!(MdecCode::new(1, 0), codes[2]);
    }

    #[test]
    fn ac_codes_and_signs() {
        let data = frame([0, 0x3800, 7, 2], |w| {
            w.write_signed_bits(100, 10);
            w.write_bits(0b11, 2); // (0, 1)
            w.write_bits(1, 1); // negative
            w.write_bits(0b0101, 4); // (2, 1)
            w.write_bits(0, 1);
            w.write_bits(0b000001, 6); // escape
            w.write_bits(5, 6);
            w.write_signed_bits(-300, 10);
            w.write_bits(0b10, 2);
            for _ in 0..5 {
                flat_block(w, 0);
            }
        });

        let codes = decode_frame(&data, 16, 16).unwrap();
        assert_eq!(
            vec![
                MdecCode::new(7, 100),
                MdecCode::new(0, -1),
                MdecCode::new(2, 1),
                MdecCode::new(5, -300),
                MdecCode::END_OF_BLOCK,
            ],
            codes[..5].to_vec()
        );
    }

    #[test]
    fn tracks_block_position() {
        let data = frame([0, 0x3800, 1, 1], |w| {
            for _ in 0..12 {
                flat_block(w, 3);
            }
        });

        let mut decoder = FrameDecoder::new(&data, 32, 16).unwrap();
        assert_eq!(Some(BlockKind::Cr), decoder.block_kind());

        for _ in 0..6 {
            decoder.next().unwrap().unwrap();
        }
        assert_eq!(Some(BlockKind::Y1), decoder.block_kind());

        for _ in 0..6 {
            decoder.next().unwrap().unwrap();
        }
        assert_eq!(1, decoder.macroblock_index());
        assert_eq!(Some(BlockKind::Cr), decoder.block_kind());

        assert_eq!(12, decoder.by_ref().count());
        assert_eq!(24, decoder.codes_emitted());
    }

    #[test]
    fn invalid_vlc_is_fatal_for_frame() {
        let data = frame([0, 0x3800, 1, 2], |w| {
            w.write_signed_bits(0, 10);
            w.write_bits(0, 16); // twelve or more zeroes is never a code
        });

        let mut decoder = FrameDecoder::new(&data, 16, 16).unwrap();
        assert_eq!(MdecCode::new(1, 0), decoder.next().unwrap().unwrap());
        assert_eq!(Error::InvalidVlc, decoder.next().unwrap().unwrap_err());
        assert!(decoder.next().is_none());
    }

    #[test]
    fn block_overflow() {
        let data = frame([0, 0x3800, 1, 2], |w| {
            w.write_signed_bits(0, 10);
            w.write_bits(0b000001, 6);
            w.write_bits(62, 6); // fills the last position
            w.write_signed_bits(9, 10);
            w.write_bits(0b11, 2);
            w.write_bits(0, 1);
        });

        let result = decode_frame(&data, 16, 16);
        assert_eq!(Error::BlockOverflow, result.unwrap_err());
    }

    #[test]
    fn escaped_end_of_block_word() {
        let data = frame([0, 0x3800, 1, 2], |w| {
            w.write_signed_bits(0, 10);
            w.write_bits(0b000001, 6);
            w.write_bits(63, 6);
            w.write_signed_bits(-512, 10);
            for _ in 0..5 {
                flat_block(w, 0);
            }
        });

        let mut decoder = FrameDecoder::new(&data, 16, 16).unwrap();
        assert_eq!(MdecCode::new(1, 0), decoder.next().unwrap().unwrap());
        assert_eq!(Error::BlockOverflow, decoder.next().unwrap().unwrap_err());
        assert!(decoder.next().is_none());

        assert_eq!(Error::BlockOverflow, decode_frame(&data, 16, 16).unwrap_err());
    }

    #[test]
    fn starvation_mid_block() {
        let data = frame([0, 0x3800, 1, 2], |w| {
            flat_block(w, 1);
            w.write_signed_bits(2, 10);
            w.write_bits(0b000001, 6); // escape, cut off by the end of the frame
        });

        assert_eq!(Error::EndOfData, decode_frame(&data, 16, 16).unwrap_err());
    }

    #[test]
    fn v3_predictors_accumulate() {
        let data = frame([0, 0x3800, 2, 3], |w| {
            for cr_bits in [None, Some((0b10, 2, 0b10))].iter() {
                // Cr: size 0, then size 2 with +2 (scaled to +8).
                match cr_bits {
                    None => w.write_bits(0b00, 2),
                    Some((code, len, bits)) => {
                        w.write_bits(*code, *len);
                        w.write_bits(*bits, 2);
                    }
                }
                w.write_bits(0b10, 2);

                // Cb: zero differential.
                w.write_bits(0b00, 2);
                w.write_bits(0b10, 2);

                // Y0-Y3: zero differential.
                for _ in 0..4 {
                    w.write_bits(0b100, 3);
                    w.write_bits(0b10, 2);
                }
            }
        });

        let codes = decode_frame(&data, 32, 16).unwrap();
        assert_eq!(24, codes.len());
        assert_eq!(MdecCode::new(2, 0), codes[0]);
        assert_eq!(MdecCode::new(2, 8), codes[12]);
        assert_eq!(MdecCode::new(2, 0), codes[14]);
    }

    #[test]
    fn v3_negative_differential_and_reset() {
        // Luma size 1 with bit 0 means -1, scaled to -4.
        let data = frame([0, 0x3800, 1, 3], |w| {
            w.write_bits(0b00, 2);
            w.write_bits(0b10, 2);
            w.write_bits(0b00, 2);
            w.write_bits(0b10, 2);
            for _ in 0..4 {
                w.write_bits(0b00, 2);
                w.write_bits(0, 1);
                w.write_bits(0b10, 2);
            }
        });

        let codes = decode_frame(&data, 16, 16).unwrap();
        let luma: Vec<i16> = codes[4..].iter().step_by(2).map(|c| c.level).collect();
        assert_eq!(vec![-4, -8, -12, -16], luma);

        // Each frame starts its predictors over.
        let again = decode_frame(&data, 16, 16).unwrap();
        assert_eq!(codes, again);
    }

    #[test]
    fn v3_end_of_frame_marker() {
        let data = frame([0, 0x3800, 1, 3], |w| {
            w.write_bits(0b00, 2);
            w.write_bits(0b10, 2);
            w.write_bits(0b00, 2);
            w.write_bits(0b10, 2);
            for _ in 0..4 {
                w.write_bits(0b100, 3);
                w.write_bits(0b10, 2);
            }
            w.write_bits(0b11_1111_1110, 10);
        });

        // Four macroblocks fit, but the marker ends the frame after one.
        let codes = decode_frame(&data, 32, 32).unwrap();
        assert_eq!(12, codes.len());
    }

    #[test]
    fn strict_code_count() {
        let data = frame([5, 0x3800, 1, 2], |w| {
            for _ in 0..6 {
                flat_block(w, 0);
            }
        });

        let lenient: Vec<_> = FrameDecoder::new(&data, 16, 16).unwrap().collect();
        assert!(lenient.iter().all(|c| c.is_ok()));

        let strict: Result<Vec<_>, _> =
            FrameDecoder::with_options(&data, 16, 16, DecoderOption::STRICT_CODE_COUNT)
                .unwrap()
                .collect();
        assert_eq!(
            Error::CodeCountMismatch {
                expected: 5,
                actual: 6
            },
            strict.unwrap_err()
        );
    }

    #[test]
    fn reads_every_table_entry() {
        for code in crate::tables::AC_CODES.iter() {
            let mut writer = BitWriter::new(BitOrder::LittleEndian16);
            writer.write_bits(code.bits, code.length);
            writer.write_bits(1, 1);
            writer.write_bits(0, 32);
            let bytes = writer.into_bytes();

            let mut reader = BitReader::new(&bytes, BitOrder::LittleEndian16);
            let decoded = read_ac_code(&mut reader).unwrap();

            match code.value {
                crate::tables::AcCode::Coefficient { run, level } => {
                    assert_eq!(MdecCode::new(run, -i16::from(level)), decoded);
                    assert_eq!(code.length as usize + 1, reader.position());
                }
                crate::tables::AcCode::EndOfBlock => assert!(decoded.is_end_of_block()),
                crate::tables::AcCode::Escape => {
                    assert_eq!(MdecCode::new(32, 0), decoded);
                    assert_eq!(22, reader.position());
                }
            }
        }
    }
}
