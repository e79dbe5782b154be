//! Decoded bitstream types

use std::fmt;

/// One entry of a block's coefficient sequence, as the MDEC consumes it.
///
/// For the first code of a block, `run` carries the quantization scale and
/// `level` the DC coefficient. For the remaining codes, `run` is the number of
/// zero coefficients to skip and `level` the next nonzero coefficient.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MdecCode {
    /// A 6-bit field: zero run length, or the block's quantization scale.
    pub run: u8,

    /// A signed 10-bit coefficient.
    pub level: i16,
}

impl MdecCode {
    /// The sentinel that terminates every block.
    ///
    /// Packed into an MDEC word this is `0xFE00`.
    pub const END_OF_BLOCK: MdecCode = MdecCode {
        run: 63,
        level: -512,
    };

    pub fn new(run: u8, level: i16) -> Self {
        Self { run, level }
    }

    pub fn is_end_of_block(self) -> bool {
        self == Self::END_OF_BLOCK
    }

    /// Whether both fields fit their 6 and 10 bit slots.
    pub fn is_representable(self) -> bool {
        self.run <= 63 && (-512..=511).contains(&self.level)
    }

    /// Pack this code into the 16-bit word the MDEC hardware reads.
    pub fn to_word(self) -> u16 {
        (u16::from(self.run & 0x3F) << 10) | (self.level as u16 & 0x3FF)
    }

    /// Unpack a 16-bit MDEC word, sign-extending the level.
    pub fn from_word(word: u16) -> Self {
        Self {
            run: (word >> 10) as u8,
            level: ((word << 6) as i16) >> 6,
        }
    }
}

impl fmt::Display for MdecCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end_of_block() {
            write!(f, "EOB")
        } else {
            write!(f, "({}, {})", self.run, self.level)
        }
    }
}

/// The six blocks of a macroblock, in bitstream order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Cr,
    Cb,
    Y0,
    Y1,
    Y2,
    Y3,
}

impl BlockKind {
    pub const ORDER: [BlockKind; 6] = [
        BlockKind::Cr,
        BlockKind::Cb,
        BlockKind::Y0,
        BlockKind::Y1,
        BlockKind::Y2,
        BlockKind::Y3,
    ];

    /// The kind of the `index`th block within a macroblock.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ORDER.get(index).copied()
    }

    pub fn is_luma(self) -> bool {
        !matches!(self, BlockKind::Cr | BlockKind::Cb)
    }

    /// Index of the DC predictor this block shares with its channel.
    ///
    /// Cr and Cb each have their own; all four luma blocks share one.
    pub fn dc_channel(self) -> usize {
        match self {
            BlockKind::Cr => 0,
            BlockKind::Cb => 1,
            _ => 2,
        }
    }
}

/// Number of 16x16 macroblocks needed to cover a frame.
pub fn macroblock_count(width: u16, height: u16) -> usize {
    let across = (usize::from(width) + 15) / 16;
    let down = (usize::from(height) + 15) / 16;

    across * down
}

#[cfg(test)]
mod tests {
    use crate::types::{macroblock_count, BlockKind, MdecCode};

    #[test]
    fn end_of_block_word() {
        assert_eq!(0xFE00, MdecCode::END_OF_BLOCK.to_word());
        assert!(MdecCode::from_word(0xFE00).is_end_of_block());
        assert_eq!("EOB", MdecCode::END_OF_BLOCK.to_string());
    }

    #[test]
    fn word_packing() {
        let code = MdecCode::new(1, -5);
        assert_eq!(0x07FB, code.to_word());
        assert_eq!(code, MdecCode::from_word(0x07FB));
        assert_eq!("(1, -5)", code.to_string());

        assert_eq!(MdecCode::new(63, 511), MdecCode::from_word(0xFDFF));
        assert!(!MdecCode::new(0, 512).is_representable());
    }

    #[test]
    fn block_order() {
        assert_eq!(Some(BlockKind::Cr), BlockKind::from_index(0));
        assert_eq!(Some(BlockKind::Y3), BlockKind::from_index(5));
        assert_eq!(None, BlockKind::from_index(6));
        assert_eq!(1, BlockKind::Cb.dc_channel());
        assert_eq!(2, BlockKind::Y2.dc_channel());
        assert!(!BlockKind::Cb.is_luma());
    }

    #[test]
    fn macroblocks_round_up() {
        assert_eq!(20 * 14, macroblock_count(320, 224));
        assert_eq!(2, macroblock_count(17, 16));
        assert_eq!(0, macroblock_count(0, 16));
    }
}
