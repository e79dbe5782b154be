//! Code tables shared by the decoder and the encoder.

use crate::vlc::{build_tree, Code, Entry};
use std::collections::HashMap;

/// What an AC variable-length code stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AcCode {
    /// A run of zero coefficients followed by a nonzero one.
    ///
    /// The sign of the level is the single bit that directly follows the code
    /// in the bitstream.
    Coefficient { run: u8, level: u8 },

    /// The current block has no further coefficients.
    EndOfBlock,

    /// An explicit 6-bit run and 10-bit signed level follow the code.
    Escape,
}

const fn ac(bits: u32, length: u32, run: u8, level: u8) -> Code<AcCode> {
    Code {
        bits,
        length,
        value: AcCode::Coefficient { run, level },
    }
}

const fn dc(bits: u32, length: u32, size: u8) -> Code<u8> {
    Code {
        bits,
        length,
        value: size,
    }
}

/// Bit pattern of the end-of-block code.
pub const END_OF_BLOCK_BITS: u32 = 0b10;
pub const END_OF_BLOCK_LENGTH: u32 = 2;

/// Bit pattern of the escape code.
pub const ESCAPE_BITS: u32 = 0b000001;
pub const ESCAPE_LENGTH: u32 = 6;

/// The 10 bits that end a version 3 frame early, in place of a Cr DC code.
pub const V3_END_OF_FRAME_BITS: u32 = 0b11_1111_1110;
pub const V3_END_OF_FRAME_LENGTH: u32 = 10;

/// The AC coefficient table, as inherited from MPEG-1 (ISO/IEC 11172-2
/// table B.14) minus its first-coefficient special case.
///
/// Lengths do not include the trailing sign bit.
pub const AC_CODES: [Code<AcCode>; 113] = [
    Code {
        bits: END_OF_BLOCK_BITS,
        length: END_OF_BLOCK_LENGTH,
        value: AcCode::EndOfBlock,
    },
    Code {
        bits: ESCAPE_BITS,
        length: ESCAPE_LENGTH,
        value: AcCode::Escape,
    },
    ac(0b11, 2, 0, 1),
    ac(0b011, 3, 1, 1),
    ac(0b0100, 4, 0, 2),
    ac(0b0101, 4, 2, 1),
    ac(0b00101, 5, 0, 3),
    ac(0b00111, 5, 3, 1),
    ac(0b00110, 5, 4, 1),
    ac(0b000110, 6, 1, 2),
    ac(0b000111, 6, 5, 1),
    ac(0b000101, 6, 6, 1),
    ac(0b000100, 6, 7, 1),
    ac(0b0000110, 7, 0, 4),
    ac(0b0000100, 7, 2, 2),
    ac(0b0000111, 7, 8, 1),
    ac(0b0000101, 7, 9, 1),
    ac(0b00100110, 8, 0, 5),
    ac(0b00100001, 8, 0, 6),
    ac(0b00100101, 8, 1, 3),
    ac(0b00100100, 8, 3, 2),
    ac(0b00100111, 8, 10, 1),
    ac(0b00100011, 8, 11, 1),
    ac(0b00100010, 8, 12, 1),
    ac(0b00100000, 8, 13, 1),
    ac(0b0000001010, 10, 0, 7),
    ac(0b0000001100, 10, 1, 4),
    ac(0b0000001011, 10, 2, 3),
    ac(0b0000001111, 10, 4, 2),
    ac(0b0000001001, 10, 5, 2),
    ac(0b0000001110, 10, 14, 1),
    ac(0b0000001101, 10, 15, 1),
    ac(0b0000001000, 10, 16, 1),
    ac(0b000000011101, 12, 0, 8),
    ac(0b000000011000, 12, 0, 9),
    ac(0b000000010011, 12, 0, 10),
    ac(0b000000010000, 12, 0, 11),
    ac(0b000000011011, 12, 1, 5),
    ac(0b000000010100, 12, 2, 4),
    ac(0b000000011100, 12, 3, 3),
    ac(0b000000010010, 12, 4, 3),
    ac(0b000000011110, 12, 6, 2),
    ac(0b000000010101, 12, 7, 2),
    ac(0b000000010001, 12, 8, 2),
    ac(0b000000011111, 12, 17, 1),
    ac(0b000000011010, 12, 18, 1),
    ac(0b000000011001, 12, 19, 1),
    ac(0b000000010111, 12, 20, 1),
    ac(0b000000010110, 12, 21, 1),
    ac(0b0000000011010, 13, 0, 12),
    ac(0b0000000011001, 13, 0, 13),
    ac(0b0000000011000, 13, 0, 14),
    ac(0b0000000010111, 13, 0, 15),
    ac(0b0000000010110, 13, 1, 6),
    ac(0b0000000010101, 13, 1, 7),
    ac(0b0000000010100, 13, 2, 5),
    ac(0b0000000010011, 13, 3, 4),
    ac(0b0000000010010, 13, 5, 3),
    ac(0b0000000010001, 13, 9, 2),
    ac(0b0000000010000, 13, 10, 2),
    ac(0b0000000011111, 13, 22, 1),
    ac(0b0000000011110, 13, 23, 1),
    ac(0b0000000011101, 13, 24, 1),
    ac(0b0000000011100, 13, 25, 1),
    ac(0b0000000011011, 13, 26, 1),
    ac(0b00000000011111, 14, 0, 16),
    ac(0b00000000011110, 14, 0, 17),
    ac(0b00000000011101, 14, 0, 18),
    ac(0b00000000011100, 14, 0, 19),
    ac(0b00000000011011, 14, 0, 20),
    ac(0b00000000011010, 14, 0, 21),
    ac(0b00000000011001, 14, 0, 22),
    ac(0b00000000011000, 14, 0, 23),
    ac(0b00000000010111, 14, 0, 24),
    ac(0b00000000010110, 14, 0, 25),
    ac(0b00000000010101, 14, 0, 26),
    ac(0b00000000010100, 14, 0, 27),
    ac(0b00000000010011, 14, 0, 28),
    ac(0b00000000010010, 14, 0, 29),
    ac(0b00000000010001, 14, 0, 30),
    ac(0b00000000010000, 14, 0, 31),
    ac(0b000000000011000, 15, 0, 32),
    ac(0b000000000010111, 15, 0, 33),
    ac(0b000000000010110, 15, 0, 34),
    ac(0b000000000010101, 15, 0, 35),
    ac(0b000000000010100, 15, 0, 36),
    ac(0b000000000010011, 15, 0, 37),
    ac(0b000000000010010, 15, 0, 38),
    ac(0b000000000010001, 15, 0, 39),
    ac(0b000000000010000, 15, 0, 40),
    ac(0b000000000011111, 15, 1, 8),
    ac(0b000000000011110, 15, 1, 9),
    ac(0b000000000011101, 15, 1, 10),
    ac(0b000000000011100, 15, 1, 11),
    ac(0b000000000011011, 15, 1, 12),
    ac(0b000000000011010, 15, 1, 13),
    ac(0b000000000011001, 15, 1, 14),
    ac(0b0000000000010011, 16, 1, 15),
    ac(0b0000000000010010, 16, 1, 16),
    ac(0b0000000000010001, 16, 1, 17),
    ac(0b0000000000010000, 16, 1, 18),
    ac(0b0000000000010100, 16, 6, 3),
    ac(0b0000000000011010, 16, 11, 2),
    ac(0b0000000000011001, 16, 12, 2),
    ac(0b0000000000011000, 16, 13, 2),
    ac(0b0000000000010111, 16, 14, 2),
    ac(0b0000000000010110, 16, 15, 2),
    ac(0b0000000000010101, 16, 16, 2),
    ac(0b0000000000011111, 16, 27, 1),
    ac(0b0000000000011110, 16, 28, 1),
    ac(0b0000000000011101, 16, 29, 1),
    ac(0b0000000000011100, 16, 30, 1),
    ac(0b0000000000011011, 16, 31, 1),
];

/// Size categories of version 3 luma DC differentials.
pub const LUMA_DC_SIZE_CODES: [Code<u8>; 9] = [
    dc(0b100, 3, 0),
    dc(0b00, 2, 1),
    dc(0b01, 2, 2),
    dc(0b101, 3, 3),
    dc(0b110, 3, 4),
    dc(0b1110, 4, 5),
    dc(0b11110, 5, 6),
    dc(0b111110, 6, 7),
    dc(0b1111110, 7, 8),
];

/// Size categories of version 3 chroma DC differentials.
pub const CHROMA_DC_SIZE_CODES: [Code<u8>; 9] = [
    dc(0b00, 2, 0),
    dc(0b01, 2, 1),
    dc(0b10, 2, 2),
    dc(0b110, 3, 3),
    dc(0b1110, 4, 4),
    dc(0b11110, 5, 5),
    dc(0b111110, 6, 6),
    dc(0b1111110, 7, 7),
    dc(0b11111110, 8, 8),
];

lazy_static! {
    pub static ref AC_TREE: Vec<Entry<Option<AcCode>>> =
        build_tree(&AC_CODES).expect("AC table should be prefix-free");
    pub static ref LUMA_DC_TREE: Vec<Entry<Option<u8>>> =
        build_tree(&LUMA_DC_SIZE_CODES).expect("luma DC table should be prefix-free");
    pub static ref CHROMA_DC_TREE: Vec<Entry<Option<u8>>> =
        build_tree(&CHROMA_DC_SIZE_CODES).expect("chroma DC table should be prefix-free");

    /// Maps `(run, |level|)` to the `(bits, length)` of its table code.
    pub static ref AC_ENCODINGS: HashMap<(u8, u8), (u32, u32)> = AC_CODES
        .iter()
        .filter_map(|code| match code.value {
            AcCode::Coefficient { run, level } => Some(((run, level), (code.bits, code.length))),
            _ => None,
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use crate::tables::{
        AcCode, AC_CODES, AC_ENCODINGS, AC_TREE, CHROMA_DC_TREE, LUMA_DC_SIZE_CODES,
        LUMA_DC_TREE,
    };
    use crate::vlc::Entry;

    #[test]
    fn tables_are_prefix_free() {
        // Building the trees fails on any prefix collision.
        assert!(!AC_TREE.is_empty());
        assert!(!LUMA_DC_TREE.is_empty());
        assert!(!CHROMA_DC_TREE.is_empty());
    }

    #[test]
    fn ac_table_shape() {
        assert_eq!(111, AC_ENCODINGS.len());

        let longest = AC_CODES.iter().map(|c| c.length).max().unwrap();
        assert_eq!(16, longest);

        let escapes = AC_CODES
            .iter()
            .filter(|c| c.value == AcCode::Escape)
            .count();
        assert_eq!(1, escapes);
    }

    #[test]
    fn dc_tables_cover_every_size() {
        for size in 0..=8 {
            assert!(LUMA_DC_SIZE_CODES.iter().any(|c| c.value == size));
        }

        let leaves = CHROMA_DC_TREE
            .iter()
            .filter(|e| matches!(e, Entry::End(Some(_))))
            .count();
        assert_eq!(9, leaves);
    }
}
