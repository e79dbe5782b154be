//! The AKAO block that precedes SPU-ADPCM audio in Square movie sectors.

use crate::sector::Sector;

/// Size of an AKAO block, present or not.
pub const AKAO_SIZE: usize = 36;

const AKAO_MAGIC: &[u8; 4] = b"AKAO";

/// What an audio sector's AKAO block says about its payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Akao {
    /// The block is all zeroes: the sector carries no audio.
    Absent,

    /// The block is present and describes `payload_size` bytes of ADPCM.
    Present { payload_size: u32 },
}

impl Akao {
    /// Read the AKAO block at `offset`.
    ///
    /// Yields `None` if the block runs off the sector or carries anything
    /// other than the AKAO magic or all zeroes.
    pub fn read(sector: &Sector<'_>, offset: usize) -> Option<Self> {
        let block = sector.payload(offset..offset + AKAO_SIZE)?;

        if block.iter().all(|&byte| byte == 0) {
            return Some(Akao::Absent);
        }

        if &block[..4] != AKAO_MAGIC {
            return None;
        }

        Some(Akao::Present {
            payload_size: sector.u32_at(offset + 4)?,
        })
    }

    /// The number of ADPCM payload bytes that follow the block.
    pub fn payload_size(self) -> u32 {
        match self {
            Akao::Absent => 0,
            Akao::Present { payload_size } => payload_size,
        }
    }
}
