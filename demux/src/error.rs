//! Error types

use thiserror::Error;

/// Ways a sector can fail to be read.
///
/// Sectors that are well-formed but match no known movie layout are not
/// errors; they classify as `SectorRecord::Unknown` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("sector is {0} bytes long, expected 2048 or 2352")]
    InvalidSectorSize(usize),

    #[error("raw sector does not start with a sync pattern")]
    MissingSync,

    #[error("unsupported sector mode {0}")]
    UnsupportedMode(u8),

    #[error("frame bitstream is corrupt: {0}")]
    Bitstream(#[from] psxmdec_rs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
