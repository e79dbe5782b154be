//! Error types

use thiserror::Error;

/// Everything that can go wrong while reading or writing a frame bitstream.
///
/// None of these are fatal to anything but the frame being processed: a
/// caller that hits one is expected to drop the frame and carry on with the
/// next one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("ran out of bitstream data")]
    EndOfData,

    #[error("frame does not start with an MDEC bitstream header")]
    InvalidHeader,

    #[error("unsupported bitstream version {0}")]
    UnsupportedVersion(u16),

    #[error("bit pattern does not match any variable-length code")]
    InvalidVlc,

    #[error("block has more than 64 coefficients")]
    BlockOverflow,

    #[error("value {0} does not fit the bitstream field it belongs in")]
    ValueOutOfRange(i32),

    #[error("the qscale/DC side table is corrupt")]
    InvalidSideTable,

    #[error("variable-length code table is not prefix-free")]
    InvalidTable,

    #[error("header promises {expected} code pairs but {actual} were decoded")]
    CodeCountMismatch { expected: usize, actual: usize },

    #[error("code sequence cannot be encoded: {0}")]
    Unencodable(&'static str),

    #[error("internal decoder error")]
    InternalDecoderError,
}

pub type Result<T> = std::result::Result<T, Error>;
