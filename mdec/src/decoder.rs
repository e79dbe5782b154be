//! MDEC bitstream decoder.

mod frame;
mod header;
mod types;

pub use frame::{decode_frame, FrameDecoder};
pub use header::{BitstreamVersion, DcCoding, FrameHeader, IkiHeader};
pub use types::DecoderOption;

#[cfg(test)]
pub(crate) use frame::read_ac_code;
pub(crate) use header::{HEADER_SIZE, IKI_HEADER_SIZE, TAG_3800};
