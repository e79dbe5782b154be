//! Pure-rust decoder for the MDEC bitstreams found in PlayStation movies
//!
//! Frames are turned into a lazy sequence of `MdecCode`s, the run-length and
//! quantized-level pairs consumed by the PlayStation's motion decoder. The
//! inverse transform that turns those codes into pixels is not part of this
//! crate.

#[macro_use]
extern crate bitflags;

#[macro_use]
extern crate lazy_static;

mod decoder;
mod encoder;
mod error;
mod lzss;
mod reader;
mod tables;
mod traits;
mod types;
mod vlc;
mod writer;

pub use decoder::{
    decode_frame, BitstreamVersion, DcCoding, DecoderOption, FrameDecoder, FrameHeader,
    IkiHeader,
};
pub use encoder::encode_frame;
pub use error::{Error, Result};
pub use lzss::{compress as lzss_compress, decompress as lzss_decompress};
pub use reader::{BitOrder, BitReader};
pub use types::{BlockKind, MdecCode};
pub use writer::BitWriter;
