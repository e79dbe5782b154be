//! Classified sector records

use crate::title::Title;
use std::ops::Range;

/// One sector's share of a video frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoChunk {
    pub title: Title,

    /// The chunk label exactly as stored on disc.
    ///
    /// This is not necessarily the chunk's position in the frame; see
    /// `ChunkOrder`.
    pub chunk_index: u16,
    pub chunks_in_frame: u16,
    pub frame_number: u32,
    pub width: u16,
    pub height: u16,

    /// Size of the assembled frame, in bytes.
    pub frame_size: u32,

    /// The frame's quantization scale, where the sector records it.
    pub quant_scale: u16,

    /// The frame's bitstream version field, where the sector records it.
    pub version: u16,

    /// Where in the sector's user data this chunk's payload lies.
    pub payload_range: Range<usize>,
}

/// One sector's share of an audio stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioChunk {
    pub title: Title,

    /// 0 for the left channel, 1 for the right.
    pub channel: u8,
    pub frame_number: u32,
    pub sample_rate: u32,

    /// Bytes of SPU-ADPCM data in the payload.
    pub payload_size: u32,
    pub payload_range: Range<usize>,
}

impl AudioChunk {
    /// How many samples the chunk decodes to.
    ///
    /// Every 16-byte ADPCM block holds 28 samples.
    pub fn sample_count(&self) -> u32 {
        self.payload_size / 16 * 28
    }
}

/// The result of classifying a sector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SectorRecord {
    Video(VideoChunk),
    Audio(AudioChunk),

    /// A sector of nothing but zeroes.
    Null,

    /// A sector that matches no known movie layout.
    Unknown,
}
