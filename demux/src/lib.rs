//! Sector classification and stream reassembly for Square PlayStation movies
//!
//! Sectors read off a disc image are classified into video chunks, audio
//! chunks and everything else. Video chunks are stitched back together into
//! frame buffers, ready for `psxmdec_rs::FrameDecoder`, and audio chunks are
//! grouped into contiguous runs for an external ADPCM decoder.

#[macro_use]
extern crate bitflags;

mod akao;
mod audio;
mod classify;
mod demuxer;
mod error;
mod layout;
mod record;
mod sector;
mod title;
mod types;
mod video;

pub use akao::Akao;
pub use audio::{AudioDemuxer, AudioRun};
pub use classify::{classify, classify_with};
pub use demuxer::{DemuxEvent, Demuxer};
pub use error::{Error, Result};
pub use record::{AudioChunk, SectorRecord, VideoChunk};
pub use sector::{Sector, SubHeader, Submode};
pub use title::{AudioContinuity, ChunkOrder, Title, TitleConfig};
pub use types::DemuxOption;
pub use video::{CompletedFrame, DroppedFrame, VideoDemuxer};
