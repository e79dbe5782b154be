//! Final Fantasy VIII movie sectors
//!
//! Every FF8 sector starts with an 8-byte header: `"SM"`, the sector's index
//! within its frame, the index of the frame's last sector, and the frame
//! number. Indices 0 and 1 are the left and right audio channels; the
//! remaining eight carry video.

use crate::akao::{Akao, AKAO_SIZE};
use crate::layout::str_header::bitstream_fields;
use crate::record::{AudioChunk, SectorRecord, VideoChunk};
use crate::sector::{Sector, Submode};
use crate::title::FF8;
use crate::types::DemuxOption;

const HEADER_SIZE: usize = 8;
const MAGIC: &[u8; 2] = b"SM";
const LAST_INDEX: u8 = 9;
const FIRST_VIDEO_INDEX: u8 = 2;

/// Read the sector index and frame number.
fn read_header(sector: &Sector<'_>) -> Option<(u8, u32)> {
    if sector.payload(0..2)? != MAGIC || sector.u8_at(3)? != LAST_INDEX {
        return None;
    }

    let index = sector.u8_at(2)?;
    if index > LAST_INDEX {
        return None;
    }

    Some((index, sector.u32_at(4)?))
}

pub fn video(sector: &Sector<'_>, options: DemuxOption) -> Option<SectorRecord> {
    if !sector.subheader_allows(Submode::DATA | Submode::VIDEO, Some(2), options) {
        return None;
    }

    let (index, frame_number) = read_header(sector)?;
    if index < FIRST_VIDEO_INDEX {
        return None;
    }

    let (width, height) = FF8.frame_size?;
    let chunks_in_frame = FF8.chunks_in_frame?;
    let payload_range = HEADER_SIZE..sector.data().len();

    // Only the first video chunk of a frame starts with the bitstream header.
    let (quant_scale, version) = if index == FIRST_VIDEO_INDEX {
        bitstream_fields(sector, HEADER_SIZE, width, height)?
    } else {
        (0, 0)
    };

    Some(SectorRecord::Video(VideoChunk {
        title: FF8.title,
        chunk_index: u16::from(index),
        chunks_in_frame,
        frame_number,
        width,
        height,
        frame_size: u32::from(chunks_in_frame) * payload_range.len() as u32,
        quant_scale,
        version,
        payload_range,
    }))
}

pub fn audio(sector: &Sector<'_>, options: DemuxOption) -> Option<SectorRecord> {
    if !sector.subheader_allows(Submode::DATA, Some(2), options) {
        return None;
    }

    let (index, frame_number) = read_header(sector)?;
    if index >= FIRST_VIDEO_INDEX {
        return None;
    }

    let akao = Akao::read(sector, HEADER_SIZE)?;
    let payload_start = HEADER_SIZE + AKAO_SIZE;
    let payload_end = payload_start + akao.payload_size() as usize;
    if payload_end > sector.data().len() {
        return None;
    }

    Some(SectorRecord::Audio(AudioChunk {
        title: FF8.title,
        channel: index,
        frame_number,
        sample_rate: FF8.sample_rate?,
        payload_size: akao.payload_size(),
        payload_range: payload_start..payload_end,
    }))
}
