//! Final Fantasy IX movie sectors

use crate::akao::{Akao, AKAO_SIZE};
use crate::layout::str_header::{StrHeader, TAG_3800};
use crate::record::{AudioChunk, SectorRecord};
use crate::sector::{Sector, Submode};
use crate::title::FF9;
use crate::types::DemuxOption;

const AUDIO_MAGIC: u16 = 0x0160;
const AUDIO_TYPE: u16 = 0x0008;
const AUDIO_CHUNKS: u16 = 2;
const AUDIO_AKAO_OFFSET: usize = 32;

/// FF9 video sectors: the STR header with a faithful bitstream header copy,
/// ten chunks per frame, labeled in descending order.
pub fn video(sector: &Sector<'_>, options: DemuxOption) -> Option<SectorRecord> {
    if !sector.subheader_allows(Submode::VIDEO, Some(2), options) {
        return None;
    }

    let header = StrHeader::read(sector)?;
    if !FF9.video_magic.contains(&header.magic)
        || header.tag != TAG_3800
        || header.version != 2
        || Some(header.chunks_in_frame) != FF9.chunks_in_frame
        || !header.is_well_formed()
    {
        return None;
    }

    Some(SectorRecord::Video(header.into_chunk(FF9.title, sector)))
}

/// FF9 audio sectors: SPU-ADPCM behind an AKAO block, two per frame.
pub fn audio(sector: &Sector<'_>, options: DemuxOption) -> Option<SectorRecord> {
    if !sector.subheader_allows(Submode::DATA, Some(2), options) {
        return None;
    }

    if sector.u16_at(0)? != AUDIO_MAGIC
        || sector.u16_at(2)? != AUDIO_TYPE
        || sector.u16_at(6)? != AUDIO_CHUNKS
    {
        return None;
    }

    let channel = sector.u16_at(4)?;
    if channel > 1 {
        return None;
    }

    let akao = Akao::read(sector, AUDIO_AKAO_OFFSET)?;
    let payload_start = AUDIO_AKAO_OFFSET + AKAO_SIZE;
    let payload_end = payload_start + akao.payload_size() as usize;
    if payload_end > sector.data().len() {
        return None;
    }

    Some(SectorRecord::Audio(AudioChunk {
        title: FF9.title,
        channel: channel as u8,
        frame_number: sector.u32_at(8)?,
        sample_rate: FF9.sample_rate?,
        payload_size: akao.payload_size(),
        payload_range: payload_start..payload_end,
    }))
}
