//! Chrono Cross movie sectors

use crate::layout::str_header::{StrHeader, TAG_3800};
use crate::record::SectorRecord;
use crate::sector::{Sector, Submode};
use crate::title::CHRONO_CROSS;
use crate::types::DemuxOption;

pub fn video(sector: &Sector<'_>, options: DemuxOption) -> Option<SectorRecord> {
    if !sector.subheader_allows(Submode::VIDEO | Submode::DATA, None, options) {
        return None;
    }

    let header = StrHeader::read(sector)?;
    if !CHRONO_CROSS.video_magic.contains(&header.magic)
        || header.tag != TAG_3800
        || !(header.version == 2 || header.version == 3)
        || !header.is_well_formed()
    {
        return None;
    }

    Some(SectorRecord::Video(
        header.into_chunk(CHRONO_CROSS.title, sector),
    ))
}
