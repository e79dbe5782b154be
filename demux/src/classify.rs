//! Sector classification

use crate::layout;
use crate::record::SectorRecord;
use crate::sector::Sector;
use crate::types::DemuxOption;
use log::trace;

type LayoutParser = fn(&Sector<'_>, DemuxOption) -> Option<SectorRecord>;

/// Every known layout, in the order they are tried.
///
/// Several layouts accept overlapping byte patterns, so the more specific
/// parsers must come first. In particular FF7's video layout accepts every
/// FF9 video sector.
const LAYOUTS: [(&str, LayoutParser); 6] = [
    ("FF8 video", layout::ff8::video),
    ("FF8 audio", layout::ff8::audio),
    ("FF9 video", layout::ff9::video),
    ("FF9 audio", layout::ff9::audio),
    ("Chrono Cross video", layout::chrono::video),
    ("FF7 video", layout::ff7::video),
];

/// Classify a sector with the default options.
pub fn classify(sector: &Sector<'_>) -> SectorRecord {
    classify_with(sector, DemuxOption::default_set())
}

/// Classify a sector as the first layout that accepts it.
///
/// Sectors that no layout accepts are `Null` if they hold nothing but
/// zeroes, and `Unknown` otherwise.
pub fn classify_with(sector: &Sector<'_>, options: DemuxOption) -> SectorRecord {
    for (name, parser) in LAYOUTS.iter() {
        if let Some(record) = parser(sector, options) {
            trace!("Sector {} is {}", sector.number(), name);
            return record;
        }
    }

    if sector.data().iter().all(|&byte| byte == 0) {
        trace!("Sector {} is empty", sector.number());
        return SectorRecord::Null;
    }

    trace!("Sector {} is not a movie sector", sector.number());
    SectorRecord::Unknown
}
