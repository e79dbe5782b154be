//! Final Fantasy VII movie sectors

use crate::layout::str_header::{bitstream_fields, StrHeader};
use crate::record::SectorRecord;
use crate::sector::{Sector, Submode};
use crate::title::FF7;
use crate::types::DemuxOption;

/// FF7 video sectors.
///
/// FF7 reuses the bitstream header copy for camera data, so only the magic
/// and the STR framing fields can be checked. This is the most permissive
/// video layout and must be tried after the others.
pub fn video(sector: &Sector<'_>, options: DemuxOption) -> Option<SectorRecord> {
    if !sector.subheader_allows(Submode::DATA, None, options) {
        return None;
    }

    let header = StrHeader::read(sector)?;
    if !FF7.video_magic.contains(&header.magic) || !header.is_well_formed() {
        return None;
    }

    let mut chunk = header.into_chunk(FF7.title, sector);

    // The real bitstream header follows the camera data in the first chunk.
    let (quant_scale, version) = if header.chunk == 0 {
        bitstream_fields(
            sector,
            chunk.payload_range.start + FF7.frame_prefix,
            header.width,
            header.height,
        )
        .unwrap_or((0, 0))
    } else {
        (0, 0)
    };
    chunk.quant_scale = quant_scale;
    chunk.version = version;

    Some(SectorRecord::Video(chunk))
}

#[cfg(test)]
mod tests {
    use crate::layout::ff7::video;
    use crate::layout::str_header::tests::str_header;
    use crate::record::SectorRecord;
    use crate::sector::{Sector, SubHeader, Submode};
    use crate::types::DemuxOption;

    #[test]
    fn camera_data_is_not_checked() {
        let mut data = str_header(0x8001_0160, 0, 3, 1, 5000, 320, 224, 0xBEEF);
        data[20..28].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data.resize(40, 0xCA);
        data.extend_from_slice(&[0x10, 0x00, 0x00, 0x38, 0x07, 0x00, 0x01, 0x00]);
        data.resize(2048, 0);

        let subheader = Some(SubHeader::from_bytes([1, 1, Submode::DATA.bits(), 0]));
        let sector = Sector::from_parts(0, subheader, &data);

        match video(&sector, DemuxOption::default_set()) {
            Some(SectorRecord::Video(chunk)) => {
                assert_eq!(7, chunk.quant_scale);
                assert_eq!(1, chunk.version);
                assert_eq!(3, chunk.chunks_in_frame);
            }
            other => panic!("expected a video chunk, got {:?}", other),
        }
    }

    #[test]
    fn needs_data_flag() {
        let mut data = str_header(0x8001_0160, 0, 3, 1, 5000, 320, 224, 2);
        data.resize(2048, 0);
        let subheader = Some(SubHeader::from_bytes([1, 1, Submode::VIDEO.bits(), 0]));
        let sector = Sector::from_parts(0, subheader, &data);

        assert_eq!(None, video(&sector, DemuxOption::default_set()));
        assert!(video(&sector, DemuxOption::empty()).is_some());
    }
}
