//! The 32-byte STR video sector header shared by several titles.

use crate::record::VideoChunk;
use crate::sector::{Sector, COOKED_SECTOR_SIZE};
use crate::title::Title;
use psxmdec_rs::FrameHeader;

pub const STR_HEADER_SIZE: usize = 32;

/// Bitstream bytes carried by each STR video sector.
pub const STR_CHUNK_PAYLOAD: usize = COOKED_SECTOR_SIZE - STR_HEADER_SIZE;

/// The tag every MDEC bitstream header carries, copied into the sector.
pub const TAG_3800: u16 = 0x3800;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StrHeader {
    pub magic: u32,
    pub chunk: u16,
    pub chunks_in_frame: u16,
    pub frame_number: u32,
    pub frame_size: u32,
    pub width: u16,
    pub height: u16,

    /// Copied from the frame's bitstream header. Some titles store other
    /// data here instead.
    pub tag: u16,
    pub quant_scale: u16,
    pub version: u16,
}

impl StrHeader {
    pub fn read(sector: &Sector<'_>) -> Option<Self> {
        if sector.data().len() < STR_HEADER_SIZE {
            return None;
        }

        Some(Self {
            magic: sector.u32_at(0)?,
            chunk: sector.u16_at(4)?,
            chunks_in_frame: sector.u16_at(6)?,
            frame_number: sector.u32_at(8)?,
            frame_size: sector.u32_at(12)?,
            width: sector.u16_at(16)?,
            height: sector.u16_at(18)?,
            tag: sector.u16_at(22)?,
            quant_scale: sector.u16_at(24)?,
            version: sector.u16_at(26)?,
        })
    }

    /// Whether the fields every title relies on are self-consistent.
    ///
    /// The frame must fit in the chunks that carry it.
    pub fn is_well_formed(&self) -> bool {
        let capacity = u64::from(self.chunks_in_frame) * STR_CHUNK_PAYLOAD as u64;

        self.chunks_in_frame > 0
            && self.chunk < self.chunks_in_frame
            && self.width > 0
            && self.height > 0
            && self.frame_size > 0
            && u64::from(self.frame_size) <= capacity
    }

    /// Every STR chunk carries `STR_CHUNK_PAYLOAD` bytes, whatever the
    /// sector's form. Form 2 sectors leave the rest of their user data unused.
    pub fn into_chunk(self, title: Title, sector: &Sector<'_>) -> VideoChunk {
        let payload_end = sector.data().len().min(STR_HEADER_SIZE + STR_CHUNK_PAYLOAD);

        VideoChunk {
            title,
            chunk_index: self.chunk,
            chunks_in_frame: self.chunks_in_frame,
            frame_number: self.frame_number,
            width: self.width,
            height: self.height,
            frame_size: self.frame_size,
            quant_scale: self.quant_scale,
            version: self.version,
            payload_range: STR_HEADER_SIZE..payload_end,
        }
    }
}

/// Read the quantization scale and version field of the frame bitstream
/// header found `offset` bytes into a sector.
pub fn bitstream_fields(
    sector: &Sector<'_>,
    offset: usize,
    width: u16,
    height: u16,
) -> Option<(u16, u16)> {
    let header = FrameHeader::parse(sector.payload(offset..sector.data().len())?, width, height)
        .ok()?;

    Some((
        header.quant_scale,
        header.version.header_field().unwrap_or(0),
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::layout::str_header::StrHeader;
    use crate::sector::{Sector, SubHeader, Submode};

    /// Lay out a 32-byte STR header.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn str_header(
        magic: u32,
        chunk: u16,
        chunks: u16,
        frame: u32,
        frame_size: u32,
        width: u16,
        height: u16,
        version: u16,
    ) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(32);
        bytes.extend_from_slice(&magic.to_le_bytes());
        bytes.extend_from_slice(&chunk.to_le_bytes());
        bytes.extend_from_slice(&chunks.to_le_bytes());
        bytes.extend_from_slice(&frame.to_le_bytes());
        bytes.extend_from_slice(&frame_size.to_le_bytes());
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.extend_from_slice(&0x0100u16.to_le_bytes());
        bytes.extend_from_slice(&0x3800u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&version.to_le_bytes());
        bytes.extend_from_slice(&[0; 4]);

        bytes
    }

    #[test]
    fn reads_fields() {
        let mut data = str_header(0x8001_0160, 3, 10, 77, 20000, 320, 224, 2);
        data.resize(2048, 0xEE);
        let sector = Sector::from_parts(9, None, &data);
        let header = StrHeader::read(&sector).unwrap();

        assert_eq!(0x8001_0160, header.magic);
        assert_eq!(3, header.chunk);
        assert_eq!(77, header.frame_number);
        assert_eq!(224, header.height);
        assert_eq!(0x3800, header.tag);
        assert!(header.is_well_formed());

        let chunk = header.into_chunk(crate::title::Title::FinalFantasy9, &sector);
        assert_eq!(32..2048, chunk.payload_range);
    }

    #[test]
    fn malformed_headers() {
        let data = str_header(0x8001_0160, 10, 10, 1, 100, 16, 16, 2);
        let sector = Sector::from_parts(0, None, &data);
        assert!(!StrHeader::read(&sector).unwrap().is_well_formed());

        let data = str_header(0x8001_0160, 0, 1, 1, 100, 0, 16, 2);
        let sector = Sector::from_parts(0, None, &data);
        assert!(!StrHeader::read(&sector).unwrap().is_well_formed());

        let sector = Sector::from_parts(0, None, &data[..31]);
        assert_eq!(None, StrHeader::read(&sector));
    }

    #[test]
    fn frame_must_fit_its_chunks() {
        let data = str_header(0x8101_0160, 0, 1, 1, 0x4000_0000, 320, 224, 2);
        let sector = Sector::from_parts(0, None, &data);
        assert!(!StrHeader::read(&sector).unwrap().is_well_formed());

        let data = str_header(0x8101_0160, 0, 2, 1, 2 * 2016 + 1, 320, 224, 2);
        let sector = Sector::from_parts(0, None, &data);
        assert!(!StrHeader::read(&sector).unwrap().is_well_formed());

        let data = str_header(0x8101_0160, 0, 2, 1, 2 * 2016, 320, 224, 2);
        let sector = Sector::from_parts(0, None, &data);
        assert!(StrHeader::read(&sector).unwrap().is_well_formed());
    }

    #[test]
    fn form2_payload_is_one_chunk() {
        let mut data = str_header(0x8001_0160, 3, 10, 77, 20000, 320, 224, 2);
        data.resize(2324, 0xEE);
        let subheader = SubHeader::from_bytes([1, 1, (Submode::VIDEO | Submode::FORM2).bits(), 0]);
        let sector = Sector::from_parts(9, Some(subheader), &data);

        let chunk = StrHeader::read(&sector)
            .unwrap()
            .into_chunk(crate::title::Title::FinalFantasy9, &sector);
        assert_eq!(32..2048, chunk.payload_range);
    }
}
