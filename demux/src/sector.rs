//! CD-ROM sectors and their XA sub-headers.

use crate::error::{Error, Result};
use crate::types::DemuxOption;
use std::ops::Range;

/// The 12-byte pattern that opens every raw sector.
const SYNC: [u8; 12] = [
    0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00,
];

/// Size of a sector as read in raw mode, sync and error correction included.
pub const RAW_SECTOR_SIZE: usize = 2352;

/// Size of a form 1 sector's user data, and of a cooked sector.
pub const COOKED_SECTOR_SIZE: usize = 2048;

/// Size of a form 2 sector's user data.
pub const FORM2_DATA_SIZE: usize = 2324;

bitflags! {
    /// The submode byte of an XA sub-header.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Submode : u8 {
        const END_OF_RECORD = 0x01;
        const VIDEO = 0x02;
        const AUDIO = 0x04;
        const DATA = 0x08;
        const TRIGGER = 0x10;

        /// The sector is form 2: larger user data, no error correction.
        const FORM2 = 0x20;
        const REAL_TIME = 0x40;
        const END_OF_FILE = 0x80;
    }
}

/// The 4-byte XA sub-header of a mode 2 sector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SubHeader {
    pub file: u8,
    pub channel: u8,
    pub submode: Submode,
    pub coding: u8,
}

impl SubHeader {
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            file: bytes[0],
            channel: bytes[1],
            submode: Submode::from_bits_retain(bytes[2]),
            coding: bytes[3],
        }
    }

    /// The sector form, 1 or 2.
    pub fn form(&self) -> u8 {
        if self.submode.contains(Submode::FORM2) {
            2
        } else {
            1
        }
    }
}

/// One sector's user data, plus what is known about where it came from.
///
/// Sectors borrow their bytes; nothing here copies sector contents.
#[derive(Copy, Clone, Debug)]
pub struct Sector<'a> {
    number: u32,
    subheader: Option<SubHeader>,
    data: &'a [u8],
}

impl<'a> Sector<'a> {
    /// Wrap user data that was obtained some other way.
    pub fn from_parts(number: u32, subheader: Option<SubHeader>, data: &'a [u8]) -> Self {
        Self {
            number,
            subheader,
            data,
        }
    }

    /// Read a 2352-byte raw sector.
    ///
    /// Mode 2 sectors expose their sub-header and 2048 or 2324 bytes of user
    /// data, depending on form. Mode 1 sectors have no sub-header.
    pub fn from_raw(number: u32, raw: &'a [u8]) -> Result<Self> {
        if raw.len() != RAW_SECTOR_SIZE {
            return Err(Error::InvalidSectorSize(raw.len()));
        }

        if raw[..12] != SYNC {
            return Err(Error::MissingSync);
        }

        match raw[15] {
            1 => Ok(Self::from_parts(number, None, &raw[16..16 + COOKED_SECTOR_SIZE])),
            2 => {
                let subheader = SubHeader::from_bytes([raw[16], raw[17], raw[18], raw[19]]);
                let size = if subheader.form() == 2 {
                    FORM2_DATA_SIZE
                } else {
                    COOKED_SECTOR_SIZE
                };

                Ok(Self::from_parts(number, Some(subheader), &raw[24..24 + size]))
            }
            mode => Err(Error::UnsupportedMode(mode)),
        }
    }

    /// Read a 2048-byte cooked sector, which has no sub-header.
    pub fn from_cooked(number: u32, data: &'a [u8]) -> Result<Self> {
        if data.len() != COOKED_SECTOR_SIZE {
            return Err(Error::InvalidSectorSize(data.len()));
        }

        Ok(Self::from_parts(number, None, data))
    }

    /// Read a sector of either size.
    pub fn from_bytes(number: u32, bytes: &'a [u8]) -> Result<Self> {
        match bytes.len() {
            RAW_SECTOR_SIZE => Self::from_raw(number, bytes),
            _ => Self::from_cooked(number, bytes),
        }
    }

    /// The sector's position on the disc.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn subheader(&self) -> Option<&SubHeader> {
        self.subheader.as_ref()
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The XA channel, or zero for sectors without a sub-header.
    pub fn channel(&self) -> u8 {
        self.subheader.map_or(0, |subheader| subheader.channel)
    }

    /// A range of the user data, if it lies within the sector.
    pub fn payload(&self, range: Range<usize>) -> Option<&'a [u8]> {
        self.data.get(range)
    }

    pub(crate) fn u8_at(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    pub(crate) fn u16_at(&self, offset: usize) -> Option<u16> {
        let bytes = self.data.get(offset..offset + 2)?;

        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn u32_at(&self, offset: usize) -> Option<u32> {
        let bytes = self.data.get(offset..offset + 4)?;

        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Check the sub-header against a layout's requirements.
    ///
    /// At least one of `any_of` must be set in the submode, and if `form` is
    /// given the sector must be of that form. Sectors without a sub-header,
    /// and every sector when `STRICT_SUBHEADER` is off, always pass.
    pub(crate) fn subheader_allows(
        &self,
        any_of: Submode,
        form: Option<u8>,
        options: DemuxOption,
    ) -> bool {
        if !options.contains(DemuxOption::STRICT_SUBHEADER) {
            return true;
        }

        match self.subheader {
            None => true,
            Some(subheader) => {
                subheader.submode.intersects(any_of)
                    && form.map_or(true, |form| subheader.form() == form)
            }
        }
    }
}
