//! Frame header parsing and bitstream version detection.

use crate::error::{Error, Result};

/// Every MDEC frame header carries this tag in its second half-word.
pub const TAG_3800: u16 = 0x3800;

/// Size of the common frame header.
pub const HEADER_SIZE: usize = 8;

/// Size of the Iki frame header, which ends with the side table size.
pub const IKI_HEADER_SIZE: usize = 10;

/// The known bitstream variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BitstreamVersion {
    /// Final Fantasy VII. Identical to version 2 save for the version field.
    Ff7,

    /// Version 2, with flat 10-bit DC coefficients.
    V2,

    /// Version 3, with DC coefficients coded as per-channel differentials.
    V3,

    /// Iki, with per-block qscale/DC pairs in a compressed side table.
    Iki,
}

/// How the first code of every block is obtained.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DcCoding {
    /// A signed 10-bit field, read directly.
    Fixed10,

    /// A size VLC plus differential bits, relative to the previous DC of the
    /// same channel.
    Differential,

    /// Taken from the inflated side table; nothing is in the bitstream.
    SideTable,
}

impl BitstreamVersion {
    /// Map a header version field onto a bitstream version.
    ///
    /// Iki frames carry no version field and are never returned here.
    pub fn from_header_field(field: u16) -> Option<Self> {
        match field {
            1 => Some(BitstreamVersion::Ff7),
            2 => Some(BitstreamVersion::V2),
            3 => Some(BitstreamVersion::V3),
            _ => None,
        }
    }

    /// The value this version writes into the header's version field.
    pub fn header_field(self) -> Option<u16> {
        match self {
            BitstreamVersion::Ff7 => Some(1),
            BitstreamVersion::V2 => Some(2),
            BitstreamVersion::V3 => Some(3),
            BitstreamVersion::Iki => None,
        }
    }

    pub fn dc_coding(self) -> DcCoding {
        match self {
            BitstreamVersion::Ff7 | BitstreamVersion::V2 => DcCoding::Fixed10,
            BitstreamVersion::V3 => DcCoding::Differential,
            BitstreamVersion::Iki => DcCoding::SideTable,
        }
    }
}

/// The Iki-specific part of a frame header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IkiHeader {
    pub width: u16,
    pub height: u16,

    /// Size in bytes of the LZSS-compressed side table that follows the
    /// header.
    pub side_table_size: u16,
}

/// The header found at the start of every assembled frame buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: BitstreamVersion,

    /// Half the number of MDEC codes in the frame, rounded up.
    pub half_code_count: u16,

    /// The frame-wide quantization scale.
    ///
    /// Iki frames carry a scale per block instead, and report zero here.
    pub quant_scale: u16,

    /// Byte offset at which the variable-length-coded bitstream begins.
    pub bitstream_offset: usize,

    pub iki: Option<IkiHeader>,
}

fn u16_at(buffer: &[u8], offset: usize) -> Result<u16> {
    match buffer.get(offset..offset + 2) {
        Some(bytes) => Ok(u16::from_le_bytes([bytes[0], bytes[1]])),
        None => Err(Error::EndOfData),
    }
}

impl FrameHeader {
    /// Parse the header of a frame of the given dimensions.
    ///
    /// The dimensions are only needed to recognize Iki frames, which carry
    /// them where other versions carry the quantization scale and version.
    pub fn parse(buffer: &[u8], width: u16, height: u16) -> Result<Self> {
        let half_code_count = u16_at(buffer, 0)?;
        if u16_at(buffer, 2)? != TAG_3800 {
            return Err(Error::InvalidHeader);
        }

        let first = u16_at(buffer, 4)?;
        let second = u16_at(buffer, 6)?;

        if let Some(version) = BitstreamVersion::from_header_field(second) {
            if first == 0 || first > 63 {
                return Err(Error::InvalidHeader);
            }

            return Ok(Self {
                version,
                half_code_count,
                quant_scale: first,
                bitstream_offset: HEADER_SIZE,
                iki: None,
            });
        }

        if first == width && second == height && width != 0 && height != 0 {
            let side_table_size = u16_at(buffer, 8)?;
            let table_end = IKI_HEADER_SIZE + usize::from(side_table_size);

            return Ok(Self {
                version: BitstreamVersion::Iki,
                half_code_count,
                quant_scale: 0,
                // The bitstream resumes on the next 16-bit boundary.
                bitstream_offset: (table_end + 1) & !1,
                iki: Some(IkiHeader {
                    width,
                    height,
                    side_table_size,
                }),
            });
        }

        Err(Error::UnsupportedVersion(second))
    }
}
