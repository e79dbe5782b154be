//! Per-title sector conventions.

/// The games whose movie sectors can be classified.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Title {
    FinalFantasy7,
    FinalFantasy8,
    FinalFantasy9,
    ChronoCross,
}

/// How on-disc chunk labels map onto a chunk's position within its frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkOrder {
    /// Labels count up from `base`, wrapping back to zero at `modulus`, or at
    /// the frame's chunk count if there is none. Labels at or past the
    /// modulus, and labels left over once the frame's chunks are used up,
    /// belong to no chunk.
    Ascending { base: u16, modulus: Option<u16> },

    /// Labels count down to zero; the highest label is the first chunk.
    Descending,
}

impl ChunkOrder {
    /// The position of the chunk labeled `label` in a frame of `count`
    /// chunks, or `None` if no chunk of such a frame carries that label.
    pub fn logical_index(self, label: u16, count: u16) -> Option<u16> {
        if count == 0 {
            return None;
        }

        match self {
            ChunkOrder::Ascending { base, modulus } => {
                let modulus = u32::from(modulus.unwrap_or(count));
                let label = u32::from(label);
                if label >= modulus {
                    return None;
                }

                let index = (label + modulus - u32::from(base) % modulus) % modulus;
                if index >= u32::from(count) {
                    return None;
                }

                Some(index as u16)
            }
            ChunkOrder::Descending => {
                if label >= count {
                    return None;
                }

                Some(count - 1 - label)
            }
        }
    }
}

/// Which rule decides whether two audio sectors belong to the same run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AudioContinuity {
    /// Left and right share a frame and sit in adjacent sectors; the next
    /// frame's left channel follows nine sectors later, past the video.
    Ff8,

    /// Left and right share a frame and sit in adjacent sectors; the next
    /// frame's left channel may follow at any distance.
    Ff9,
}

/// The fixed properties of one title's movie sectors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TitleConfig {
    pub title: Title,

    /// Magic numbers accepted at the start of a video sector.
    pub video_magic: &'static [u32],

    /// Chunk count every frame must have, if the title fixes one.
    pub chunks_in_frame: Option<u16>,

    pub chunk_order: ChunkOrder,

    /// Bytes of non-bitstream data at the start of every assembled frame.
    pub frame_prefix: usize,

    /// Fixed frame dimensions, for titles whose sectors do not carry them.
    pub frame_size: Option<(u16, u16)>,

    pub sample_rate: Option<u32>,
    pub audio_continuity: Option<AudioContinuity>,
}

pub const FF7: TitleConfig = TitleConfig {
    title: Title::FinalFantasy7,
    video_magic: &[0x8001_0160],
    chunks_in_frame: None,
    chunk_order: ChunkOrder::Ascending {
        base: 0,
        modulus: None,
    },
    frame_prefix: 8,
    frame_size: None,
    sample_rate: None,
    audio_continuity: None,
};

pub const FF8: TitleConfig = TitleConfig {
    title: Title::FinalFantasy8,
    video_magic: &[],
    chunks_in_frame: Some(8),
    // Labels 0 and 1 are the audio channels.
    chunk_order: ChunkOrder::Ascending {
        base: 2,
        modulus: Some(10),
    },
    frame_prefix: 0,
    frame_size: Some((320, 224)),
    sample_rate: Some(44100),
    audio_continuity: Some(AudioContinuity::Ff8),
};

pub const FF9: TitleConfig = TitleConfig {
    title: Title::FinalFantasy9,
    video_magic: &[0x8001_0160],
    chunks_in_frame: Some(10),
    chunk_order: ChunkOrder::Descending,
    frame_prefix: 0,
    frame_size: None,
    sample_rate: Some(44100),
    audio_continuity: Some(AudioContinuity::Ff9),
};

pub const CHRONO_CROSS: TitleConfig = TitleConfig {
    title: Title::ChronoCross,
    video_magic: &[0x8101_0160, 0x0103_0160],
    chunks_in_frame: None,
    chunk_order: ChunkOrder::Ascending {
        base: 0,
        modulus: None,
    },
    frame_prefix: 0,
    frame_size: None,
    sample_rate: None,
    audio_continuity: None,
};

impl Title {
    pub fn config(self) -> &'static TitleConfig {
        match self {
            Title::FinalFantasy7 => &FF7,
            Title::FinalFantasy8 => &FF8,
            Title::FinalFantasy9 => &FF9,
            Title::ChronoCross => &CHRONO_CROSS,
        }
    }
}
