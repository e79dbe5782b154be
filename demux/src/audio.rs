//! Audio run tracking

use crate::record::AudioChunk;
use crate::title::{AudioContinuity, Title};
use crate::types::DemuxOption;
use log::{debug, warn};

/// A stretch of consecutive audio sectors that play as one stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioRun {
    pub title: Title,
    pub start_sector: u32,
    pub end_sector: u32,
    pub left_sample_count: u64,
    pub right_sample_count: u64,
    pub sample_rate: u32,

    /// Distance between successive left-channel sectors, once two have been
    /// seen.
    pub sector_period: Option<u32>,
}

/// The parts of an audio sector that continuity is judged on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct AudioSector {
    title: Title,
    sector: u32,
    channel: u8,
    frame_number: u32,
    sample_rate: u32,
}

/// Whether `current` directly follows `previous` in the same stream.
fn matches_previous(previous: &AudioSector, current: &AudioSector, options: DemuxOption) -> bool {
    if previous.title != current.title || previous.sample_rate != current.sample_rate {
        return false;
    }

    let continuity = match current.title.config().audio_continuity {
        Some(continuity) => continuity,
        None => return false,
    };

    let stride = match current.sector.checked_sub(previous.sector) {
        Some(stride) if stride > 0 => stride,
        _ => return false,
    };

    match (previous.channel, current.channel) {
        (0, 1) => current.frame_number == previous.frame_number && stride == 1,
        (1, 0) => {
            if current.frame_number != previous.frame_number.wrapping_add(1) {
                return false;
            }

            match continuity {
                AudioContinuity::Ff8 => {
                    stride == 9
                        || (stride == 1 && options.contains(DemuxOption::FF8_AUDIO_ONLY_GAP))
                }
                AudioContinuity::Ff9 => true,
            }
        }
        _ => false,
    }
}

/// The run being accumulated.
struct OpenRun {
    run: AudioRun,
    previous: AudioSector,
    last_left: Option<u32>,
}

impl OpenRun {
    fn start(sector: AudioSector, samples: u32) -> Self {
        let mut open = Self {
            run: AudioRun {
                title: sector.title,
                start_sector: sector.sector,
                end_sector: sector.sector,
                left_sample_count: 0,
                right_sample_count: 0,
                sample_rate: sector.sample_rate,
                sector_period: None,
            },
            previous: sector,
            last_left: None,
        };
        open.add(sector, samples);

        open
    }

    /// Whether a left-channel sector keeps to the established pace.
    fn keeps_period(&self, sector: &AudioSector) -> bool {
        if sector.channel != 0 {
            return true;
        }

        match (self.last_left, self.run.sector_period) {
            (Some(last), Some(period)) => sector.sector - last == period,
            _ => true,
        }
    }

    fn add(&mut self, sector: AudioSector, samples: u32) {
        if sector.channel == 0 {
            if let Some(last) = self.last_left {
                self.run.sector_period = Some(sector.sector - last);
            }

            self.last_left = Some(sector.sector);
            self.run.left_sample_count += u64::from(samples);
        } else {
            self.run.right_sample_count += u64::from(samples);
        }

        self.run.end_sector = sector.sector;
        self.previous = sector;
    }
}

/// Groups audio chunks into runs.
pub struct AudioDemuxer {
    options: DemuxOption,
    open: Option<OpenRun>,
}

impl AudioDemuxer {
    pub fn new(options: DemuxOption) -> Self {
        Self {
            options,
            open: None,
        }
    }

    /// Close the open run, if it has anything in it.
    fn close(&mut self) -> Option<AudioRun> {
        let run = self.open.take()?.run;

        if run.left_sample_count + run.right_sample_count == 0 {
            debug!(
                "Suppressing silent {:?} audio run at sectors {}..={}",
                run.title, run.start_sector, run.end_sector
            );
            return None;
        }

        debug!(
            "Audio run at sectors {}..={}: {} + {} samples",
            run.start_sector, run.end_sector, run.left_sample_count, run.right_sample_count
        );

        Some(run)
    }

    /// Add a chunk read from sector `sector_number`.
    ///
    /// Yields the previous run if this chunk does not continue it.
    pub fn on_chunk(&mut self, sector_number: u32, chunk: &AudioChunk) -> Option<AudioRun> {
        let sector = AudioSector {
            title: chunk.title,
            sector: sector_number,
            channel: chunk.channel,
            frame_number: chunk.frame_number,
            sample_rate: chunk.sample_rate,
        };
        let samples = chunk.sample_count();

        if let Some(open) = self.open.as_mut() {
            if matches_previous(&open.previous, &sector, self.options)
                && open.keeps_period(&sector)
            {
                open.add(sector, samples);
                return None;
            }

            warn!(
                "Audio run broken at sector {} (channel {}, frame {})",
                sector.sector, sector.channel, sector.frame_number
            );
        }

        let finished = self.close();
        self.open = Some(OpenRun::start(sector, samples));

        finished
    }

    /// Close the open run at the end of the disc.
    pub fn finish(&mut self) -> Option<AudioRun> {
        self.close()
    }
}
