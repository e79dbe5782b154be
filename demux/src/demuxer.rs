//! A demuxing session over a disc's sectors

use crate::audio::{AudioDemuxer, AudioRun};
use crate::classify::classify_with;
use crate::record::SectorRecord;
use crate::sector::Sector;
use crate::types::DemuxOption;
use crate::video::{CompletedFrame, DroppedFrame, VideoDemuxer};

/// Something the demuxer found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DemuxEvent {
    Frame(CompletedFrame),
    FrameDropped(DroppedFrame),
    Audio(AudioRun),
}

/// Classifies sectors and reassembles the streams they belong to.
///
/// Sectors must be fed in disc order. Call `finish` after the last one to
/// flush whatever is still being assembled.
pub struct Demuxer {
    options: DemuxOption,
    video: VideoDemuxer,
    audio: AudioDemuxer,
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl Demuxer {
    pub fn new() -> Self {
        Self::with_options(DemuxOption::default_set())
    }

    pub fn with_options(options: DemuxOption) -> Self {
        Self {
            options,
            video: VideoDemuxer::new(),
            audio: AudioDemuxer::new(options),
        }
    }

    /// Classify a sector and act on it.
    pub fn on_sector(&mut self, sector: &Sector<'_>) -> Vec<DemuxEvent> {
        let record = classify_with(sector, self.options);

        self.on_record(sector, &record)
    }

    /// Act on a sector that was already classified.
    pub fn on_record(&mut self, sector: &Sector<'_>, record: &SectorRecord) -> Vec<DemuxEvent> {
        let mut events = Vec::new();

        match record {
            SectorRecord::Video(chunk) => {
                let completed = self.video.on_chunk(sector, chunk);

                events.extend(self.video.drain_dropped().map(DemuxEvent::FrameDropped));
                events.extend(completed.map(DemuxEvent::Frame));
            }
            SectorRecord::Audio(chunk) => {
                events.extend(
                    self.audio
                        .on_chunk(sector.number(), chunk)
                        .map(DemuxEvent::Audio),
                );
            }
            SectorRecord::Null | SectorRecord::Unknown => {}
        }

        events
    }

    /// Flush the streams at the end of the disc.
    pub fn finish(&mut self) -> Vec<DemuxEvent> {
        let mut events: Vec<_> = self
            .video
            .finish()
            .into_iter()
            .map(DemuxEvent::FrameDropped)
            .collect();
        events.extend(self.audio.finish().map(DemuxEvent::Audio));

        events
    }
}
