//! Video frame reassembly

use crate::error::Result;
use crate::record::VideoChunk;
use crate::sector::Sector;
use crate::title::Title;
use log::{debug, warn};
use psxmdec_rs::{FrameDecoder, MdecCode};
use std::collections::HashMap;

/// A video frame whose chunks all arrived, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedFrame {
    pub title: Title,
    pub frame_number: u32,
    pub width: u16,
    pub height: u16,

    /// The frame's bitstream, starting with its header.
    pub bytes: Vec<u8>,

    /// Camera data that preceded the bitstream, for titles that have it.
    pub camera: Option<Vec<u8>>,

    /// The first and last sectors the frame was read from.
    pub start_sector: u32,
    pub end_sector: u32,
}

impl CompletedFrame {
    /// Prepare to decode the frame's bitstream.
    pub fn decoder(&self) -> psxmdec_rs::Result<FrameDecoder<'_>> {
        FrameDecoder::new(&self.bytes, self.width, self.height)
    }

    /// Decode the frame's bitstream in full.
    pub fn decode(&self) -> Result<Vec<MdecCode>> {
        Ok(self.decoder()?.collect::<psxmdec_rs::Result<Vec<_>>>()?)
    }
}

/// A frame that was abandoned before all of its chunks arrived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedFrame {
    pub title: Title,
    pub frame_number: u32,
    pub width: u16,
    pub height: u16,
    pub chunks_received: u16,
    pub chunks_expected: u16,
    pub start_sector: u32,
}

/// Frames of different streams are assembled separately.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct StreamKey {
    title: Title,
    channel: u8,
}

/// The frame currently being assembled for one stream.
struct FrameDemuxBuffer {
    title: Title,
    frame_number: u32,
    width: u16,
    height: u16,

    /// Sized to the frame's declared total; chunks never write past it.
    bytes: Vec<u8>,
    chunks_received: u16,
    chunks_expected: u16,
    next_expected_chunk_index: u16,
    start_sector: u32,
    end_sector: u32,
}

impl FrameDemuxBuffer {
    fn new(sector_number: u32, chunk: &VideoChunk) -> Self {
        Self {
            title: chunk.title,
            frame_number: chunk.frame_number,
            width: chunk.width,
            height: chunk.height,
            bytes: vec![0; chunk.frame_size as usize],
            chunks_received: 0,
            chunks_expected: chunk.chunks_in_frame,
            next_expected_chunk_index: 0,
            start_sector: sector_number,
            end_sector: sector_number,
        }
    }

    /// Whether `chunk` is the next one this frame is waiting for.
    fn continues_with(&self, chunk: &VideoChunk, logical_index: u16) -> bool {
        self.frame_number == chunk.frame_number
            && self.width == chunk.width
            && self.height == chunk.height
            && self.chunks_expected == chunk.chunks_in_frame
            && self.next_expected_chunk_index == logical_index
    }

    fn add_chunk(&mut self, sector_number: u32, logical_index: u16, payload: &[u8]) {
        let start = usize::from(logical_index) * payload.len();
        let end = (start + payload.len()).min(self.bytes.len());

        if start < end {
            self.bytes[start..end].copy_from_slice(&payload[..end - start]);
        }

        self.chunks_received += 1;
        self.next_expected_chunk_index = logical_index + 1;
        self.end_sector = sector_number;
    }

    fn is_complete(&self) -> bool {
        self.chunks_received == self.chunks_expected
    }

    fn into_completed(mut self) -> CompletedFrame {
        let prefix = self.title.config().frame_prefix;
        let camera = if prefix > 0 && self.bytes.len() >= prefix {
            Some(self.bytes.drain(..prefix).collect())
        } else {
            None
        };

        CompletedFrame {
            title: self.title,
            frame_number: self.frame_number,
            width: self.width,
            height: self.height,
            bytes: self.bytes,
            camera,
            start_sector: self.start_sector,
            end_sector: self.end_sector,
        }
    }

    fn into_dropped(self) -> DroppedFrame {
        DroppedFrame {
            title: self.title,
            frame_number: self.frame_number,
            width: self.width,
            height: self.height,
            chunks_received: self.chunks_received,
            chunks_expected: self.chunks_expected,
            start_sector: self.start_sector,
        }
    }
}

/// Reassembles video chunks into frames.
///
/// Each stream has at most one frame under assembly. A chunk that does not
/// continue that frame (a different frame number or size, or anything but
/// the next chunk in order) starts a new frame, and the old one is dropped.
#[derive(Default)]
pub struct VideoDemuxer {
    open: HashMap<StreamKey, FrameDemuxBuffer>,
    dropped: Vec<DroppedFrame>,
}

impl VideoDemuxer {
    pub fn new() -> Self {
        Self::default()
    }

    fn drop_frame(&mut self, buffer: FrameDemuxBuffer) {
        let dropped = buffer.into_dropped();
        warn!(
            "Dropping {:?} frame {} after {} of {} chunks",
            dropped.title, dropped.frame_number, dropped.chunks_received, dropped.chunks_expected
        );
        self.dropped.push(dropped);
    }

    /// Add a chunk read from `sector`, returning the frame it completes.
    pub fn on_chunk(&mut self, sector: &Sector<'_>, chunk: &VideoChunk) -> Option<CompletedFrame> {
        let payload = match sector.payload(chunk.payload_range.clone()) {
            Some(payload) => payload,
            None => {
                warn!("Sector {} payload lies outside the sector", sector.number());
                return None;
            }
        };

        let capacity = u64::from(chunk.chunks_in_frame) * payload.len() as u64;
        if u64::from(chunk.frame_size) > capacity {
            warn!(
                "Sector {} claims a {}-byte frame in {} chunks of {} bytes",
                sector.number(),
                chunk.frame_size,
                chunk.chunks_in_frame,
                payload.len()
            );
            return None;
        }

        let config = chunk.title.config();
        let logical_index = match config
            .chunk_order
            .logical_index(chunk.chunk_index, chunk.chunks_in_frame)
        {
            Some(index) => index,
            None => {
                warn!(
                    "Sector {} has chunk label {} in a frame of {}",
                    sector.number(),
                    chunk.chunk_index,
                    chunk.chunks_in_frame
                );
                return None;
            }
        };

        let key = StreamKey {
            title: chunk.title,
            channel: sector.channel(),
        };

        let continues = self
            .open
            .get(&key)
            .map_or(false, |buffer| buffer.continues_with(chunk, logical_index));

        if !continues {
            if let Some(old) = self.open.remove(&key) {
                self.drop_frame(old);
            }
        }

        let mut buffer = self
            .open
            .remove(&key)
            .unwrap_or_else(|| FrameDemuxBuffer::new(sector.number(), chunk));
        buffer.add_chunk(sector.number(), logical_index, payload);

        if buffer.is_complete() {
            let frame = buffer.into_completed();
            debug!(
                "Completed {:?} frame {} from sectors {}..={}",
                frame.title, frame.frame_number, frame.start_sector, frame.end_sector
            );

            return Some(frame);
        }

        self.open.insert(key, buffer);

        None
    }

    /// Take the frames dropped since the last call.
    pub fn drain_dropped(&mut self) -> impl Iterator<Item = DroppedFrame> + '_ {
        self.dropped.drain(..)
    }

    /// Drop every frame still under assembly.
    pub fn finish(&mut self) -> Vec<DroppedFrame> {
        let open: Vec<_> = self.open.drain().map(|(_, buffer)| buffer).collect();
        for buffer in open {
            self.drop_frame(buffer);
        }

        self.dropped.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::record::VideoChunk;
    use crate::sector::Sector;
    use crate::title::Title;
    use crate::video::VideoDemuxer;

    /// A chunk whose 4-byte payload starts at offset 4 of its sector.
    fn chunk(title: Title, label: u16, count: u16, frame: u32) -> VideoChunk {
        VideoChunk {
            title,
            chunk_index: label,
            chunks_in_frame: count,
            frame_number: frame,
            width: 16,
            height: 16,
            frame_size: u32::from(count) * 4,
            quant_scale: 1,
            version: 2,
            payload_range: 4..8,
        }
    }

    fn sector_data(label: u16) -> Vec<u8> {
        vec![0xEE, 0xEE, 0xEE, 0xEE, label as u8, label as u8, label as u8, 0xAA]
    }

    #[test]
    fn base_two_labels_reassemble_in_order() {
        let mut demuxer = VideoDemuxer::new();
        let labels = [2, 3, 4, 5, 6, 7, 8, 9, 0, 1];
        let mut completed = None;

        for (i, &label) in labels.iter().enumerate() {
            let data = sector_data(label);
            let sector = Sector::from_parts(100 + i as u32, None, &data);
            let result = demuxer.on_chunk(&sector, &chunk(Title::FinalFantasy8, label, 10, 5));

            if i < 9 {
                assert!(result.is_none());
            } else {
                completed = result;
            }
        }

        let frame = completed.unwrap();
        let order: Vec<u8> = frame.bytes.chunks(4).map(|chunk| chunk[0]).collect();
        assert_eq!(vec![2, 3, 4, 5, 6, 7, 8, 9, 0, 1], order);
        assert_eq!((100, 109), (frame.start_sector, frame.end_sector));
        assert_eq!(None, frame.camera);
        assert_eq!(0, demuxer.drain_dropped().count());
    }

    #[test]
    fn descending_labels() {
        let mut demuxer = VideoDemuxer::new();
        let mut completed = None;

        for label in (0..10).rev() {
            let data = sector_data(label);
            let sector = Sector::from_parts(u32::from(label), None, &data);
            completed = demuxer.on_chunk(&sector, &chunk(Title::FinalFantasy9, label, 10, 1));
        }

        let frame = completed.unwrap();
        assert_eq!(9, frame.bytes[0]);
        assert_eq!(0, frame.bytes[36]);
    }

    #[test]
    fn camera_prefix_is_split_off() {
        let mut demuxer = VideoDemuxer::new();
        let mut completed = None;

        for label in 0..3 {
            let data = sector_data(label);
            let sector = Sector::from_parts(u32::from(label), None, &data);
            completed = demuxer.on_chunk(&sector, &chunk(Title::FinalFantasy7, label, 3, 1));
        }

        let frame = completed.unwrap();
        assert_eq!(Some(vec![0, 0, 0, 0xAA, 1, 1, 1, 0xAA]), frame.camera);
        assert_eq!(vec![2, 2, 2, 0xAA], frame.bytes);
    }

    #[test]
    fn payload_is_clipped_to_frame_size() {
        let mut demuxer = VideoDemuxer::new();
        let mut completed = None;

        for label in 0..2 {
            let mut record = chunk(Title::ChronoCross, label, 2, 1);
            record.frame_size = 6;
            let data = sector_data(label);
            let sector = Sector::from_parts(u32::from(label), None, &data);
            completed = demuxer.on_chunk(&sector, &record);
        }

        assert_eq!(vec![0, 0, 0, 0xAA, 1, 1], completed.unwrap().bytes);
    }

    #[test]
    fn oversized_frame_is_ignored() {
        let mut demuxer = VideoDemuxer::new();
        let mut record = chunk(Title::ChronoCross, 0, 1, 1);
        record.frame_size = 0x4000_0000;
        let data = sector_data(0);
        let sector = Sector::from_parts(0, None, &data);

        assert_eq!(None, demuxer.on_chunk(&sector, &record));
        assert!(demuxer.finish().is_empty());
    }

    #[test]
    fn discontinuity_starts_new_frame() {
        let mut demuxer = VideoDemuxer::new();

        for label in 0..3 {
            let data = sector_data(label);
            let sector = Sector::from_parts(u32::from(label), None, &data);
            assert!(demuxer
                .on_chunk(&sector, &chunk(Title::ChronoCross, label, 4, 1))
                .is_none());
        }

        // Frame 2 starts before frame 1 got its last chunk.
        let mut completed = None;
        for label in 0..4 {
            let data = sector_data(label);
            let sector = Sector::from_parts(10 + u32::from(label), None, &data);
            completed = demuxer.on_chunk(&sector, &chunk(Title::ChronoCross, label, 4, 2));
        }

        assert_eq!(2, completed.unwrap().frame_number);

        let dropped: Vec<_> = demuxer.drain_dropped().collect();
        assert_eq!(1, dropped.len());
        assert_eq!(1, dropped[0].frame_number);
        assert_eq!(3, dropped[0].chunks_received);
    }

    #[test]
    fn skipped_chunk_drops_frame() {
        let mut demuxer = VideoDemuxer::new();

        for &label in [0, 1, 3].iter() {
            let data = sector_data(label);
            let sector = Sector::from_parts(u32::from(label), None, &data);
            assert!(demuxer
                .on_chunk(&sector, &chunk(Title::ChronoCross, label, 4, 1))
                .is_none());
        }

        let dropped: Vec<_> = demuxer.drain_dropped().collect();
        assert_eq!(1, dropped.len());
        assert_eq!(2, dropped[0].chunks_received);

        let leftovers = demuxer.finish();
        assert_eq!(1, leftovers.len());
        assert_eq!(1, leftovers[0].chunks_received);
    }
}
