//! Demuxer types

bitflags! {
    /// Options which influence classification and stream assembly.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct DemuxOption : u8 {
        /// Require each layout's sub-header flags and form to match.
        ///
        /// Only sectors that carry a sub-header are checked; cooked sectors
        /// never are.
        const STRICT_SUBHEADER = 0b1;

        /// Treat a one-sector gap between the right and left channels of
        /// consecutive FF8 audio frames as continuous.
        ///
        /// Audio-only FF8 movies pack their audio sectors back to back
        /// instead of leaving room for eight video sectors.
        const FF8_AUDIO_ONLY_GAP = 0b10;
    }
}

impl DemuxOption {
    /// The options a `Demuxer` uses unless told otherwise.
    pub fn default_set() -> Self {
        DemuxOption::STRICT_SUBHEADER | DemuxOption::FF8_AUDIO_ONLY_GAP
    }
}
