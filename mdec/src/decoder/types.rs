//! Decoder types

bitflags! {
    /// Options which influence the decoding of a bitstream.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct DecoderOption : u8 {
        /// Fail a frame whose decoded code count disagrees with the count
        /// its header promises.
        ///
        /// Real discs are not always consistent about this field, so it is
        /// only checked on request.
        const STRICT_CODE_COUNT = 0b1;
    }
}
