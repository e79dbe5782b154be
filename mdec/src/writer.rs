//! Bit-level writer, the mirror image of `BitReader`.

use crate::reader::BitOrder;

/// Accumulates a bitstream in memory.
///
/// Bits are laid out in the same order a `BitReader` with the same
/// `BitOrder` would read them back. Unwritten bits in the final byte (or
/// word) are zero.
#[derive(Clone, Debug)]
pub struct BitWriter {
    order: BitOrder,
    bytes: Vec<u8>,
    bits_written: usize,
}

impl BitWriter {
    pub fn new(order: BitOrder) -> Self {
        Self {
            order,
            bytes: Vec::new(),
            bits_written: 0,
        }
    }

    pub fn bits_written(&self) -> usize {
        self.bits_written
    }

    fn push_bit(&mut self, bit: bool) {
        let position = self.bits_written;
        let (byte_index, needed_len) = match self.order {
            BitOrder::BigEndian => (position / 8, position / 8 + 1),
            BitOrder::LittleEndian16 => {
                let word_start = (position / 16) * 2;
                let byte_index = word_start + if position % 16 < 8 { 1 } else { 0 };

                (byte_index, word_start + 2)
            }
        };

        if self.bytes.len() < needed_len {
            self.bytes.resize(needed_len, 0);
        }

        if bit {
            self.bytes[byte_index] |= 0x80 >> (position % 8);
        }

        self.bits_written += 1;
    }

    /// Write the low `bits` bits of `value`, most significant first.
    ///
    /// At most 32 bits can be written at once.
    pub fn write_bits(&mut self, value: u32, bits: u32) {
        debug_assert!(bits <= 32, "cannot write more than 32 bits at once");

        for bit_number in (0..bits.min(32)).rev() {
            self.push_bit((value >> bit_number) & 1 != 0);
        }
    }

    /// Write the low `bits` bits of a two's complement value.
    pub fn write_signed_bits(&mut self, value: i32, bits: u32) {
        self.write_bits(value as u32, bits);
    }

    /// Finish writing and return the buffer.
    ///
    /// `LittleEndian16` output is always a whole number of words long.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use crate::reader::{BitOrder, BitReader};
    use crate::writer::BitWriter;

    #[test]
    fn writes_big_endian() {
        let mut writer = BitWriter::new(BitOrder::BigEndian);
        writer.write_bits(0b111, 3);
        writer.write_bits(0b00001, 5);
        writer.write_bits(0b1, 1);

        assert_eq!(9, writer.bits_written());
        assert_eq!(vec![0xE1, 0x80], writer.into_bytes());
    }

    #[test]
    fn writes_little_endian_words() {
        let mut writer = BitWriter::new(BitOrder::LittleEndian16);
        writer.write_bits(0x1234, 16);
        writer.write_bits(0b1, 1);

        assert_eq!(vec![0x34, 0x12, 0x00, 0x80], writer.into_bytes());
    }

    #[test]
    fn reads_back_what_was_written() {
        for order in [BitOrder::BigEndian, BitOrder::LittleEndian16].iter() {
            let mut writer = BitWriter::new(*order);
            writer.write_signed_bits(-5, 10);
            writer.write_bits(0x2A, 6);
            writer.write_bits(0xDEAD_BEEF, 32);

            let bytes = writer.into_bytes();
            let mut reader = BitReader::new(&bytes, *order);
            assert_eq!(-5, reader.read_signed_bits::<i16>(10).unwrap());
            assert_eq!(0x2A, reader.read_bits::<u8>(6).unwrap());
            assert_eq!(0xDEAD_BEEF, reader.read_bits::<u32>(32).unwrap());
        }
    }
}
