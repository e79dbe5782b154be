//! Bit-level reader over an in-memory frame buffer.

use crate::error::{Error, Result};
use crate::traits::BitReadable;
use crate::vlc::{Entry, Table};

/// The order in which bits are pulled out of the underlying bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BitOrder {
    /// Bytes are consumed in order, most significant bit first.
    BigEndian,

    /// The buffer is a series of 16-bit little-endian words, each consumed
    /// most significant bit first.
    ///
    /// This is how the PlayStation MDEC bitstreams are laid out. A trailing
    /// odd byte does not form a complete word and is never read.
    LittleEndian16,
}

/// A reader that allows decoding a bitstream held entirely in memory.
///
/// The underlying buffer is never modified; the reader only carries a cursor
/// into it. Reads past the end of the buffer fail with `Error::EndOfData`
/// and leave the cursor where it was.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    /// The data to read bits from.
    data: &'a [u8],

    /// How the bits are arranged in `data`.
    order: BitOrder,

    /// How many bits of the buffer have already been read.
    position: usize,
}

impl<'a> BitReader<'a> {
    /// Read a buffer from its first bit.
    pub fn new(data: &'a [u8], order: BitOrder) -> Self {
        Self::with_offset(data, 0, order)
    }

    /// Read a buffer starting at an arbitrary bit offset.
    pub fn with_offset(data: &'a [u8], bit_offset: usize, order: BitOrder) -> Self {
        Self {
            data,
            order,
            position: bit_offset,
        }
    }

    /// The number of bits consumed so far, including the starting offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The bit order this reader was constructed with.
    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// The total number of readable bits in the buffer.
    fn bit_count(&self) -> usize {
        match self.order {
            BitOrder::BigEndian => self.data.len() * 8,
            BitOrder::LittleEndian16 => (self.data.len() & !1) * 8,
        }
    }

    /// How many bits are left to read.
    pub fn bits_remaining(&self) -> usize {
        self.bit_count().saturating_sub(self.position)
    }

    /// Fetch a single bit. The position must already be bounds-checked.
    fn bit_at(&self, position: usize) -> u8 {
        let byte_index = match self.order {
            BitOrder::BigEndian => position / 8,
            BitOrder::LittleEndian16 => {
                (position / 16) * 2 + if position % 16 < 8 { 1 } else { 0 }
            }
        };

        (self.data[byte_index] >> (7 - position % 8)) & 1
    }

    /// Copy an arbitrary number of bits from the stream out into a type.
    ///
    /// The bits will be returned such that the read-out bits start from the
    /// least significant bit of the returned type. This means that, say,
    /// reading two bits from the bitstream will result in a value that has
    /// been zero-extended.
    ///
    /// This function does not advance the reader. Repeated calls to
    /// `peek_bits` return the same bits.
    ///
    /// At most 32 bits may be peeked at once, and `bits_needed` must not
    /// exceed the width of the type. Either mistake yields
    /// `Error::InternalDecoderError`.
    pub fn peek_bits<T: BitReadable>(&self, bits_needed: u32) -> Result<T> {
        if bits_needed > 32 || !T::holds_bits(bits_needed) {
            return Err(Error::InternalDecoderError);
        }

        let end = self.position + bits_needed as usize;
        if end > self.bit_count() {
            return Err(Error::EndOfData);
        }

        let mut accum = T::zero();
        for position in self.position..end {
            accum = (accum << 1u32) | T::from(self.bit_at(position));
        }

        Ok(accum)
    }

    /// Skip forward a certain number of bits.
    ///
    /// Skipping past the end of the buffer is an error, and no skipping will
    /// take place.
    pub fn skip_bits(&mut self, bits_to_skip: u32) -> Result<()> {
        if bits_to_skip as usize > self.bits_remaining() {
            return Err(Error::EndOfData);
        }

        self.position += bits_to_skip as usize;

        Ok(())
    }

    /// Move an arbitrary number of bits from the stream out into a type.
    ///
    /// This is `peek_bits` followed by `skip_bits` of the same amount.
    pub fn read_bits<T: BitReadable>(&mut self, bits_needed: u32) -> Result<T> {
        let r = self.peek_bits(bits_needed)?;
        self.skip_bits(bits_needed)?;

        Ok(r)
    }

    /// Copy an arbitrary number of bits from the stream out into a type,
    /// applying sign extension to the result.
    ///
    /// All other behaviors of `peek_bits` apply here, save for the additional
    /// sign extension.
    pub fn peek_signed_bits<T: BitReadable>(&self, bits_needed: u32) -> Result<T> {
        let val: T = self.peek_bits(bits_needed)?;
        if bits_needed == 0 {
            return Ok(val);
        }

        let sign_bit: T = val >> (bits_needed - 1);

        if !sign_bit.is_zero() {
            let sign_extension = (!T::zero()).checked_shl(bits_needed);

            Ok(val | sign_extension.unwrap_or_else(T::zero))
        } else {
            Ok(val)
        }
    }

    /// Move an arbitrary number of bits from the stream out into a type,
    /// applying sign extension to the result.
    pub fn read_signed_bits<T: BitReadable>(&mut self, bits_needed: u32) -> Result<T> {
        let r = self.peek_signed_bits(bits_needed)?;
        self.skip_bits(bits_needed)?;

        Ok(r)
    }

    /// Read a variable-length code.
    ///
    /// The table consists of a list of `Entry`s. All `Fork`s in the table must
    /// have valid indicies and all links in the table must form a directed
    /// acyclic graph.
    ///
    /// This function yields `Error::InternalDecoderError` in the event that
    /// the given table is invalid, and `Error::EndOfData` if the code runs off
    /// the end of the buffer. In the event that an error is returned, the
    /// position of the bitstream is undefined; wrap the call in
    /// `with_transaction` if that matters.
    pub fn read_vlc<T: Clone>(&mut self, table: &Table<T>) -> Result<T> {
        let mut index = 0;

        Ok(loop {
            match table.get(index) {
                Some(Entry::End(t)) => break t.clone(),
                Some(Entry::Fork(zero, one)) => {
                    let next_bit: u8 = self.read_bits(1)?;

                    if next_bit == 0 {
                        index = *zero;
                    } else {
                        index = *one;
                    }
                }
                None => return Err(Error::InternalDecoderError),
            }
        })
    }

    /// Yield a checkpoint value that can be used to abort a complex read
    /// operation.
    fn checkpoint(&self) -> usize {
        self.position
    }

    /// Restore a previously-created checkpoint.
    fn rollback(&mut self, checkpoint: usize) -> Result<()> {
        if checkpoint > self.bit_count() {
            return Err(Error::InternalDecoderError);
        }

        self.position = checkpoint;

        Ok(())
    }

    /// Run some parsing code in such a way that it will not advance the
    /// bitstream position unless it successfully parses a value.
    ///
    /// Closures passed to this function must yield a `Result`. The reader
    /// position will not be modified if the function yields an `Err`.
    pub fn with_transaction<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let checkpoint = self.checkpoint();

        let result = f(self);

        if result.is_err() {
            self.rollback(checkpoint)?;
        }

        result
    }

    /// Run some parsing code in such a way that it will not advance the
    /// bitstream position, ever.
    pub fn with_lookahead<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let checkpoint = self.checkpoint();

        let result = f(self);

        self.rollback(checkpoint)?;

        result
    }
}
