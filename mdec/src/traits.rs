//! Traits

use num_traits::{CheckedShl, CheckedShr, One, Zero};
use std::cmp::Eq;
use std::ops::{BitAnd, BitOr, Not};

/// Integer types that bits can be shifted into, one at a time.
///
/// `CheckedShl` and `CheckedShr` bring in `Shl<u32>` and `Shr<u32>`, which is
/// all the shifting the bit reader needs.
pub trait BitReadable:
    Copy
    + CheckedShl
    + CheckedShr
    + BitOr<Self, Output = Self>
    + BitAnd<Self, Output = Self>
    + Not<Output = Self>
    + Eq
    + Zero
    + One
    + From<u8>
{
    /// Whether or not a value of this type can hold `bits` bits.
    fn holds_bits(bits: u32) -> bool {
        bits == 0 || Self::zero().checked_shl(bits - 1).is_some()
    }
}

impl<T> BitReadable for T where
    T: Copy
        + CheckedShl
        + CheckedShr
        + BitOr<Self, Output = Self>
        + BitAnd<Self, Output = Self>
        + Not<Output = Self>
        + Eq
        + Zero
        + One
        + From<u8>
{
}
