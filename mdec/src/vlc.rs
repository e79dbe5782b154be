//! Variable-length-code tables

use crate::error::{Error, Result};

/// A single entry in a VLC decoding tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Entry<T> {
    /// This entry represents a successful VLC parse.
    ///
    /// The value in `End` will be returned when it is reached in the table.
    End(T),

    /// This entry represents a fork in the table.
    ///
    /// Upon encountering a fork, another bit in the bitstream should be read.
    /// The fork provides a table index for the entry to consider when the bit
    /// is zero (left) or one (right).
    Fork(usize, usize),
}

/// A decoding tree whose entries yield `T`.
pub type Table<T> = [Entry<T>];

/// One row of a code table: a bit pattern and what it decodes to.
///
/// `bits` holds the pattern right-aligned, and `length` says how many of its
/// low bits are significant, so that codes with leading zeroes survive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Code<T> {
    pub bits: u32,
    pub length: u32,
    pub value: T,
}

/// Build a decoding tree out of a list of codes.
///
/// Bit patterns that do not lead to any code decode to `None`. The code list
/// must be prefix-free: if any code is a prefix of (or equal to) another one,
/// `Error::InvalidTable` is returned instead of a tree.
pub fn build_tree<T: Clone>(codes: &[Code<T>]) -> Result<Vec<Entry<Option<T>>>> {
    let mut tree = vec![Entry::End(None)];

    for code in codes {
        if code.length == 0 || code.length > 32 {
            return Err(Error::InvalidTable);
        }

        if code.length < 32 && code.bits >> code.length != 0 {
            return Err(Error::InvalidTable);
        }

        let mut index = 0;
        for bit_number in (0..code.length).rev() {
            let (zero, one) = match tree[index] {
                Entry::Fork(zero, one) => (zero, one),
                // A shorter code already ends here.
                Entry::End(Some(_)) => return Err(Error::InvalidTable),
                Entry::End(None) => {
                    let zero = tree.len();
                    tree.push(Entry::End(None));
                    tree.push(Entry::End(None));
                    tree[index] = Entry::Fork(zero, zero + 1);

                    (zero, zero + 1)
                }
            };

            index = if (code.bits >> bit_number) & 1 == 0 {
                zero
            } else {
                one
            };
        }

        match tree[index] {
            Entry::End(None) => tree[index] = Entry::End(Some(code.value.clone())),
            // Either a duplicate, or a longer code continues past this one.
            _ => return Err(Error::InvalidTable),
        }
    }

    Ok(tree)
}
