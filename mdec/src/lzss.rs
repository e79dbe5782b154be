//! LZSS compression of the Iki qscale/DC side table.
//!
//! The stream is a series of groups. Each group starts with a flag byte whose
//! bits, most significant first, describe up to eight operations:
//!
//! * `0`: copy one literal byte from the input.
//! * `1`: copy from earlier output. Two bytes follow; the high nibble of the
//!   first is the copy length minus 3, and the remaining 12 bits are the
//!   distance back minus 1.
//!
//! Decompression stops as soon as the expected number of bytes is produced.

use crate::error::{Error, Result};

const MIN_MATCH: usize = 3;
const MAX_MATCH: usize = 18;
const WINDOW: usize = 4096;

/// Inflate `src` into exactly `expected_len` bytes.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    let mut input = src.iter().copied();

    while out.len() < expected_len {
        let flags = input.next().ok_or(Error::InvalidSideTable)?;

        for bit in (0..8).rev() {
            if out.len() >= expected_len {
                break;
            }

            if flags & (1 << bit) == 0 {
                out.push(input.next().ok_or(Error::InvalidSideTable)?);
                continue;
            }

            let high = input.next().ok_or(Error::InvalidSideTable)?;
            let low = input.next().ok_or(Error::InvalidSideTable)?;
            let length = usize::from(high >> 4) + MIN_MATCH;
            let distance = ((usize::from(high & 0x0F) << 8) | usize::from(low)) + 1;

            if distance > out.len() {
                return Err(Error::InvalidSideTable);
            }

            // Copies may overlap the bytes they produce.
            let start = out.len() - distance;
            for i in 0..length {
                if out.len() >= expected_len {
                    break;
                }

                let byte = out[start + i];
                out.push(byte);
            }
        }
    }

    Ok(out)
}

/// Find the longest earlier match for the data at `position`.
fn longest_match(src: &[u8], position: usize) -> Option<(usize, usize)> {
    let window_start = position.saturating_sub(WINDOW);
    let max_length = MAX_MATCH.min(src.len() - position);
    let mut best: Option<(usize, usize)> = None;

    for candidate in window_start..position {
        let length = (0..max_length)
            .take_while(|&i| src[candidate + i] == src[position + i])
            .count();

        if length >= MIN_MATCH && best.map_or(true, |(_, best_len)| length > best_len) {
            best = Some((position - candidate, length));
            if length == max_length {
                break;
            }
        }
    }

    best
}

/// Deflate `src` with greedy back-references.
pub fn compress(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len() + src.len() / 8 + 1);
    let mut position = 0;

    while position < src.len() {
        let flag_index = out.len();
        out.push(0);

        for bit in (0..8).rev() {
            if position >= src.len() {
                break;
            }

            match longest_match(src, position) {
                Some((distance, length)) => {
                    out[flag_index] |= 1 << bit;

                    let encoded_distance = distance - 1;
                    out.push((((length - MIN_MATCH) as u8) << 4) | (encoded_distance >> 8) as u8);
                    out.push((encoded_distance & 0xFF) as u8);
                    position += length;
                }
                None => {
                    out.push(src[position]);
                    position += 1;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::lzss::{compress, decompress};

    #[test]
    fn literals_and_references() {
        // "abc" as literals, then copy 6 bytes from 3 back.
        let src = [0b0001_0000, b'a', b'b', b'c', 0x30, 0x02];

        assert_eq!(b"abcabcabc".to_vec(), decompress(&src, 9).unwrap());
    }

    #[test]
    fn stops_at_expected_length() {
        let src = [0b0001_0000, b'x', b'y', b'z', 0xF0, 0x00];

        assert_eq!(b"xyzz".to_vec(), decompress(&src, 4).unwrap());
    }

    #[test]
    fn rejects_bad_streams() {
        assert_eq!(
            Error::InvalidSideTable,
            decompress(&[0x00, b'a'], 2).unwrap_err()
        );
        assert_eq!(
            Error::InvalidSideTable,
            decompress(&[0x80, 0x00, 0x05], 3).unwrap_err()
        );
    }

    #[test]
    fn compressed_output_inflates() {
        let mut src = Vec::new();
        for i in 0..300u32 {
            src.push((i % 7) as u8);
            src.push(0x40);
        }
        src.extend_from_slice(b"tail without repeats");

        let packed = compress(&src);
        assert!(packed.len() < src.len());
        assert_eq!(src, decompress(&packed, src.len()).unwrap());
    }

    #[test]
    fn empty_input() {
        assert!(compress(&[]).is_empty());
        assert!(decompress(&[], 0).unwrap().is_empty());
    }
}
