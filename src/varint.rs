//! Base-128 varints and the zigzag transform.
//!
//! Decoding accumulates into a [`BigUint`], so an over-long varint is reported
//! with its full value instead of wrapping around at 64 bits. Encoding only
//! ever takes a `u64`; use [`truncate_to_u64`] to get there from a decoded value.

use num_bigint::BigUint;

use crate::slice_reader::SliceReader;
use crate::Error;

/// Encodes `value` as a varint.
///
/// Zero is encoded as the single byte `0x00`.
///
/// ## Example
///
/// ```
/// use partbuf::encode_varint;
///
/// assert_eq!(encode_varint(0), [0x00]);
/// assert_eq!(encode_varint(150), [0x96, 0x01]);
/// ```
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    unsigned_varint_encode(value, &mut out);
    out
}

/// Encodes the unsigned integer `n` using the protobuf varint (variable integer)
/// format and appends it to `dest`.
pub(crate) fn unsigned_varint_encode(mut n: u64, dest: &mut Vec<u8>) {
    let mut buf = [0u8; 10];
    let mut len = 0;
    loop {
        // Read least significant 7 bits
        let mut b = (n & 0b0111_1111) as u8;
        n >>= 7;
        // Set top bit when not yet done
        if n != 0 {
            b |= 0b1000_0000;
        }
        buf[len] = b;
        len += 1;
        if n == 0 {
            break;
        }
    }
    dest.extend_from_slice(&buf[0..len]);
}

/// Decodes a varint from the start of `buf` and returns the value together with
/// the number of bytes it occupied.
///
/// There is no upper bound on the number of groups.
///
/// ## Example
///
/// ```
/// use partbuf::{decode_varint, BigUint, Error};
///
/// let (value, consumed) = decode_varint(&[0xac, 0x02, 0xff]).unwrap();
/// assert_eq!(value, BigUint::from(300u32));
/// assert_eq!(consumed, 2);
///
/// assert_eq!(decode_varint(&[0x80, 0x80]), Err(Error::TruncatedVarint));
/// ```
pub fn decode_varint(buf: &[u8]) -> Result<(BigUint, usize), Error> {
    let mut reader = SliceReader::new(buf);
    let value = read_unsigned_varint(&mut reader)?;
    Ok((value, reader.position()))
}

pub(crate) fn read_unsigned_varint(data: &mut SliceReader) -> Result<BigUint, Error> {
    let groups = data.read_varint_groups().ok_or(Error::TruncatedVarint)?;
    Ok(pack_groups(groups))
}

/// Repacks 7-bit groups (least significant first) into little-endian bytes.
fn pack_groups(groups: &[u8]) -> BigUint {
    let mut bytes = Vec::with_capacity(groups.len() * 7 / 8 + 1);
    let mut acc: u16 = 0;
    let mut bits = 0;
    for group in groups {
        acc |= u16::from(group & 0x7f) << bits;
        bits += 7;
        if bits >= 8 {
            bytes.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        bytes.push(acc as u8);
    }
    BigUint::from_bytes_le(&bytes)
}

/// Keeps the low 64 bits of `value`.
///
/// This is the only place where a decoded varint loses precision. It is applied
/// when a varint payload is encoded and when a typed field narrows a decoded integer.
pub fn truncate_to_u64(value: &BigUint) -> u64 {
    value.iter_u64_digits().next().unwrap_or(0)
}

/// Maps a signed 32-bit integer to an unsigned one (sint32 encoding).
#[inline]
pub fn zigzag_encode32(n: i32) -> u64 {
    (((n << 1) ^ (n >> 31)) as u32).into()
}

/// Inverse of [`zigzag_encode32`]. Only the low 32 bits of `n` are considered.
#[inline]
pub fn zigzag_decode32(n: u64) -> i32 {
    let n = n as u32;
    ((n >> 1) as i32) ^ (-((n & 1) as i32))
}

#[inline]
pub fn zigzag_encode64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
pub fn zigzag_decode64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}
