use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use num_bigint::BigUint;

use crate::{encode_parts, Error};

/// The protobuf wire types
///
/// <https://protobuf.dev/programming-guides/encoding/#structure>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
    Varint = 0,
    /// 8 little-endian bytes (fixed64, sfixed64, double)
    Fixed64 = 1,
    /// Lengths prefixed field (string, bytes, embedded messages, packed repeated fields)
    LengthDelimited = 2,
    // group start/end (deprecated, unsupported)
    // SGROUP = 3,
    // EGROUP = 4,
    /// 4 little-endian bytes (fixed32, sfixed32, float)
    Fixed32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(Error::InvalidWireType(other)),
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length-delimited",
            WireType::Fixed32 => "fixed32",
        })
    }
}

/// Largest field number the wire format allows (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// The value carried by a [`WirePart`]. The variant determines the wire type.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Decoded varints can be wider than 64 bits. Encoding keeps the low 64 bits
    /// (see [`truncate_to_u64`](crate::truncate_to_u64)).
    Varint(BigUint),
    Fixed64([u8; 8]),
    /// Raw length-delimited bytes. This is what the decoder produces for wire type 2.
    Bytes(Vec<u8>),
    /// A nested message that is encoded first and then written as length-delimited bytes.
    Message(Vec<WirePart>),
    Fixed32([u8; 4]),
}

impl Payload {
    pub fn wire_type(&self) -> WireType {
        match self {
            Payload::Varint(_) => WireType::Varint,
            Payload::Fixed64(_) => WireType::Fixed64,
            Payload::Bytes(_) | Payload::Message(_) => WireType::LengthDelimited,
            Payload::Fixed32(_) => WireType::Fixed32,
        }
    }

    /// The bytes of a length-delimited payload, encoding a nested message on demand.
    /// Returns None for the other wire types.
    pub fn delimited(&self) -> Option<Cow<'_, [u8]>> {
        match self {
            Payload::Bytes(data) => Some(Cow::Borrowed(data)),
            Payload::Message(parts) => Some(Cow::Owned(encode_parts(parts))),
            _ => None,
        }
    }
}

/// One field occurrence on the wire.
///
/// A field number may show up in many parts; that is how repeated fields look
/// on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct WirePart {
    pub field_number: u32,
    pub payload: Payload,
    /// The `[start, end)` offsets this part occupied in the decoded buffer.
    /// Only set by [`decode_parts`](crate::decode_parts).
    pub byte_range: Option<Range<usize>>,
}

impl WirePart {
    pub fn new(field_number: u32, payload: Payload) -> Self {
        Self {
            field_number,
            payload,
            byte_range: None,
        }
    }

    pub fn varint(field_number: u32, value: impl Into<BigUint>) -> Self {
        Self::new(field_number, Payload::Varint(value.into()))
    }

    pub fn fixed64(field_number: u32, data: [u8; 8]) -> Self {
        Self::new(field_number, Payload::Fixed64(data))
    }

    pub fn fixed32(field_number: u32, data: [u8; 4]) -> Self {
        Self::new(field_number, Payload::Fixed32(data))
    }

    pub fn bytes(field_number: u32, data: impl Into<Vec<u8>>) -> Self {
        Self::new(field_number, Payload::Bytes(data.into()))
    }

    pub fn message(field_number: u32, parts: Vec<WirePart>) -> Self {
        Self::new(field_number, Payload::Message(parts))
    }

    #[inline]
    pub fn wire_type(&self) -> WireType {
        self.payload.wire_type()
    }
}

/// The result of [`decode_parts`](crate::decode_parts).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    /// All parts that decoded completely, in wire order.
    pub parts: Vec<WirePart>,
    /// The input suffix starting at the first part that failed to decode.
    pub leftover: Vec<u8>,
    /// Why decoding stopped before the end of the input, if it did.
    pub error: Option<Error>,
}

impl DecodedMessage {
    /// True if the whole input was consumed.
    pub fn is_complete(&self) -> bool {
        self.leftover.is_empty()
    }

    /// Returns the parts of a fully decoded message, or the reason decoding stopped.
    pub fn into_complete(self) -> Result<Vec<WirePart>, Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.parts),
        }
    }

    /// The first part with the given field number.
    pub fn first(&self, field_number: u32) -> Option<&WirePart> {
        self.parts
            .iter()
            .find(|part| part.field_number == field_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_type_try_from_works() {
        assert_eq!(WireType::try_from(0).unwrap(), WireType::Varint);
        assert_eq!(WireType::try_from(1).unwrap(), WireType::Fixed64);
        assert_eq!(WireType::try_from(2).unwrap(), WireType::LengthDelimited);
        assert_eq!(WireType::try_from(5).unwrap(), WireType::Fixed32);
        for invalid in [3, 4, 6, 7] {
            assert_eq!(
                WireType::try_from(invalid),
                Err(Error::InvalidWireType(invalid))
            );
        }
    }

    #[test]
    fn payload_wire_type_works() {
        assert_eq!(WirePart::varint(1, 5u8).wire_type(), WireType::Varint);
        assert_eq!(WirePart::fixed64(1, [0; 8]).wire_type(), WireType::Fixed64);
        assert_eq!(WirePart::fixed32(1, [0; 4]).wire_type(), WireType::Fixed32);
        assert_eq!(
            WirePart::bytes(1, b"abc".to_vec()).wire_type(),
            WireType::LengthDelimited
        );
        assert_eq!(
            WirePart::message(1, vec![]).wire_type(),
            WireType::LengthDelimited
        );
    }

    #[test]
    fn delimited_encodes_nested_messages() {
        let payload = Payload::Message(vec![WirePart::varint(1, 150u32)]);
        assert_eq!(payload.delimited().unwrap().as_ref(), &[0x08, 0x96, 0x01]);

        let payload = Payload::Bytes(vec![1, 2]);
        assert!(matches!(payload.delimited(), Some(Cow::Borrowed(&[1, 2]))));

        assert!(Payload::Fixed32([0; 4]).delimited().is_none());
    }
}
