use num_traits::ToPrimitive;
use tracing::trace;

use crate::slice_reader::SliceReader;
use crate::varint::{read_unsigned_varint, truncate_to_u64};
use crate::wire::{DecodedMessage, Payload, WirePart, WireType, MAX_FIELD_NUMBER};
use crate::Error;

/// Splits `data` into wire parts.
///
/// This never fails. Decoding stops at the first part that cannot be read
/// completely; that part and everything after it is returned as
/// [`leftover`](DecodedMessage::leftover) and the reason is stored in
/// [`error`](DecodedMessage::error). The byte ranges of the parts followed by
/// the leftover always add up to the full input.
///
/// ## Example
///
/// ```
/// use partbuf::{decode_parts, Error, Payload};
///
/// // field 1 = 150, then a length-delimited field announcing 5 bytes but carrying 2
/// let decoded = decode_parts(&[0x08, 0x96, 0x01, 0x12, 0x05, 0x68, 0x69]);
/// assert_eq!(decoded.parts.len(), 1);
/// assert_eq!(decoded.parts[0].byte_range, Some(0..3));
/// assert_eq!(decoded.leftover, [0x12, 0x05, 0x68, 0x69]);
/// assert!(matches!(decoded.error, Some(Error::TruncatedPayload { .. })));
/// ```
pub fn decode_parts(data: &[u8]) -> DecodedMessage {
    let mut reader = SliceReader::new(data);
    let mut parts = Vec::new();

    while !reader.is_empty() {
        let start = reader.position();
        match read_part(&mut reader) {
            Ok((field_number, payload)) => parts.push(WirePart {
                field_number,
                payload,
                byte_range: Some(start..reader.position()),
            }),
            Err(err) => {
                trace!(offset = start, error = %err, "stopped decoding wire parts");
                return DecodedMessage {
                    parts,
                    leftover: data[start..].to_vec(),
                    error: Some(err),
                };
            }
        }
    }

    DecodedMessage {
        parts,
        leftover: Vec::new(),
        error: None,
    }
}

fn read_part(reader: &mut SliceReader) -> Result<(u32, Payload), Error> {
    let tag = read_unsigned_varint(reader)?;
    let wire_type = WireType::try_from((truncate_to_u64(&tag) & 0x07) as u8)?;

    // valid field numbers are between 1 and 536,870,911
    let field_number = (tag >> 3usize)
        .to_u32()
        .filter(|number| (1..=MAX_FIELD_NUMBER).contains(number))
        .ok_or(Error::InvalidFieldNumber)?;

    let payload = read_value(reader, wire_type)?;
    Ok((field_number, payload))
}

fn read_value(data: &mut SliceReader, wire_type: WireType) -> Result<Payload, Error> {
    let truncated = |data: &SliceReader| Error::TruncatedPayload {
        wire_type,
        available: data.len(),
    };
    let value = match wire_type {
        WireType::Varint => Payload::Varint(read_unsigned_varint(data)?),
        WireType::Fixed64 => {
            Payload::Fixed64(data.read_array::<8>().ok_or_else(|| truncated(data))?)
        }
        WireType::LengthDelimited => {
            let length = read_unsigned_varint(data)?;
            let consumed = length
                .to_usize()
                .and_then(|length| data.read(length))
                .ok_or_else(|| truncated(data))?;
            Payload::Bytes(consumed.to_vec())
        }
        WireType::Fixed32 => {
            Payload::Fixed32(data.read_array::<4>().ok_or_else(|| truncated(data))?)
        }
    };
    Ok(value)
}
