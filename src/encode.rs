use crate::varint::{truncate_to_u64, unsigned_varint_encode};
use crate::wire::{Payload, WirePart, WireType};

/// Serializes parts in the given order.
///
/// Varint payloads wider than 64 bits are truncated to their low 64 bits.
///
/// ## Example
///
/// ```
/// use partbuf::{encode_parts, WirePart};
///
/// let serialized = encode_parts(&[
///     WirePart::varint(1, 150u32),
///     WirePart::bytes(2, "hi"),
///     WirePart::message(3, vec![WirePart::varint(1, 0u8)]),
/// ]);
/// assert_eq!(serialized, [0x08, 0x96, 0x01, 0x12, 0x02, b'h', b'i', 0x1a, 0x02, 0x08, 0x00]);
/// ```
pub fn encode_parts(parts: &[WirePart]) -> Vec<u8> {
    let mut encoder = Encoder::default();
    for part in parts {
        encoder.append_part(part);
    }
    encoder.into_vec()
}

#[derive(Default)]
struct Encoder {
    output: Vec<u8>,
}

impl Encoder {
    fn append_part(&mut self, part: &WirePart) {
        // tag
        self.append_tag(part.field_number, part.wire_type());
        // value
        match &part.payload {
            Payload::Varint(value) => {
                unsigned_varint_encode(truncate_to_u64(value), &mut self.output)
            }
            Payload::Fixed64(data) => self.output.extend_from_slice(data),
            Payload::Fixed32(data) => self.output.extend_from_slice(data),
            Payload::Bytes(data) => self.append_delimited(data),
            Payload::Message(parts) => {
                let nested = encode_parts(parts);
                self.append_delimited(&nested);
            }
        }
    }

    fn append_delimited(&mut self, data: &[u8]) {
        unsigned_varint_encode(data.len() as u64, &mut self.output);
        self.output.extend_from_slice(data);
    }

    fn append_tag(&mut self, field_number: u32, wire_type: WireType) {
        // The field number is shifted by 3 bits, so it never overflows a u64
        let tag = (u64::from(field_number) << 3) | wire_type as u64;
        unsigned_varint_encode(tag, &mut self.output);
    }

    fn into_vec(self) -> Vec<u8> {
        self.output
    }
}
