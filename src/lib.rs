//! A schema-less protobuf wire codec: encode and decode anything without a `.proto` file.
//!
//! The bytes produced and consumed are regular protobuf wire format. What is
//! missing is the schema, so field shapes come from one of two places:
//!
//! - an ordered list of untyped [`Value`]s, where the position is the field number,
//!   decoded back into [`GenericValue`]s by guessing what each payload is
//! - a typed [`Record`], usually declared with [`record!`], that knows its field
//!   numbers and field kinds
//!
//! Both sit on top of the wire-part layer: [`encode_parts`] turns [`WirePart`]s
//! into bytes and [`decode_parts`] splits bytes into parts. Decoding wire parts never
//! fails; whatever cannot be parsed is handed back as
//! [`leftover`](DecodedMessage::leftover).
//!
//! ## Non goals
//! - `.proto` parsing or any kind of schema registry
//! - Enums, maps, oneofs and groups
//! - Detecting field number collisions
//!
//! ## Example
//!
//! ```
//! use partbuf::{decode, encode, GenericValue, Value};
//!
//! let serialized = encode(&[
//!     Value::from(1),
//!     Value::from("hello"),
//!     Value::from(vec![Value::from(1), Value::from(2), Value::from(3)]),
//! ]);
//! assert_eq!(serialized, b"\x08\x01\x12\x05hello\x1a\x06\x08\x01\x10\x02\x18\x03");
//!
//! let values = decode(&serialized);
//! assert_eq!(values[1], GenericValue::String("hello".to_string()));
//! ```

mod decode;
mod encode;
mod error;
mod limits;
mod macros;
mod record;
mod slice_reader;
mod value;
mod varint;
mod wire;

pub use decode::decode_parts;
pub use encode::encode_parts;
pub use error::Error;
pub use limits::Limits;
pub use num_bigint::BigUint;
pub use record::{
    parts_to_record, parts_to_record_with_limits, record_to_parts, Element, Field, FieldMut,
    FieldRef, FieldType, OptionalRecord, Record, RepeatedField,
};
pub use value::{generic_decode, generic_decode_with_limits, generic_encode, GenericValue, Value};
pub use varint::{
    decode_varint, encode_varint, truncate_to_u64, zigzag_decode32, zigzag_decode64,
    zigzag_encode32, zigzag_encode64,
};
pub use wire::{DecodedMessage, Payload, WirePart, WireType, MAX_FIELD_NUMBER};

/// Encodes values with field numbers 1, 2, 3, ... in input order.
///
/// Shortcut for [`generic_encode`] followed by [`encode_parts`].
pub fn encode(values: &[Value]) -> Vec<u8> {
    encode_parts(&generic_encode(values))
}

/// Decodes bytes without a schema.
///
/// Shortcut for [`decode_parts`] followed by [`generic_decode`]. Bytes that do
/// not form complete parts are dropped; use [`decode_parts`] to get hold of them.
pub fn decode(data: &[u8]) -> Vec<GenericValue> {
    generic_decode(&decode_parts(data).parts)
}

/// Shortcut for [`record_to_parts`] followed by [`encode_parts`].
pub fn encode_record(record: &dyn Record) -> Result<Vec<u8>, Error> {
    Ok(encode_parts(&record_to_parts(record)?))
}

/// Decodes `data` into `target`.
///
/// Unlike [`decode`] this is strict: if `data` does not consist of complete
/// parts, the reason is returned and `target` is left untouched.
pub fn decode_record(data: &[u8], target: &mut dyn Record) -> Result<(), Error> {
    decode_record_with_limits(data, target, &Limits::default())
}

pub fn decode_record_with_limits(
    data: &[u8],
    target: &mut dyn Record,
    limits: &Limits,
) -> Result<(), Error> {
    let parts = decode_parts(data).into_complete()?;
    parts_to_record_with_limits(&parts, target, limits)
}
