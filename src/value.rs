//! Schema-less values.
//!
//! Without a schema the decoder has to guess what a length-delimited payload
//! is. [`generic_decode`] first tries to read it as a nested message, then as
//! UTF-8 text, and falls back to raw bytes. A payload that is both a complete
//! message and valid text is reported as a message.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use tracing::debug;

use crate::wire::{Payload, WirePart};
use crate::{decode_parts, Limits};

/// Input of [`generic_encode`]. The position of a value decides its field number.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Has no wire representation. It is skipped but still uses up its field number.
    Null,
    Bool(bool),
    /// Encoded as the two's complement `u64`, like protobuf's int64.
    Int(i64),
    Uint(u64),
    /// Only the low 64 bits are encoded.
    BigUint(BigUint),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
}

/// A value recovered from the wire without a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericValue {
    /// A varint. May be wider than 64 bits.
    Integer(BigUint),
    /// A length-delimited payload that is valid UTF-8 (including the empty payload).
    String(String),
    /// Fixed-width payloads and length-delimited payloads that are neither text nor a message.
    Bytes(Vec<u8>),
    /// A length-delimited payload that decoded as a complete message.
    Nested(Vec<GenericValue>),
}

impl GenericValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            GenericValue::Integer(value) => value.to_u64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GenericValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            GenericValue::Bytes(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&[GenericValue]> {
        match self {
            GenericValue::Nested(values) => Some(values),
            _ => None,
        }
    }
}

/// Assigns field numbers 1, 2, 3, ... in input order.
///
/// ## Example
///
/// ```
/// use partbuf::{encode_parts, generic_encode, Value};
///
/// let parts = generic_encode(&[
///     Value::from(1),
///     Value::from("hello"),
///     Value::from(vec![Value::from(1), Value::from(2), Value::from(3)]),
/// ]);
/// assert_eq!(
///     encode_parts(&parts),
///     b"\x08\x01\x12\x05hello\x1a\x06\x08\x01\x10\x02\x18\x03"
/// );
/// ```
pub fn generic_encode(values: &[Value]) -> Vec<WirePart> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let payload = value_payload(value)?;
            Some(WirePart::new(index as u32 + 1, payload))
        })
        .collect()
}

fn value_payload(value: &Value) -> Option<Payload> {
    let payload = match value {
        Value::Null => return None,
        Value::Bool(value) => Payload::Varint(u8::from(*value).into()),
        Value::Int(value) => Payload::Varint((*value as u64).into()),
        Value::Uint(value) => Payload::Varint((*value).into()),
        Value::BigUint(value) => Payload::Varint(value.clone()),
        Value::Float(value) => Payload::Fixed32(value.to_le_bytes()),
        Value::Double(value) => Payload::Fixed64(value.to_le_bytes()),
        Value::String(value) => Payload::Bytes(value.as_bytes().to_vec()),
        Value::Bytes(value) => Payload::Bytes(value.clone()),
        Value::List(values) => Payload::Message(generic_encode(values)),
    };
    Some(payload)
}

/// Converts parts into values, guessing the meaning of length-delimited payloads.
///
/// Nesting is followed up to [`Limits::DEFAULT_MAX_DEPTH`] levels.
///
/// ## Example
///
/// ```
/// use partbuf::{decode_parts, generic_decode, GenericValue};
///
/// let decoded = decode_parts(b"\x08\x01\x12\x05hello\x1a\x06\x08\x01\x10\x02\x18\x03");
/// let values = generic_decode(&decoded.parts);
/// assert_eq!(values[0].as_u64(), Some(1));
/// assert_eq!(values[1].as_str(), Some("hello"));
/// let nested = values[2].as_nested().unwrap();
/// assert_eq!(nested.iter().map(|v| v.as_u64().unwrap()).collect::<Vec<_>>(), [1, 2, 3]);
/// ```
pub fn generic_decode(parts: &[WirePart]) -> Vec<GenericValue> {
    generic_decode_with_limits(parts, &Limits::default())
}

/// Like [`generic_decode`]. Past `limits.max_depth` nested levels, payloads
/// are no longer probed for messages and come back as strings or bytes.
pub fn generic_decode_with_limits(parts: &[WirePart], limits: &Limits) -> Vec<GenericValue> {
    decode_values(parts, limits, 0)
}

fn decode_values(parts: &[WirePart], limits: &Limits, depth: usize) -> Vec<GenericValue> {
    parts
        .iter()
        .map(|part| match &part.payload {
            Payload::Varint(value) => GenericValue::Integer(value.clone()),
            Payload::Fixed64(data) => GenericValue::Bytes(data.to_vec()),
            Payload::Fixed32(data) => GenericValue::Bytes(data.to_vec()),
            Payload::Bytes(data) => infer(data, limits, depth),
            Payload::Message(_) => {
                let data = part.payload.delimited().unwrap_or_default();
                infer(&data, limits, depth)
            }
        })
        .collect()
}

fn infer(data: &[u8], limits: &Limits, depth: usize) -> GenericValue {
    if !data.is_empty() {
        if depth < limits.max_depth {
            let nested = decode_parts(data);
            if nested.is_complete() {
                return GenericValue::Nested(decode_values(&nested.parts, limits, depth + 1));
            }
        } else {
            debug!(depth, "nesting limit reached, not probing for a nested message");
        }
    }
    string_or_bytes(data)
}

fn string_or_bytes(data: &[u8]) -> GenericValue {
    match std::str::from_utf8(data) {
        Ok(text) => GenericValue::String(text.to_owned()),
        Err(_) => GenericValue::Bytes(data.to_vec()),
    }
}

impl From<GenericValue> for Value {
    fn from(value: GenericValue) -> Self {
        match value {
            GenericValue::Integer(value) => Value::BigUint(value),
            GenericValue::String(value) => Value::String(value),
            GenericValue::Bytes(value) => Value::Bytes(value),
            GenericValue::Nested(values) => {
                Value::List(values.into_iter().map(Value::from).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Uint(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Uint(value)
    }
}

impl From<BigUint> for Value {
    fn from(value: BigUint) -> Self {
        Value::BigUint(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::List(values)
    }
}
