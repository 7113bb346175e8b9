//! Typed records.
//!
//! A [`Record`] lists its fields together with their field numbers and typed
//! slots. The slot variant is the declared kind of the field, so unlike the
//! schema-less path no guessing is needed: the target type decides how a
//! payload is read.
//!
//! Most records are declared with the [`record!`](crate::record!) macro.

use std::collections::{BTreeMap, HashMap};

use num_bigint::BigUint;
use num_traits::Zero;
use tracing::trace;

use crate::varint::{decode_varint, truncate_to_u64};
use crate::wire::{Payload, WirePart};
use crate::{decode_parts, generic_encode, Error, Limits, Value};

/// One declared field of a record.
#[derive(Debug)]
pub struct Field<S> {
    pub name: &'static str,
    /// Fields without a number are declared but never written to or read from the wire.
    pub number: Option<u32>,
    pub slot: S,
}

/// A struct whose fields map to field numbers.
///
/// The fields are encoded in the order they are listed.
pub trait Record {
    fn fields(&self) -> Vec<Field<FieldRef<'_>>>;
    fn fields_mut(&mut self) -> Vec<Field<FieldMut<'_>>>;
}

/// Read access to a field, tagged with its kind.
pub enum FieldRef<'a> {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    /// Kept at full width in the part. Only the low 64 bits reach the wire.
    BigUint(&'a BigUint),
    Bool(bool),
    Float(f32),
    Double(f64),
    String(&'a str),
    Bytes(&'a [u8]),
    Message(&'a dyn Record),
    OptionalMessage(Option<&'a dyn Record>),
    Repeated(&'a dyn RepeatedField),
    /// A field type without a wire mapping. The name is used in the error.
    Unsupported(&'static str),
}

/// Write access to a field, tagged with its kind.
pub enum FieldMut<'a> {
    Int8(&'a mut i8),
    Int16(&'a mut i16),
    Int32(&'a mut i32),
    Int64(&'a mut i64),
    Uint8(&'a mut u8),
    Uint16(&'a mut u16),
    Uint32(&'a mut u32),
    Uint64(&'a mut u64),
    BigUint(&'a mut BigUint),
    Bool(&'a mut bool),
    Float(&'a mut f32),
    Double(&'a mut f64),
    String(&'a mut String),
    Bytes(&'a mut Vec<u8>),
    Message(&'a mut dyn Record),
    OptionalMessage(&'a mut dyn OptionalRecord),
    Repeated(&'a mut dyn RepeatedField),
    Unsupported(&'static str),
}

/// Types that can be a field of a [`Record`].
pub trait FieldType {
    fn as_field(&self) -> FieldRef<'_>;
    fn as_field_mut(&mut self) -> FieldMut<'_>;
}

/// An optional nested record, i.e. `Option<Box<T>>`.
pub trait OptionalRecord {
    fn get(&self) -> Option<&dyn Record>;

    /// Runs `decode` on a fresh default record and stores it if that succeeds.
    fn fill(
        &mut self,
        decode: &mut dyn FnMut(&mut dyn Record) -> Result<(), Error>,
    ) -> Result<(), Error>;
}

/// A sequence of scalars or strings, encoded as one nested message whose
/// field numbers are the 1-based element positions.
pub trait RepeatedField {
    fn to_values(&self) -> Vec<Value>;

    /// Replaces the content with one element per part.
    fn assign(&mut self, field: &'static str, parts: &[WirePart]) -> Result<(), Error>;
}

/// Element types of a [`RepeatedField`].
pub trait Element: Sized {
    fn to_value(&self) -> Value;
    fn from_payload(field: &'static str, payload: &Payload) -> Result<Self, Error>;
}

/// Maps a record to parts in field declaration order.
///
/// ## Example
///
/// ```
/// use partbuf::{encode_parts, record, record_to_parts};
///
/// record! {
///     #[derive(Default)]
///     struct Point {
///         x: i32 = 1,
///         y: i32 = 2,
///         label: String,
///     }
/// }
///
/// let point = Point { x: 3, y: -1, label: "ignored".to_string() };
/// let parts = record_to_parts(&point).unwrap();
/// assert_eq!(parts.len(), 2);
/// assert_eq!(
///     encode_parts(&parts),
///     [0x08, 0x03, 0x10, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]
/// );
/// ```
pub fn record_to_parts(record: &dyn Record) -> Result<Vec<WirePart>, Error> {
    let mut parts = Vec::new();
    for field in record.fields() {
        let Some(number) = field.number else {
            trace!(field = field.name, "field has no number, skipping");
            continue;
        };
        let payload = match field.slot {
            // signed values are sign extended to 64 bits, like protobuf does
            FieldRef::Int8(value) => Payload::Varint((i64::from(value) as u64).into()),
            FieldRef::Int16(value) => Payload::Varint((i64::from(value) as u64).into()),
            FieldRef::Int32(value) => Payload::Varint((i64::from(value) as u64).into()),
            FieldRef::Int64(value) => Payload::Varint((value as u64).into()),
            FieldRef::Uint8(value) => Payload::Varint(value.into()),
            FieldRef::Uint16(value) => Payload::Varint(value.into()),
            FieldRef::Uint32(value) => Payload::Varint(value.into()),
            FieldRef::Uint64(value) => Payload::Varint(value.into()),
            FieldRef::BigUint(value) => Payload::Varint(value.clone()),
            FieldRef::Bool(value) => Payload::Varint(u8::from(value).into()),
            FieldRef::Float(value) => Payload::Fixed32(value.to_le_bytes()),
            FieldRef::Double(value) => Payload::Fixed64(value.to_le_bytes()),
            FieldRef::String(value) => Payload::Bytes(value.as_bytes().to_vec()),
            FieldRef::Bytes(value) => Payload::Bytes(value.to_vec()),
            FieldRef::Message(nested) => Payload::Message(record_to_parts(nested)?),
            FieldRef::OptionalMessage(Some(nested)) => Payload::Message(record_to_parts(nested)?),
            FieldRef::OptionalMessage(None) => continue,
            FieldRef::Repeated(values) => Payload::Message(generic_encode(&values.to_values())),
            FieldRef::Unsupported(kind) => {
                return Err(Error::UnsupportedFieldKind {
                    field: field.name,
                    kind,
                })
            }
        };
        parts.push(WirePart::new(number, payload));
    }
    Ok(parts)
}

/// Fills `target` from parts.
///
/// For every numbered field the first part with that number is used. Parts
/// without a matching field are ignored. Processing stops at the first error;
/// fields written before it keep their new values.
pub fn parts_to_record(parts: &[WirePart], target: &mut dyn Record) -> Result<(), Error> {
    parts_to_record_with_limits(parts, target, &Limits::default())
}

/// Like [`parts_to_record`], failing with [`Error::RecursionLimitExceeded`]
/// when nested records go deeper than `limits.max_depth`.
pub fn parts_to_record_with_limits(
    parts: &[WirePart],
    target: &mut dyn Record,
    limits: &Limits,
) -> Result<(), Error> {
    fill_record(parts, target, limits, 0)
}

fn fill_record(
    parts: &[WirePart],
    target: &mut dyn Record,
    limits: &Limits,
    depth: usize,
) -> Result<(), Error> {
    for field in target.fields_mut() {
        let Some(number) = field.number else {
            continue;
        };
        let Some(part) = parts.iter().find(|part| part.field_number == number) else {
            continue;
        };
        assign(field.name, field.slot, &part.payload, limits, depth)?;
    }
    Ok(())
}

fn assign(
    name: &'static str,
    slot: FieldMut<'_>,
    payload: &Payload,
    limits: &Limits,
    depth: usize,
) -> Result<(), Error> {
    match slot {
        // narrowing keeps the low bits, so sign extended values come back intact
        FieldMut::Int8(target) => *target = integer(name, "int8", payload)? as i8,
        FieldMut::Int16(target) => *target = integer(name, "int16", payload)? as i16,
        FieldMut::Int32(target) => *target = integer(name, "int32", payload)? as i32,
        FieldMut::Int64(target) => *target = integer(name, "int64", payload)? as i64,
        FieldMut::Uint8(target) => *target = integer(name, "uint8", payload)? as u8,
        FieldMut::Uint16(target) => *target = integer(name, "uint16", payload)? as u16,
        FieldMut::Uint32(target) => *target = integer(name, "uint32", payload)? as u32,
        FieldMut::Uint64(target) => *target = integer(name, "uint64", payload)?,
        FieldMut::BigUint(target) => *target = wide_integer(name, "biguint", payload)?,
        FieldMut::Bool(target) => *target = boolean(name, payload)?,
        FieldMut::Float(target) => *target = float(name, payload)?,
        FieldMut::Double(target) => *target = double(name, payload)?,
        FieldMut::String(target) => *target = string(name, payload)?,
        FieldMut::Bytes(target) => *target = delimited(name, "bytes", payload)?,
        FieldMut::Message(nested) => {
            let parts = nested_parts(name, payload, limits, depth)?;
            fill_record(&parts, nested, limits, depth + 1)?;
        }
        FieldMut::OptionalMessage(nested) => {
            let parts = nested_parts(name, payload, limits, depth)?;
            nested.fill(&mut |record: &mut dyn Record| {
                fill_record(&parts, record, limits, depth + 1)
            })?;
        }
        FieldMut::Repeated(values) => {
            let parts = nested_parts(name, payload, limits, depth)?;
            values.assign(name, &parts)?;
        }
        FieldMut::Unsupported(kind) => {
            return Err(Error::UnsupportedFieldKind { field: name, kind })
        }
    }
    Ok(())
}

fn mismatch(field: &'static str, expected: &'static str, payload: &Payload) -> Error {
    Error::TypeCoercion {
        field,
        expected,
        found: payload.wire_type(),
    }
}

/// Decodes a length-delimited payload as a complete nested message.
fn nested_parts(
    name: &'static str,
    payload: &Payload,
    limits: &Limits,
    depth: usize,
) -> Result<Vec<WirePart>, Error> {
    if depth >= limits.max_depth {
        return Err(Error::RecursionLimitExceeded {
            limit: limits.max_depth,
        });
    }
    let data = payload
        .delimited()
        .ok_or_else(|| mismatch(name, "message", payload))?;
    decode_parts(&data).into_complete()
}

/// Varints and fixed64 payloads, the latter read as a varint like the
/// integer it was written from.
fn wide_integer(
    name: &'static str,
    expected: &'static str,
    payload: &Payload,
) -> Result<BigUint, Error> {
    match payload {
        Payload::Varint(value) => Ok(value.clone()),
        Payload::Fixed64(data) => Ok(decode_varint(data)?.0),
        _ => Err(mismatch(name, expected, payload)),
    }
}

fn integer(name: &'static str, expected: &'static str, payload: &Payload) -> Result<u64, Error> {
    wide_integer(name, expected, payload).map(|value| truncate_to_u64(&value))
}

fn boolean(name: &'static str, payload: &Payload) -> Result<bool, Error> {
    match payload {
        Payload::Varint(value) => Ok(!value.is_zero()),
        Payload::Fixed64(data) => Ok(data.iter().any(|byte| *byte != 0)),
        Payload::Fixed32(data) => Ok(data.iter().any(|byte| *byte != 0)),
        _ => Err(mismatch(name, "bool", payload)),
    }
}

fn float(name: &'static str, payload: &Payload) -> Result<f32, Error> {
    match payload {
        Payload::Fixed32(data) => Ok(f32::from_le_bytes(*data)),
        _ => Err(mismatch(name, "float", payload)),
    }
}

fn double(name: &'static str, payload: &Payload) -> Result<f64, Error> {
    match payload {
        Payload::Fixed64(data) => Ok(f64::from_le_bytes(*data)),
        _ => Err(mismatch(name, "double", payload)),
    }
}

fn delimited(
    name: &'static str,
    expected: &'static str,
    payload: &Payload,
) -> Result<Vec<u8>, Error> {
    payload
        .delimited()
        .map(|data| data.into_owned())
        .ok_or_else(|| mismatch(name, expected, payload))
}

fn string(name: &'static str, payload: &Payload) -> Result<String, Error> {
    let data = delimited(name, "string", payload)?;
    String::from_utf8(data).map_err(|_| mismatch(name, "string", payload))
}

macro_rules! impl_field_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl FieldType for $ty {
            fn as_field(&self) -> FieldRef<'_> {
                FieldRef::$variant(*self)
            }

            fn as_field_mut(&mut self) -> FieldMut<'_> {
                FieldMut::$variant(self)
            }
        }
    )*};
}

impl_field_type! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    bool => Bool,
    f32 => Float,
    f64 => Double,
}

impl FieldType for String {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::String(self)
    }

    fn as_field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::String(self)
    }
}

impl FieldType for BigUint {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::BigUint(self)
    }

    fn as_field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::BigUint(self)
    }
}

impl FieldType for Vec<u8> {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Bytes(self)
    }

    fn as_field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Bytes(self)
    }
}

impl<T: Record> FieldType for Box<T> {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Message(&**self)
    }

    fn as_field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Message(&mut **self)
    }
}

impl<T: Record + Default> FieldType for Option<Box<T>> {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::OptionalMessage(OptionalRecord::get(self))
    }

    fn as_field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::OptionalMessage(self)
    }
}

impl<T: Record + Default> OptionalRecord for Option<Box<T>> {
    fn get(&self) -> Option<&dyn Record> {
        self.as_deref().map(|record| record as &dyn Record)
    }

    fn fill(
        &mut self,
        decode: &mut dyn FnMut(&mut dyn Record) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let mut record = Box::<T>::default();
        decode(&mut *record)?;
        *self = Some(record);
        Ok(())
    }
}

// Maps have no wire mapping in this crate
impl<K, V, S> FieldType for HashMap<K, V, S> {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Unsupported("map")
    }

    fn as_field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Unsupported("map")
    }
}

impl<K, V> FieldType for BTreeMap<K, V> {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Unsupported("map")
    }

    fn as_field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Unsupported("map")
    }
}

impl<T: Element> RepeatedField for Vec<T> {
    fn to_values(&self) -> Vec<Value> {
        self.iter().map(Element::to_value).collect()
    }

    fn assign(&mut self, field: &'static str, parts: &[WirePart]) -> Result<(), Error> {
        *self = parts
            .iter()
            .map(|part| T::from_payload(field, &part.payload))
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}

macro_rules! impl_repeated {
    ($($ty:ty),* $(,)?) => {$(
        impl FieldType for Vec<$ty> {
            fn as_field(&self) -> FieldRef<'_> {
                FieldRef::Repeated(self)
            }

            fn as_field_mut(&mut self) -> FieldMut<'_> {
                FieldMut::Repeated(self)
            }
        }
    )*};
}

impl_repeated!(i32, i64, u32, u64, bool, f32, f64, String);

impl Element for i32 {
    fn to_value(&self) -> Value {
        Value::Int((*self).into())
    }

    fn from_payload(field: &'static str, payload: &Payload) -> Result<Self, Error> {
        Ok(integer(field, "int32", payload)? as i32)
    }
}

impl Element for i64 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_payload(field: &'static str, payload: &Payload) -> Result<Self, Error> {
        Ok(integer(field, "int64", payload)? as i64)
    }
}

impl Element for u32 {
    fn to_value(&self) -> Value {
        Value::Uint((*self).into())
    }

    fn from_payload(field: &'static str, payload: &Payload) -> Result<Self, Error> {
        Ok(integer(field, "uint32", payload)? as u32)
    }
}

impl Element for u64 {
    fn to_value(&self) -> Value {
        Value::Uint(*self)
    }

    fn from_payload(field: &'static str, payload: &Payload) -> Result<Self, Error> {
        integer(field, "uint64", payload)
    }
}

impl Element for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_payload(field: &'static str, payload: &Payload) -> Result<Self, Error> {
        boolean(field, payload)
    }
}

impl Element for f32 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_payload(field: &'static str, payload: &Payload) -> Result<Self, Error> {
        float(field, payload)
    }
}

impl Element for f64 {
    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    fn from_payload(field: &'static str, payload: &Payload) -> Result<Self, Error> {
        double(field, payload)
    }
}

impl Element for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_payload(field: &'static str, payload: &Payload) -> Result<Self, Error> {
        string(field, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode_parts, record, WireType};
    use hex_literal::hex;

    record! {
        #[derive(Debug, Default, PartialEq)]
        struct Inner {
            id: i64 = 1,
            name: String = 2,
        }

        #[derive(Debug, Default, PartialEq)]
        struct Outer {
            small: i32 = 1,
            flag: bool = 2,
            ratio: f32 = 3,
            inner: Inner = 4,
            maybe: Option<Box<Inner>> = 5,
            tags: Vec<String> = 6,
            raw: Vec<u8> = 7,
            cache: u64,
        }

        #[derive(Debug, Default, PartialEq)]
        struct Holder {
            boxed: Box<Inner> = 1,
            flags: Vec<bool> = 2,
            ratios: Vec<f32> = 3,
            precise: Vec<f64> = 4,
            signed: Vec<i32> = 5,
            counts: Vec<u32> = 6,
            totals: Vec<u64> = 7,
        }

        #[derive(Debug, Default, PartialEq)]
        struct Narrow {
            tiny: i8 = 1,
            short: i16 = 2,
            byte: u8 = 3,
            word: u16 = 4,
            wide: BigUint = 5,
        }

        #[derive(Debug, Default)]
        struct WithMap {
            id: u32 = 1,
            lookup: HashMap<String, u32> = 2,
        }

        #[derive(Debug, Default, PartialEq)]
        struct Chain {
            value: u32 = 1,
            next: Option<Box<Chain>> = 2,
        }
    }

    #[test]
    fn record_to_parts_works() {
        let outer = Outer {
            small: -2,
            flag: false,
            ratio: 0.5,
            inner: Inner {
                id: 7,
                name: String::new(),
            },
            maybe: None,
            tags: vec!["a".to_string(), String::new()],
            raw: vec![],
            cache: 99,
        };
        let parts = record_to_parts(&outer).unwrap();
        let numbers: Vec<_> = parts.iter().map(|p| p.field_number).collect();
        // no part for `maybe` (None) and `cache` (no number)
        assert_eq!(numbers, [1, 2, 3, 4, 6, 7]);

        assert_eq!(parts[0].payload, Payload::Varint(u64::MAX.wrapping_sub(1).into()));
        assert_eq!(parts[1].payload, Payload::Varint(0u8.into()));
        assert_eq!(parts[2].payload, Payload::Fixed32(0.5f32.to_le_bytes()));
        assert_eq!(
            parts[3].payload,
            Payload::Message(vec![WirePart::varint(1, 7u8), WirePart::bytes(2, "")])
        );
        assert_eq!(encode_parts(&parts[4..5]), hex!("3205 0a0161 1200"));
        assert_eq!(parts[5].payload, Payload::Bytes(vec![]));
    }

    #[test]
    fn parts_to_record_works() {
        let original = Outer {
            small: i32::MIN,
            flag: true,
            ratio: -3.25,
            inner: Inner {
                id: -1234567890123456789,
                name: "inner".to_string(),
            },
            maybe: Some(Box::new(Inner {
                id: 1,
                name: "boxed".to_string(),
            })),
            tags: vec!["x".to_string(), "".to_string(), "z".to_string()],
            raw: vec![0xff, 0x00, 0x10],
            cache: 5,
        };
        let bytes = encode_parts(&record_to_parts(&original).unwrap());

        let mut decoded = Outer::default();
        parts_to_record(&decode_parts(&bytes).parts, &mut decoded).unwrap();
        assert_eq!(decoded, Outer { cache: 0, ..original });
    }

    #[test]
    fn parts_to_record_accepts_unencoded_parts() {
        let original = Outer {
            inner: Inner {
                id: 3,
                name: "n".to_string(),
            },
            tags: vec!["t".to_string()],
            ..Outer::default()
        };
        let parts = record_to_parts(&original).unwrap();
        let mut decoded = Outer::default();
        parts_to_record(&parts, &mut decoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn first_part_wins_and_unknown_fields_are_ignored() {
        let parts = vec![
            WirePart::varint(99, 1u8),
            WirePart::varint(1, 10u8),
            WirePart::bytes(42, vec![0xffu8]),
            WirePart::varint(1, 20u8),
        ];
        let mut decoded = Inner::default();
        parts_to_record(&parts, &mut decoded).unwrap();
        assert_eq!(decoded.id, 10);
        assert_eq!(decoded.name, "");
    }

    #[test]
    fn integers_read_fixed64_as_varint() {
        let mut decoded = Inner::default();
        parts_to_record(
            &[WirePart::fixed64(1, [0xac, 0x02, 0, 0, 0, 0, 0, 0])],
            &mut decoded,
        )
        .unwrap();
        assert_eq!(decoded.id, 300);

        let err = parts_to_record(&[WirePart::fixed64(1, [0xff; 8])], &mut decoded).unwrap_err();
        assert_eq!(err, Error::TruncatedVarint);
        assert_eq!(decoded.id, 300);

        let err =
            parts_to_record(&[WirePart::bytes(1, vec![0xacu8, 0x02])], &mut decoded).unwrap_err();
        assert_eq!(
            err,
            Error::TypeCoercion {
                field: "id",
                expected: "int64",
                found: WireType::LengthDelimited
            }
        );

        let err = parts_to_record(&[WirePart::fixed32(1, [0; 4])], &mut decoded).unwrap_err();
        assert_eq!(
            err,
            Error::TypeCoercion {
                field: "id",
                expected: "int64",
                found: WireType::Fixed32
            }
        );
    }

    #[test]
    fn boxed_and_repeated_fields_roundtrip() {
        let original = Holder {
            boxed: Box::new(Inner {
                id: -9,
                name: "leaf".to_string(),
            }),
            flags: vec![true, false, true],
            ratios: vec![0.25, -1.5],
            precise: vec![1.23456789, f64::MIN_POSITIVE],
            signed: vec![-1, i32::MIN, 7],
            counts: vec![0, 300, u32::MAX],
            totals: vec![u64::MAX, 1],
        };
        let parts = record_to_parts(&original).unwrap();
        assert_eq!(
            parts[0].payload,
            Payload::Message(vec![
                WirePart::varint(1, -9i64 as u64),
                WirePart::bytes(2, "leaf"),
            ])
        );
        assert_eq!(encode_parts(&parts[1..2]), hex!("12 06 0801 1000 1801"));

        let mut decoded = Holder::default();
        parts_to_record(&decode_parts(&encode_parts(&parts)).parts, &mut decoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn narrow_and_wide_integers_roundtrip() {
        let original = Narrow {
            tiny: -128,
            short: -300,
            byte: 255,
            word: 65535,
            wide: BigUint::from(u64::MAX),
        };
        let parts = record_to_parts(&original).unwrap();
        assert_eq!(parts[0].payload, Payload::Varint((-128i64 as u64).into()));

        let mut decoded = Narrow::default();
        parts_to_record(&decode_parts(&encode_parts(&parts)).parts, &mut decoded).unwrap();
        assert_eq!(decoded, original);

        // narrowing keeps the low bits
        parts_to_record(&[WirePart::varint(3, 0x1ffu32)], &mut decoded).unwrap();
        assert_eq!(decoded.byte, 0xff);

        // a BigUint field takes the varint at full width
        let wide = (BigUint::from(1u8) << 70usize) + 3u32;
        parts_to_record(&[WirePart::varint(5, wide.clone())], &mut decoded).unwrap();
        assert_eq!(decoded.wide, wide);
    }

    #[test]
    fn wide_varints_are_truncated() {
        let wide = (num_bigint::BigUint::from(1u8) << 64usize) + 5u32;
        let mut decoded = Inner::default();
        parts_to_record(&[WirePart::varint(1, wide)], &mut decoded).unwrap();
        assert_eq!(decoded.id, 5);
    }

    #[test]
    fn bool_accepts_integer_like_payloads() {
        let mut decoded = Outer::default();
        parts_to_record(&[WirePart::varint(2, 7u8)], &mut decoded).unwrap();
        assert!(decoded.flag);
        parts_to_record(&[WirePart::varint(2, 0u8)], &mut decoded).unwrap();
        assert!(!decoded.flag);
        parts_to_record(&[WirePart::fixed32(2, [0, 0, 1, 0])], &mut decoded).unwrap();
        assert!(decoded.flag);

        let err = parts_to_record(&[WirePart::bytes(2, "yes")], &mut decoded).unwrap_err();
        assert!(matches!(err, Error::TypeCoercion { field: "flag", .. }));
    }

    #[test]
    fn type_mismatches_fail() {
        let mut decoded = Outer::default();

        let err = parts_to_record(&[WirePart::fixed64(3, [0; 8])], &mut decoded).unwrap_err();
        assert_eq!(
            err,
            Error::TypeCoercion {
                field: "ratio",
                expected: "float",
                found: WireType::Fixed64
            }
        );

        let err = parts_to_record(&[WirePart::varint(6, 1u8)], &mut decoded).unwrap_err();
        assert!(matches!(err, Error::TypeCoercion { field: "tags", expected: "message", .. }));

        let mut inner = Inner::default();
        let err =
            parts_to_record(&[WirePart::bytes(2, vec![0xffu8, 0xfe])], &mut inner).unwrap_err();
        assert_eq!(
            err,
            Error::TypeCoercion {
                field: "name",
                expected: "string",
                found: WireType::LengthDelimited
            }
        );
    }

    #[test]
    fn repeated_elements_must_convert() {
        // tags = [1] is a varint element, not a string
        let parts = vec![WirePart::message(6, vec![WirePart::varint(1, 1u8)])];
        let mut decoded = Outer::default();
        let err = parts_to_record(&parts, &mut decoded).unwrap_err();
        assert_eq!(
            err,
            Error::TypeCoercion {
                field: "tags",
                expected: "string",
                found: WireType::Varint
            }
        );
    }

    #[test]
    fn errors_keep_earlier_fields() {
        let parts = vec![WirePart::varint(1, 8u8), WirePart::varint(3, 1u8)];
        let mut decoded = Outer::default();
        assert!(parts_to_record(&parts, &mut decoded).is_err());
        assert_eq!(decoded.small, 8);
    }

    #[test]
    fn nested_message_must_decode_completely() {
        let parts = vec![WirePart::bytes(4, vec![0x08u8])];
        let mut decoded = Outer::default();
        let err = parts_to_record(&parts, &mut decoded).unwrap_err();
        assert_eq!(err, Error::TruncatedVarint);

        // the optional record is left untouched
        let parts = vec![WirePart::bytes(5, vec![0x12u8, 0x01, 0xff])];
        let err = parts_to_record(&parts, &mut decoded).unwrap_err();
        assert!(matches!(err, Error::TypeCoercion { field: "name", .. }));
        assert_eq!(decoded.maybe, None);
    }

    #[test]
    fn maps_are_unsupported() {
        let with_map = WithMap {
            id: 1,
            lookup: HashMap::new(),
        };
        assert_eq!(
            record_to_parts(&with_map).unwrap_err(),
            Error::UnsupportedFieldKind {
                field: "lookup",
                kind: "map"
            }
        );

        let mut decoded = WithMap::default();
        let parts = vec![WirePart::varint(1, 4u8), WirePart::bytes(2, "")];
        assert_eq!(
            parts_to_record(&parts, &mut decoded).unwrap_err(),
            Error::UnsupportedFieldKind {
                field: "lookup",
                kind: "map"
            }
        );
        assert_eq!(decoded.id, 4);

        // without a part for the map field nothing is reported
        parts_to_record(&parts[..1], &mut decoded).unwrap();
    }

    #[test]
    fn recursion_is_limited() {
        let mut chain = Chain { value: 0, next: None };
        for value in 1..=5 {
            chain = Chain {
                value,
                next: Some(Box::new(chain)),
            };
        }
        let parts = record_to_parts(&chain).unwrap();

        let mut decoded = Chain::default();
        parts_to_record(&parts, &mut decoded).unwrap();
        assert_eq!(decoded, chain);

        let mut decoded = Chain::default();
        let err = parts_to_record_with_limits(&parts, &mut decoded, &Limits::new(3)).unwrap_err();
        assert_eq!(err, Error::RecursionLimitExceeded { limit: 3 });
    }
}
