use crate::wire::WireType;

/// Everything that can go wrong while decoding wire bytes or mapping parts
/// onto a [`Record`](crate::Record).
///
/// The wire-level variants never escape [`decode_parts`](crate::decode_parts)
/// as an `Err`; they are reported through
/// [`DecodedMessage::error`](crate::DecodedMessage::error) instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The buffer ended before a varint byte with the high bit cleared.
    #[error("buffer ended in the middle of a varint")]
    TruncatedVarint,
    /// A fixed or length-delimited payload is shorter than announced.
    #[error("{wire_type} payload is truncated ({available} bytes available)")]
    TruncatedPayload { wire_type: WireType, available: usize },
    /// The low 3 bits of a tag are not one of 0, 1, 2 or 5.
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),
    /// Field number must be between 1 and 536,870,911
    #[error("invalid field number")]
    InvalidFieldNumber,
    #[error("field `{field}` has unsupported kind {kind}")]
    UnsupportedFieldKind {
        field: &'static str,
        kind: &'static str,
    },
    #[error("field `{field}`: cannot convert {found} payload to {expected}")]
    TypeCoercion {
        field: &'static str,
        expected: &'static str,
        found: WireType,
    },
    #[error("nesting deeper than {limit} levels")]
    RecursionLimitExceeded { limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = Error::TypeCoercion {
            field: "name",
            expected: "string",
            found: WireType::Varint,
        };
        assert_eq!(
            err.to_string(),
            "field `name`: cannot convert varint payload to string"
        );

        let err = Error::TruncatedPayload {
            wire_type: WireType::Fixed32,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "fixed32 payload is truncated (2 bytes available)"
        );
    }
}
