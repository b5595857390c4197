//! Binary record codec.
//!
//! Records use `bincode`'s fixed-int little-endian layout: identifiers,
//! stock, quantities and enum tags are 4-byte `i32`, amounts are 8-byte
//! `f64`, and every string or list carries a `u64` length prefix. Nothing is
//! terminated by a sentinel, so delimiter-like bytes inside a string cannot
//! confuse the parser.
//!
//! Decoding is bounded twice: each record may consume at most
//! [`MAX_RECORD_BYTES`] (checked by bincode before it allocates), and every
//! field is then checked against its own bound in [`wire`].

pub mod wire;

use std::fmt;

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::CodecError;

/// Hard ceiling on the encoded size of a single record.
pub const MAX_RECORD_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Product,
    User,
    Order,
    Transaction,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Product => write!(f, "product"),
            EntityKind::User => write!(f, "user"),
            EntityKind::Order => write!(f, "order"),
            EntityKind::Transaction => write!(f, "transaction"),
        }
    }
}

/// A persisted entity kind.
pub trait Record: Sized {
    const KIND: EntityKind;

    /// Appends the encoded record to `out`. On error `out` may hold a partial
    /// record and must be discarded.
    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Decodes one record from the front of `input`, advancing it.
    fn decode_from(input: &mut &[u8]) -> Result<Self, CodecError>;
}

pub(crate) fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_RECORD_BYTES)
        .allow_trailing_bytes()
}

pub(crate) fn write_value<T: Serialize>(value: &T, out: &mut Vec<u8>) -> Result<(), CodecError> {
    options()
        .serialize_into(out, value)
        .map_err(map_bincode_error)
}

pub(crate) fn read_value<T: DeserializeOwned>(input: &mut &[u8]) -> Result<T, CodecError> {
    options()
        .deserialize_from(&mut *input)
        .map_err(map_bincode_error)
}

fn map_bincode_error(err: bincode::Error) -> CodecError {
    match *err {
        bincode::ErrorKind::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            CodecError::Truncated
        }
        bincode::ErrorKind::SizeLimit => CodecError::LengthOutOfBounds {
            field: "record",
            len: MAX_RECORD_BYTES + 1,
            max: MAX_RECORD_BYTES,
        },
        bincode::ErrorKind::InvalidUtf8Encoding(e) => CodecError::invalid("string", e.to_string()),
        other => CodecError::Encoding(other.to_string()),
    }
}

/// Encodes a single record.
pub fn encode<R: Record>(record: &R) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    record.encode_into(&mut out)?;
    Ok(out)
}

/// Encodes a whole collection back to back, failing on the first bad record.
pub fn encode_all<R: Record>(records: &[R]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    for record in records {
        record.encode_into(&mut out)?;
    }
    Ok(out)
}

/// Decodes exactly one record; leftover bytes are an error.
pub fn decode<R: Record>(bytes: &[u8]) -> Result<R, CodecError> {
    let mut input = bytes;
    let record = R::decode_from(&mut input)?;
    if !input.is_empty() {
        return Err(CodecError::TrailingBytes(input.len()));
    }
    Ok(record)
}

/// Where a stream of records stopped being trustworthy.
#[derive(Debug, Clone, PartialEq)]
pub struct Corruption {
    pub kind: EntityKind,
    /// Index of the first record that failed to decode.
    pub index: usize,
    /// Byte offset at which that record starts.
    pub offset: usize,
    pub error: CodecError,
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} record #{} at byte {}: {}",
            self.kind, self.index, self.offset, self.error
        )
    }
}

/// Decodes records until the input is exhausted.
///
/// The first corrupt record ends the stream: everything before it is
/// returned, it and everything after it are dropped.
pub fn decode_stream<R: Record>(bytes: &[u8]) -> (Vec<R>, Option<Corruption>) {
    let mut records = Vec::new();
    let mut input = bytes;

    while !input.is_empty() {
        let offset = bytes.len() - input.len();
        match R::decode_from(&mut input) {
            Ok(record) => records.push(record),
            Err(error) => {
                let corruption = Corruption {
                    kind: R::KIND,
                    index: records.len(),
                    offset,
                    error,
                };
                return (records, Some(corruption));
            }
        }
    }

    (records, None)
}
