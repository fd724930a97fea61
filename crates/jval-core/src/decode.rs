//! # Document Decoder
//!
//! Parses raw JSON text into a [`serde_json::Value`] tree and reports
//! failures as positioned [`DecodeError`]s, distinct from any later schema
//! validation outcome.
//!
//! ## Fidelity
//!
//! The workspace enables `serde_json`'s `preserve_order` feature, so object
//! keys keep their document order through decode and [`encode`]. Numbers keep
//! the integer/float distinction of their literal: `1` decodes as an integer
//! and `1.0` as a float. Both properties matter to schema checks
//! (`type: integer` under draft-04, error ordering) and to round trips.
//!
//! Decoding is a pure function of its input.

use serde::de::DeserializeOwned;
use serde_json::error::Category;
use serde_json::Value;

use crate::error::{DecodeError, DecodeErrorCode};

/// Maximum nesting depth accepted by the decoder (the `serde_json` limit).
pub const MAX_DEPTH: usize = 128;

/// Decode JSON text into a value tree.
///
/// # Errors
///
/// Returns a [`DecodeError`] for malformed JSON, empty input, trailing
/// characters after the value, or nesting deeper than [`MAX_DEPTH`].
pub fn decode(text: &str) -> Result<Value, DecodeError> {
    serde_json::from_str(text).map_err(|e| from_serde(text, &e))
}

/// Decode JSON bytes, validating UTF-8 first.
///
/// # Errors
///
/// Returns [`DecodeErrorCode::InvalidUtf8`] when the bytes are not UTF-8,
/// otherwise the same errors as [`decode`].
pub fn decode_slice(bytes: &[u8]) -> Result<Value, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        let offset = e.valid_up_to();
        // The valid prefix is UTF-8 by definition.
        let prefix = String::from_utf8_lossy(&bytes[..offset]);
        let (line, column) = line_column(&prefix, offset);
        DecodeError {
            code: DecodeErrorCode::InvalidUtf8,
            message: "malformed UTF-8 characters, possibly incorrectly encoded".to_string(),
            line,
            column,
            offset,
        }
    })?;
    decode(text)
}

/// Decode JSON text directly into a caller-chosen type.
///
/// # Errors
///
/// Same as [`decode`], plus [`DecodeErrorCode::Data`] when the JSON is
/// well-formed but does not match the shape of `T`.
pub fn decode_as<T: DeserializeOwned>(text: &str) -> Result<T, DecodeError> {
    serde_json::from_str(text).map_err(|e| from_serde(text, &e))
}

/// Encode a value tree back to compact JSON text.
///
/// Key order and numeric kind are reproduced as decoded.
pub fn encode(value: &Value) -> String {
    value.to_string()
}

fn from_serde(text: &str, err: &serde_json::Error) -> DecodeError {
    let rendered = err.to_string();
    let suffix = format!(" at line {} column {}", err.line(), err.column());
    let message = rendered
        .strip_suffix(&suffix)
        .unwrap_or(&rendered)
        .to_string();

    let code = match err.classify() {
        Category::Eof => DecodeErrorCode::UnexpectedEof,
        Category::Data => DecodeErrorCode::Data,
        Category::Syntax | Category::Io => {
            if message.starts_with("trailing characters") {
                DecodeErrorCode::TrailingCharacters
            } else if message.starts_with("recursion limit exceeded") {
                DecodeErrorCode::DepthExceeded
            } else {
                DecodeErrorCode::Syntax
            }
        }
    };

    DecodeError {
        code,
        message,
        line: err.line(),
        column: err.column(),
        offset: offset_of(text, err.line(), err.column()),
    }
}

/// Byte offset of a 1-based (line, column) position, clamped to the input.
fn offset_of(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

/// 1-based (line, column) of the byte just past `prefix`.
fn line_column(prefix: &str, offset: usize) -> (usize, usize) {
    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map_or(0, |i| i + 1);
    (line, offset - line_start + 1)
}
