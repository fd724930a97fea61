//! # Error Types
//!
//! Errors produced by the foundational layer. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Decode errors carry a machine-readable [`DecodeErrorCode`] alongside the
//!   human message and the position (line, column, byte offset) of the fault,
//!   so callers can report them without parsing strings.
//! - Pointer errors name the offending input verbatim.

use std::fmt;

use thiserror::Error;

/// Machine-readable classification of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorCode {
    /// Structurally invalid JSON (bad token, malformed escape, missing comma).
    Syntax,
    /// Input ended before a complete value was read. Covers empty input.
    UnexpectedEof,
    /// A complete value was followed by non-whitespace characters.
    TrailingCharacters,
    /// Nesting exceeded [`crate::decode::MAX_DEPTH`].
    DepthExceeded,
    /// The input bytes are not valid UTF-8.
    InvalidUtf8,
    /// Well-formed JSON that does not fit the requested Rust type.
    Data,
}

impl DecodeErrorCode {
    /// Returns the stable code string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::UnexpectedEof => "eof",
            Self::TrailingCharacters => "trailing",
            Self::DepthExceeded => "depth",
            Self::InvalidUtf8 => "utf8",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for DecodeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JSON document could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{code}] {message} at line {line} column {column}")]
pub struct DecodeError {
    /// Classification of the failure.
    pub code: DecodeErrorCode,
    /// Human-readable description, without position information.
    pub message: String,
    /// 1-based line of the fault.
    pub line: usize,
    /// 1-based column of the fault (0 when the input is empty).
    pub column: usize,
    /// Byte offset of the fault in the input.
    pub offset: usize,
}

/// A string is not a valid JSON Pointer or URI fragment pointer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// Non-empty pointers must start with `/`.
    #[error("JSON pointer must be empty or start with '/': {0:?}")]
    MissingLeadingSlash(String),

    /// A `~` not followed by `0` or `1`.
    #[error("invalid escape sequence in JSON pointer segment: {0:?}")]
    InvalidEscape(String),

    /// A URI fragment with a malformed `%XX` sequence or non-UTF-8 result.
    #[error("invalid percent-encoding in URI fragment: {0:?}")]
    InvalidPercentEncoding(String),
}
