//! # JSON Pointer (RFC 6901)
//!
//! [`JsonPointer`] identifies a location inside a JSON document. It is used
//! in two directions:
//!
//! - **Reporting:** validation errors carry the pointer of the offending
//!   instance node (`/items/0/name`). [`escape_segment`] applies the `~0` /
//!   `~1` escaping rules when segments are appended.
//! - **Resolving:** `$ref` fragments such as `#/definitions/a%20b` are parsed
//!   with [`JsonPointer::from_uri_fragment`] (percent-decoding, then
//!   unescaping) and resolved against a schema document.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::error::PointerError;

/// A parsed JSON Pointer: a sequence of unescaped reference tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    /// The empty pointer, which refers to the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a pointer in its JSON string representation (`/a/b~1c`).
    ///
    /// # Errors
    ///
    /// Returns [`PointerError::MissingLeadingSlash`] for non-empty input not
    /// starting with `/`, and [`PointerError::InvalidEscape`] for a `~` not
    /// followed by `0` or `1`.
    pub fn parse(pointer: &str) -> Result<Self, PointerError> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let rest = pointer
            .strip_prefix('/')
            .ok_or_else(|| PointerError::MissingLeadingSlash(pointer.to_string()))?;
        let segments = rest
            .split('/')
            .map(unescape_segment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Parse the fragment part of a URI (without the leading `#`).
    ///
    /// The fragment is percent-decoded before being parsed as a pointer.
    pub fn from_uri_fragment(fragment: &str) -> Result<Self, PointerError> {
        let decoded = percent_decode(fragment)?;
        Self::parse(&decoded)
    }

    /// Returns true for the empty pointer.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Unescaped reference tokens, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Append a reference token (unescaped form).
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Remove and return the last reference token.
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// A new pointer one level deeper.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push(segment);
        next
    }

    /// A new pointer formed by appending all tokens of `other`.
    pub fn join(&self, other: &JsonPointer) -> Self {
        let mut next = self.clone();
        next.segments.extend(other.segments.iter().cloned());
        next
    }

    /// Every proper prefix of this pointer, shortest first, ending with the
    /// pointer itself.
    pub fn prefixes(&self) -> impl Iterator<Item = JsonPointer> + '_ {
        (0..=self.segments.len()).map(move |n| JsonPointer {
            segments: self.segments[..n].to_vec(),
        })
    }

    /// Look up the value this pointer designates.
    ///
    /// Array tokens must be canonical decimal indices (no sign, no leading
    /// zeros); anything else fails to resolve.
    pub fn resolve<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(document, |current, token| match current {
                Value::Object(map) => map.get(token),
                Value::Array(items) => parse_index(token).and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// Render as a URI fragment (without the leading `#`), percent-encoding
    /// characters that are not allowed in fragments.
    pub fn to_uri_fragment(&self) -> String {
        percent_encode_fragment(&self.to_string())
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", escape_segment(segment))?;
        }
        Ok(())
    }
}

impl std::str::FromStr for JsonPointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Escape one reference token: `~` becomes `~0`, `/` becomes `~1`.
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains(['~', '/']) {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Reverse of [`escape_segment`].
///
/// # Errors
///
/// Returns [`PointerError::InvalidEscape`] for a dangling or unknown `~`
/// escape.
pub fn unescape_segment(segment: &str) -> Result<String, PointerError> {
    if !segment.contains('~') {
        return Ok(segment.to_string());
    }
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return Err(PointerError::InvalidEscape(segment.to_string())),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn parse_index(token: &str) -> Option<usize> {
    let canonical = token == "0" || (!token.starts_with('0') && !token.is_empty());
    if canonical && token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

fn percent_decode(input: &str) -> Result<String, PointerError> {
    if !input.contains('%') {
        return Ok(input.to_string());
    }
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| PointerError::InvalidPercentEncoding(input.to_string()))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| PointerError::InvalidPercentEncoding(input.to_string()))
}

fn percent_encode_fragment(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        let allowed = c.is_ascii_alphanumeric() || "-._~!$&'()*+,;=:@/?".contains(c);
        if allowed {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{b:02X}"));
            }
        }
    }
    out
}
