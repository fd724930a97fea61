//! # jval-core: Foundational Types for jval
//!
//! The leaf crate of the workspace. It turns raw JSON text into value trees
//! and defines the value-level semantics that schema validation builds on.
//! It depends on nothing internal.
//!
//! ## Modules
//!
//! - [`decode`]: JSON text → `serde_json::Value`, with positioned,
//!   machine-classified [`DecodeError`]s. Key order and integer/float
//!   literal kinds are preserved.
//! - [`pointer`]: RFC 6901 JSON Pointers for error locations and `$ref`
//!   fragment resolution.
//! - [`number`]: numeric comparison and `multipleOf` arithmetic where `1`
//!   and `1.0` are the same number.
//! - [`equality`]: structural equality for `enum`, `const` and
//!   `uniqueItems`.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - The value tree is `serde_json::Value` built with `preserve_order`; no
//!   parallel value type.

pub mod decode;
pub mod equality;
pub mod error;
pub mod number;
pub mod pointer;

// Re-export primary types for ergonomic imports.
pub use decode::{decode, decode_as, decode_slice, encode, MAX_DEPTH};
pub use equality::{first_duplicate, json_equal};
pub use error::{DecodeError, DecodeErrorCode, PointerError};
pub use pointer::{escape_segment, JsonPointer};
pub use serde_json::{Map, Number, Value};
