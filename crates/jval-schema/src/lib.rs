//! # jval-schema: JSON Schema Validation
//!
//! Validates JSON documents against JSON Schema (draft-04, draft-06 and
//! draft-07) and reports every violation with its instance location, a
//! human-readable message and the violated keyword.
//!
//! ## Pipeline
//!
//! ```text
//! identifier ──► SchemaLocator ──► SchemaLoader ──► Compiler ──► CompiledSchema
//!                                                                    │
//! raw JSON ──► jval_core::decode ──► Value ──────────────────► Engine ─► ValidationResult
//! ```
//!
//! - [`locator`]: the host-provided collaborator that maps identifiers to
//!   schema content, plus in-memory and directory implementations.
//! - [`loader`]: reads schema documents (JSON, or YAML by extension).
//! - [`compiler`]: resolves `$ref`, extracts keywords into typed
//!   [`node`]s and rejects cycles that would never terminate.
//! - [`engine`]: the recursive validation walk.
//! - [`validator`]: the [`JsonValidator`] facade and its schema [`cache`].
//!
//! ## Example
//!
//! ```
//! use jval_schema::{JsonValidator, MemoryLocator};
//!
//! let locator = MemoryLocator::from_schemas([(
//!     "item.json",
//!     r#"{"type": "object", "required": ["id"], "properties": {"id": {"type": "integer"}}}"#,
//! )])
//! .unwrap();
//! let validator = JsonValidator::new(locator);
//!
//! let result = validator.validate(r#"{"id": "abc"}"#, "item.json");
//! assert!(!result.is_valid());
//! assert_eq!(result.errors()[0].pointer.as_deref(), Some("/id"));
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `jval-core` internally.
//! - No network access: external `$ref` targets come from the locator or
//!   from `file:` URIs.
//! - Every failure reaches the caller as a [`ValidationError`] inside a
//!   [`ValidationResult`]; the facade has no other error channel.
//! - Logging goes through `tracing`; no subscriber is installed here.

pub mod cache;
pub mod collector;
pub mod compiler;
pub mod config;
pub mod draft;
pub mod engine;
pub mod error;
pub mod format;
pub mod loader;
pub mod locator;
pub mod node;
pub mod pattern;
pub mod result;
pub mod validator;

// Re-export primary types for ergonomic imports.
pub use cache::SchemaCache;
pub use collector::ErrorCollector;
pub use compiler::{CompiledSchema, Compiler};
pub use config::ValidatorOptions;
pub use draft::Draft;
pub use error::{LocateError, SchemaError};
pub use loader::{RawSchema, SchemaFormat, SchemaLoader};
pub use locator::{DirectoryLocator, MemoryLocator, SchemaLocation, SchemaLocator};
pub use result::{ErrorKind, Keyword, ValidationError, ValidationResult};
pub use validator::JsonValidator;
