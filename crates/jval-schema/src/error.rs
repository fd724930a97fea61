//! # Schema Errors
//!
//! Failures that prevent a schema from being used at all, as opposed to an
//! instance failing a schema. The facade turns every [`SchemaError`] into a
//! single reportable entry (see [`SchemaError::kind`]), so callers never see
//! a separate error channel.

use jval_core::DecodeError;
use thiserror::Error;

use crate::result::ErrorKind;

/// The schema locator could not map an identifier to a location.
///
/// Locator failure reasons are deliberately not distinguished.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("schema not found: {identifier}")]
pub struct LocateError {
    /// The identifier that was looked up.
    pub identifier: String,
}

impl LocateError {
    /// A lookup failure for `identifier`.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}

/// Errors raised while loading or compiling a schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The locator had no schema for this identifier.
    #[error("Unable to locate schema {identifier}")]
    NotFound {
        /// The identifier as supplied by the caller.
        identifier: String,
    },

    /// The schema was located but its content could not be read.
    #[error("Unable to read schema {location}: {reason}")]
    Unreadable {
        /// Path or URI of the schema.
        location: String,
        /// Reason the read failed.
        reason: String,
    },

    /// The schema document is not valid JSON.
    #[error("Schema {location} is not valid JSON: {source}")]
    InvalidJson {
        /// URI of the schema document.
        location: String,
        /// Underlying decode diagnostic.
        #[source]
        source: DecodeError,
    },

    /// The schema document is not valid YAML, or uses YAML-only constructs.
    #[error("Schema {location} is not valid YAML: {reason}")]
    InvalidYaml {
        /// URI of the schema document.
        location: String,
        /// Reason the conversion failed.
        reason: String,
    },

    /// A recognized keyword has a value of the wrong shape.
    #[error("Malformed schema at {location}: '{keyword}' {reason}")]
    Malformed {
        /// `<document uri>#<pointer>` of the offending schema object.
        location: String,
        /// The keyword whose value is malformed.
        keyword: String,
        /// What was expected.
        reason: String,
    },

    /// A `$ref` target could not be found.
    #[error("Unresolvable $ref '{reference}' from {base}: {reason}")]
    UnresolvableRef {
        /// The reference as written.
        reference: String,
        /// Base URI the reference was resolved against.
        base: String,
        /// Why resolution failed.
        reason: String,
    },

    /// `$ref` hops, or in-place subschema edges, that loop without
    /// descending into the instance.
    #[error("Reference cycle without progress: {}", chain.join(" -> "))]
    RefCycle {
        /// Locations on the cycle, in traversal order.
        chain: Vec<String>,
    },

    /// A `pattern` or `patternProperties` key is not a supported regular
    /// expression.
    #[error("Invalid regular expression '{pattern}' at {location}: {reason}")]
    InvalidPattern {
        /// Location of the schema object carrying the pattern.
        location: String,
        /// The pattern as written.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },
}

impl SchemaError {
    /// The reporting class of this error.
    ///
    /// Lookup and read failures of the requested schema are
    /// [`ErrorKind::SchemaNotFound`]; everything else is [`ErrorKind::Schema`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::Unreadable { .. } => ErrorKind::SchemaNotFound,
            _ => ErrorKind::Schema,
        }
    }
}
