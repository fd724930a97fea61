//! # Validation Results
//!
//! The per-call outcome returned by the facade. Every failure class
//! (missing schema, undecodable document, unusable schema, constraint
//! violations) is reported as a [`ValidationError`] tagged with an
//! [`ErrorKind`], so callers inspect one list instead of juggling error
//! channels.
//!
//! ## Invariant
//!
//! `errors` is empty if and only if `valid` is true. [`ValidationResult`]
//! keeps its fields private and only the constructors in this module can
//! build one, so the invariant holds by construction.

use std::fmt;

use jval_core::DecodeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

/// Reporting class of a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The requested schema could not be located or read.
    SchemaNotFound,
    /// The document is not well-formed JSON (or not the requested shape).
    Decode,
    /// The schema itself is unusable.
    Schema,
    /// The document violates the schema.
    Validation,
}

/// The schema keyword a violation was raised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Keyword {
    Type,
    Enum,
    Const,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MultipleOf,
    MinLength,
    MaxLength,
    Pattern,
    Format,
    AdditionalItems,
    MinItems,
    MaxItems,
    UniqueItems,
    Contains,
    Required,
    AdditionalProperties,
    MinProperties,
    MaxProperties,
    Dependencies,
    PropertyNames,
    AnyOf,
    OneOf,
    Not,
    /// The boolean schema `false`.
    False,
}

impl Keyword {
    /// The keyword as it appears in a schema document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Const => "const",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::ExclusiveMinimum => "exclusiveMinimum",
            Self::ExclusiveMaximum => "exclusiveMaximum",
            Self::MultipleOf => "multipleOf",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::Pattern => "pattern",
            Self::Format => "format",
            Self::AdditionalItems => "additionalItems",
            Self::MinItems => "minItems",
            Self::MaxItems => "maxItems",
            Self::UniqueItems => "uniqueItems",
            Self::Contains => "contains",
            Self::Required => "required",
            Self::AdditionalProperties => "additionalProperties",
            Self::MinProperties => "minProperties",
            Self::MaxProperties => "maxProperties",
            Self::Dependencies => "dependencies",
            Self::PropertyNames => "propertyNames",
            Self::AnyOf => "anyOf",
            Self::OneOf => "oneOf",
            Self::Not => "not",
            Self::False => "false",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported failure with structured context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON Pointer to the offending instance node (`""` is the root).
    /// Absent for errors not tied to a document location.
    pub pointer: Option<String>,
    /// The same location in dotted notation (`items[0].name`).
    pub property: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// The violated keyword, for [`ErrorKind::Validation`] entries.
    pub constraint: Option<Keyword>,
    /// `<document uri>#<pointer>` of the schema node that raised the error.
    pub schema_path: Option<String>,
    /// Reporting class.
    pub kind: ErrorKind,
}

impl ValidationError {
    /// A constraint violation.
    pub fn violation(
        pointer: String,
        property: String,
        message: String,
        constraint: Keyword,
        schema_path: &str,
    ) -> Self {
        Self {
            pointer: Some(pointer),
            property: Some(property),
            message,
            constraint: Some(constraint),
            schema_path: Some(schema_path.to_string()),
            kind: ErrorKind::Validation,
        }
    }

    /// A document that could not be decoded.
    pub fn from_decode(error: &DecodeError) -> Self {
        Self {
            pointer: None,
            property: None,
            message: error.to_string(),
            constraint: None,
            schema_path: None,
            kind: ErrorKind::Decode,
        }
    }

    /// A schema that could not be located, read or compiled.
    pub fn from_schema(error: &SchemaError) -> Self {
        Self {
            pointer: None,
            property: None,
            message: error.to_string(),
            constraint: None,
            schema_path: None,
            kind: error.kind(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pointer.as_deref() {
            Some("") => write!(f, "  (root): {}", self.message),
            Some(pointer) => write!(f, "  {pointer}: {}", self.message),
            None => write!(f, "  {}", self.message),
        }
    }
}

/// Outcome of one validation call.
///
/// `value` is the decoded document, present only when the call succeeded
/// (and absent in the empty-body mode even then).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult<T = Value> {
    valid: bool,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

impl<T> ValidationResult<T> {
    /// A passing result.
    pub fn valid(value: Option<T>) -> Self {
        Self {
            valid: true,
            value,
            errors: Vec::new(),
        }
    }

    /// A failing result. An empty `errors` list still yields `valid: true`,
    /// keeping `errors.is_empty() == valid`.
    pub fn invalid(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            value: None,
            errors,
        }
    }

    /// A result carrying a single error.
    pub fn failure(error: ValidationError) -> Self {
        Self::invalid(vec![error])
    }

    /// Whether the document conformed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The decoded document, when valid.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Take the decoded document.
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Errors of this call, in discovery order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Consume and return the errors.
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Transform the carried value, keeping validity and errors.
    pub fn map_value<U>(self, f: impl FnOnce(T) -> U) -> ValidationResult<U> {
        ValidationResult {
            valid: self.valid,
            value: self.value.map(f),
            errors: self.errors,
        }
    }
}

impl<T> fmt::Display for ValidationResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return f.write_str("valid");
        }
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}
