//! # Validator Configuration
//!
//! Options a host application sets once when it builds a
//! [`JsonValidator`](crate::validator::JsonValidator). They deserialize from
//! the host's own configuration; every field has a default, so an empty
//! table yields the defaults.

use serde::{Deserialize, Serialize};

use crate::draft::Draft;

/// Options for a [`JsonValidator`](crate::validator::JsonValidator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorOptions {
    /// Draft for schema documents without a recognized `$schema`.
    #[serde(default)]
    pub default_draft: Draft,
    /// Check `format` on strings. Unknown formats always pass.
    #[serde(default = "default_true")]
    pub validate_formats: bool,
    /// Keep compiled schemas keyed by identifier for the validator's
    /// lifetime.
    #[serde(default = "default_true")]
    pub cache_schemas: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            default_draft: Draft::default(),
            validate_formats: true,
            cache_schemas: true,
        }
    }
}

fn default_true() -> bool {
    true
}
