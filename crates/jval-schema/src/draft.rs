//! # JSON Schema Drafts
//!
//! The keyword semantics that differ between draft-04, draft-06 and
//! draft-07. A document's draft comes from its root `$schema`; documents
//! without one use the configured default.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A supported JSON Schema draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Draft {
    /// draft-04: `id`, boolean `exclusiveMinimum`/`exclusiveMaximum`,
    /// `integer` only matches integer literals.
    #[serde(rename = "draft-04")]
    Draft4,
    /// draft-06: `$id`, `const`, `contains`, `propertyNames`, numeric
    /// exclusive bounds, boolean schemas.
    #[serde(rename = "draft-06")]
    Draft6,
    /// draft-07: draft-06 plus `if`/`then`/`else`.
    #[default]
    #[serde(rename = "draft-07")]
    Draft7,
}

impl Draft {
    /// Map a `$schema` URI to its draft.
    pub fn from_schema_uri(uri: &str) -> Option<Self> {
        let trimmed = uri.trim_end_matches('#');
        let path = trimmed
            .strip_prefix("http://json-schema.org/")
            .or_else(|| trimmed.strip_prefix("https://json-schema.org/"))?;
        match path {
            "draft-04/schema" => Some(Self::Draft4),
            "draft-06/schema" => Some(Self::Draft6),
            "draft-07/schema" => Some(Self::Draft7),
            _ => None,
        }
    }

    /// Draft declared by a schema document's root `$schema`, if recognized.
    pub fn detect(root: &Value) -> Option<Self> {
        root.get("$schema")
            .and_then(Value::as_str)
            .and_then(Self::from_schema_uri)
    }

    /// The keyword that sets a base URI.
    pub fn id_keyword(&self) -> &'static str {
        match self {
            Self::Draft4 => "id",
            Self::Draft6 | Self::Draft7 => "$id",
        }
    }

    /// Whether `integer` rejects integral float literals such as `1.0`.
    pub fn strict_integers(&self) -> bool {
        matches!(self, Self::Draft4)
    }

    /// Whether `keyword` has validation semantics under this draft.
    ///
    /// Keywords introduced by a later draft are kept as annotations only.
    pub fn supports(&self, keyword: &str) -> bool {
        match keyword {
            "const" | "contains" | "propertyNames" => *self >= Self::Draft6,
            "if" | "then" | "else" => *self >= Self::Draft7,
            _ => true,
        }
    }

    /// Whether `true`/`false` are schemas.
    pub fn allows_boolean_schemas(&self) -> bool {
        *self >= Self::Draft6
    }

    /// Stable name, as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft4 => "draft-04",
            Self::Draft6 => "draft-06",
            Self::Draft7 => "draft-07",
        }
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_declared_draft() {
        assert_eq!(
            Draft::detect(&json!({"$schema": "http://json-schema.org/draft-04/schema#"})),
            Some(Draft::Draft4)
        );
        assert_eq!(
            Draft::detect(&json!({"$schema": "https://json-schema.org/draft-06/schema"})),
            Some(Draft::Draft6)
        );
        assert_eq!(
            Draft::detect(&json!({"$schema": "http://json-schema.org/draft-07/schema#"})),
            Some(Draft::Draft7)
        );
        assert_eq!(Draft::detect(&json!({"type": "string"})), None);
        assert_eq!(
            Draft::detect(&json!({"$schema": "https://json-schema.org/draft/2020-12/schema"})),
            None
        );
    }

    #[test]
    fn keyword_support_by_draft() {
        assert!(!Draft::Draft4.supports("const"));
        assert!(Draft::Draft6.supports("const"));
        assert!(!Draft::Draft6.supports("if"));
        assert!(Draft::Draft7.supports("if"));
        assert!(Draft::Draft4.supports("minimum"));
    }

    #[test]
    fn serde_names() {
        assert_eq!(serde_json::to_value(Draft::Draft4).unwrap(), json!("draft-04"));
        let parsed: Draft = serde_json::from_value(json!("draft-06")).unwrap();
        assert_eq!(parsed, Draft::Draft6);
    }
}
