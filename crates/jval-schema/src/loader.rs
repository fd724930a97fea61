//! # Schema Loader
//!
//! Turns a schema identifier (or an absolute URI reached through `$ref`)
//! into raw schema text plus the base URI it is known by, via the
//! [`SchemaLocator`] collaborator. Parsing is a separate step
//! ([`RawSchema::parse`]) so that the facade can report "schema not found"
//! before it decodes the instance, and "malformed schema" after.
//!
//! ## Formats
//!
//! Schema documents are JSON. Documents whose URI path ends in `.yaml` or
//! `.yml` are parsed as YAML and converted into the equivalent JSON value
//! tree; only the JSON-compatible subset of YAML is accepted.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::error::SchemaError;
use crate::locator::{SchemaLocation, SchemaLocator};

/// Serialization format of a schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// JSON text.
    Json,
    /// YAML text restricted to JSON-compatible values.
    Yaml,
}

impl SchemaFormat {
    fn from_uri(uri: &Url) -> Self {
        let path = uri.path();
        if path.ends_with(".yaml") || path.ends_with(".yml") {
            Self::Yaml
        } else {
            Self::Json
        }
    }
}

/// Schema text as read from its location, not yet parsed.
#[derive(Debug, Clone)]
pub struct RawSchema {
    /// Base URI of the document (fragment-free).
    pub uri: Url,
    /// Document text.
    pub text: Arc<str>,
    /// Format inferred from the URI.
    pub format: SchemaFormat,
}

impl RawSchema {
    /// Parse the text into a JSON value tree.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidJson`] or [`SchemaError::InvalidYaml`].
    pub fn parse(&self) -> Result<Value, SchemaError> {
        match self.format {
            SchemaFormat::Json => {
                jval_core::decode(&self.text).map_err(|source| SchemaError::InvalidJson {
                    location: self.uri.to_string(),
                    source,
                })
            }
            SchemaFormat::Yaml => {
                let yaml: serde_yaml::Value =
                    serde_yaml::from_str(&self.text).map_err(|e| SchemaError::InvalidYaml {
                        location: self.uri.to_string(),
                        reason: e.to_string(),
                    })?;
                yaml_to_json_value(&yaml).map_err(|reason| SchemaError::InvalidYaml {
                    location: self.uri.to_string(),
                    reason,
                })
            }
        }
    }
}

/// Reads schema documents through a [`SchemaLocator`].
#[derive(Clone)]
pub struct SchemaLoader {
    locator: Arc<dyn SchemaLocator>,
}

impl fmt::Debug for SchemaLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaLoader").finish_non_exhaustive()
    }
}

impl SchemaLoader {
    /// A loader backed by `locator`.
    pub fn new(locator: Arc<dyn SchemaLocator>) -> Self {
        Self { locator }
    }

    /// Fetch the schema a caller asked for by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotFound`] naming `identifier` when the locator
    /// fails, and [`SchemaError::Unreadable`] when the located content cannot
    /// be read.
    pub fn fetch(&self, identifier: &str) -> Result<RawSchema, SchemaError> {
        let location =
            self.locator
                .locate(identifier)
                .map_err(|e| SchemaError::NotFound {
                    identifier: e.identifier,
                })?;
        let raw = read_location(location)?;
        tracing::debug!(identifier, uri = %raw.uri, "schema located");
        Ok(raw)
    }

    /// Fetch a document reached through an absolute `$ref` URI.
    ///
    /// `file:` URIs are read directly; any other scheme is handed to the
    /// locator as the full URI string.
    pub fn fetch_uri(&self, uri: &Url) -> Result<RawSchema, SchemaError> {
        let mut document_uri = uri.clone();
        document_uri.set_fragment(None);

        let location = if document_uri.scheme() == "file" {
            let path = document_uri
                .to_file_path()
                .map_err(|()| SchemaError::Unreadable {
                    location: document_uri.to_string(),
                    reason: "not a local file path".to_string(),
                })?;
            SchemaLocation::File(path)
        } else {
            self.locator
                .locate(document_uri.as_str())
                .map_err(|e| SchemaError::NotFound {
                    identifier: e.identifier,
                })?
        };
        let raw = read_location(location)?;
        tracing::debug!(uri = %raw.uri, "referenced schema loaded");
        Ok(raw)
    }
}

fn read_location(location: SchemaLocation) -> Result<RawSchema, SchemaError> {
    match location {
        SchemaLocation::Embedded { mut uri, content } => {
            uri.set_fragment(None);
            let format = SchemaFormat::from_uri(&uri);
            Ok(RawSchema {
                uri,
                text: content,
                format,
            })
        }
        SchemaLocation::File(path) => read_file(&path),
    }
}

fn read_file(path: &Path) -> Result<RawSchema, SchemaError> {
    let unreadable = |reason: String| SchemaError::Unreadable {
        location: path.display().to_string(),
        reason,
    };
    let absolute = path.canonicalize().map_err(|e| unreadable(e.to_string()))?;
    let text = std::fs::read_to_string(&absolute).map_err(|e| unreadable(e.to_string()))?;
    let uri = Url::from_file_path(&absolute)
        .map_err(|()| unreadable("cannot be expressed as a file URI".to_string()))?;
    let format = SchemaFormat::from_uri(&uri);
    Ok(RawSchema {
        uri,
        text: Arc::from(text),
        format,
    })
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are ignored (the inner value is converted). Mapping keys must be
/// strings, numbers or booleans; numbers and booleans are stringified.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
