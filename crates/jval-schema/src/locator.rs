//! # Schema Locator
//!
//! The collaborator that maps a schema identifier to where its content
//! lives. Path resolution policy belongs to the host application; the
//! validator only consumes [`SchemaLocator::locate`] and wraps any failure
//! into a uniform "unable to locate" error.
//!
//! Two small locators are provided for embedding and tests:
//!
//! - [`MemoryLocator`] serves schemas registered in memory under a name. Each
//!   is addressable as `mem:///<name>`, so relative `$ref`s between them
//!   resolve like relative file paths.
//! - [`DirectoryLocator`] resolves identifiers against a root directory and
//!   accepts absolute `file://` URIs, which is how external `$ref` targets
//!   arrive.
//!
//! Any `Fn(&str) -> Result<SchemaLocation, LocateError> + Send + Sync`
//! closure is also a locator.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::error::LocateError;

/// URI scheme of schemas served by [`MemoryLocator`].
pub const MEMORY_SCHEME: &str = "mem";

/// Where a schema's content can be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaLocation {
    /// A file on disk. Relative `$ref`s resolve against its `file://` URI.
    File(PathBuf),
    /// Content held in memory, with the URI it is known by.
    Embedded {
        /// Base URI of the document.
        uri: Url,
        /// Schema text.
        content: Arc<str>,
    },
}

/// Maps schema identifiers to locations.
///
/// Implementations must be shareable across threads; the validator calls
/// `locate` from whichever thread is validating.
pub trait SchemaLocator: Send + Sync {
    /// Locate the schema named by `identifier`.
    ///
    /// `identifier` is either what the caller passed to the validator or,
    /// for external `$ref` targets, an absolute URI.
    ///
    /// # Errors
    ///
    /// Returns [`LocateError`] when nothing is known under `identifier`.
    fn locate(&self, identifier: &str) -> Result<SchemaLocation, LocateError>;
}

impl<F> SchemaLocator for F
where
    F: Fn(&str) -> Result<SchemaLocation, LocateError> + Send + Sync,
{
    fn locate(&self, identifier: &str) -> Result<SchemaLocation, LocateError> {
        self(identifier)
    }
}

// ---------------------------------------------------------------------------
// MemoryLocator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MemoryEntry {
    uri: Url,
    content: Arc<str>,
}

/// Serves schemas registered in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocator {
    /// Indexed by both registration name and `mem:///` URI.
    entries: HashMap<String, MemoryEntry>,
}

impl MemoryLocator {
    /// An empty locator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a locator from `(name, content)` pairs.
    ///
    /// # Errors
    ///
    /// Returns a URL parse error if a name cannot form a `mem:///` URI.
    pub fn from_schemas<I, N, C>(schemas: I) -> Result<Self, url::ParseError>
    where
        I: IntoIterator<Item = (N, C)>,
        N: AsRef<str>,
        C: Into<Arc<str>>,
    {
        let mut locator = Self::new();
        for (name, content) in schemas {
            locator.insert(name.as_ref(), content)?;
        }
        Ok(locator)
    }

    /// Register `content` under `name`, returning its `mem:///` URI.
    ///
    /// # Errors
    ///
    /// Returns a URL parse error if `name` cannot form a `mem:///` URI.
    pub fn insert(
        &mut self,
        name: &str,
        content: impl Into<Arc<str>>,
    ) -> Result<Url, url::ParseError> {
        let uri = Url::parse(&format!("{MEMORY_SCHEME}:///"))?.join(name.trim_start_matches('/'))?;
        let entry = MemoryEntry {
            uri: uri.clone(),
            content: content.into(),
        };
        self.entries.insert(uri.as_str().to_string(), entry.clone());
        self.entries.insert(name.to_string(), entry);
        Ok(uri)
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|(key, entry)| key.as_str() == entry.uri.as_str())
            .count()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SchemaLocator for MemoryLocator {
    fn locate(&self, identifier: &str) -> Result<SchemaLocation, LocateError> {
        self.entries
            .get(identifier)
            .map(|entry| SchemaLocation::Embedded {
                uri: entry.uri.clone(),
                content: Arc::clone(&entry.content),
            })
            .ok_or_else(|| LocateError::new(identifier))
    }
}

// ---------------------------------------------------------------------------
// DirectoryLocator
// ---------------------------------------------------------------------------

/// Resolves identifiers to files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryLocator {
    root: PathBuf,
}

impl DirectoryLocator {
    /// A locator rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SchemaLocator for DirectoryLocator {
    fn locate(&self, identifier: &str) -> Result<SchemaLocation, LocateError> {
        let candidate = if identifier.starts_with("file:") {
            Url::parse(identifier)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| LocateError::new(identifier))?
        } else {
            self.root.join(identifier)
        };

        if !candidate.is_file() {
            return Err(LocateError::new(identifier));
        }
        candidate
            .canonicalize()
            .map(SchemaLocation::File)
            .map_err(|_| LocateError::new(identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_locator_by_name_and_uri() {
        let mut locator = MemoryLocator::new();
        let uri = locator.insert("person.json", r#"{"type":"object"}"#).unwrap();
        assert_eq!(uri.as_str(), "mem:///person.json");
        assert_eq!(locator.len(), 1);

        for key in ["person.json", "mem:///person.json"] {
            match locator.locate(key).unwrap() {
                SchemaLocation::Embedded { uri, content } => {
                    assert_eq!(uri.as_str(), "mem:///person.json");
                    assert_eq!(&*content, r#"{"type":"object"}"#);
                }
                other => panic!("unexpected location: {other:?}"),
            }
        }
    }

    #[test]
    fn memory_locator_nested_names() {
        let locator = MemoryLocator::from_schemas([("defs/common.json", "{}")]).unwrap();
        assert!(locator.locate("mem:///defs/common.json").is_ok());
        assert!(locator.locate("common.json").is_err());
    }

    #[test]
    fn memory_locator_miss_names_identifier() {
        let err = MemoryLocator::new().locate("missing.json").unwrap_err();
        assert_eq!(err.identifier, "missing.json");
    }

    #[test]
    fn closure_is_a_locator() {
        let locator = |id: &str| -> Result<SchemaLocation, LocateError> {
            if id == "any" {
                Ok(SchemaLocation::Embedded {
                    uri: Url::parse("mem:///any").unwrap(),
                    content: Arc::from("true"),
                })
            } else {
                Err(LocateError::new(id))
            }
        };
        assert!(locator.locate("any").is_ok());
        assert!(locator.locate("other").is_err());
    }

    #[test]
    fn directory_locator_resolves_relative_and_file_uris() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order.schema.json");
        std::fs::write(&path, "{}").unwrap();

        let locator = DirectoryLocator::new(dir.path());
        let located = locator.locate("order.schema.json").unwrap();
        let canonical = path.canonicalize().unwrap();
        assert_eq!(located, SchemaLocation::File(canonical.clone()));

        let uri = Url::from_file_path(&canonical).unwrap();
        assert_eq!(
            locator.locate(uri.as_str()).unwrap(),
            SchemaLocation::File(canonical)
        );
    }

    #[test]
    fn directory_locator_rejects_missing_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let locator = DirectoryLocator::new(dir.path());
        assert!(locator.locate("missing.json").is_err());
        assert!(locator.locate("nested").is_err());
    }
}
