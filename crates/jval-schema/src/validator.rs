//! # Validator Facade
//!
//! [`JsonValidator`] runs the whole pipeline for one call:
//!
//! 1. **Locate** the schema through the loader (skipped when the compiled
//!    schema is cached). Failure: one [`ErrorKind::SchemaNotFound`] error.
//! 2. **Decode** the document. Failure: one [`ErrorKind::Decode`] error; no
//!    validation runs.
//! 3. **Compile** the schema. Failure: one [`ErrorKind::Schema`] error.
//! 4. **Validate.** Any violation makes the result invalid and drops the
//!    value.
//!
//! Every call returns a fresh [`ValidationResult`]; the validator keeps no
//! per-call state and can be shared across threads.
//!
//! [`ErrorKind::SchemaNotFound`]: crate::result::ErrorKind::SchemaNotFound
//! [`ErrorKind::Decode`]: crate::result::ErrorKind::Decode
//! [`ErrorKind::Schema`]: crate::result::ErrorKind::Schema

use std::sync::Arc;

use jval_core::DecodeError;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::SchemaCache;
use crate::compiler::{CompiledSchema, Compiler};
use crate::config::ValidatorOptions;
use crate::error::SchemaError;
use crate::loader::{RawSchema, SchemaLoader};
use crate::locator::SchemaLocator;
use crate::result::{ValidationError, ValidationResult};

/// Validates JSON documents against schemas named by identifier.
#[derive(Debug)]
pub struct JsonValidator {
    loader: SchemaLoader,
    cache: SchemaCache,
    options: ValidatorOptions,
}

/// A schema ready to compile, or already compiled.
enum Prepared {
    Cached(Arc<CompiledSchema>),
    Located(RawSchema),
}

impl JsonValidator {
    /// A validator with default options.
    pub fn new(locator: impl SchemaLocator + 'static) -> Self {
        Self::with_options(locator, ValidatorOptions::default())
    }

    pub fn with_options(locator: impl SchemaLocator + 'static, options: ValidatorOptions) -> Self {
        Self::from_shared(Arc::new(locator), options)
    }

    /// A validator over a locator shared with the host application.
    pub fn from_shared(locator: Arc<dyn SchemaLocator>, options: ValidatorOptions) -> Self {
        Self {
            loader: SchemaLoader::new(locator),
            cache: SchemaCache::new(),
            options,
        }
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// The compiled-schema cache. Empty when caching is disabled.
    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Load and compile the schema named by `schema_ref`, through the cache.
    ///
    /// # Errors
    ///
    /// Any [`SchemaError`] from locating, parsing or compiling.
    pub fn compile(&self, schema_ref: &str) -> Result<Arc<CompiledSchema>, SchemaError> {
        match self.prepare(schema_ref)? {
            Prepared::Cached(schema) => Ok(schema),
            Prepared::Located(raw) => self.finish(schema_ref, raw),
        }
    }

    /// Validate JSON text.
    pub fn validate(&self, json: &str, schema_ref: &str) -> ValidationResult {
        self.run(schema_ref, || jval_core::decode(json))
    }

    /// Validate raw bytes, which must be UTF-8 JSON.
    pub fn validate_bytes(&self, bytes: &[u8], schema_ref: &str) -> ValidationResult {
        self.run(schema_ref, || jval_core::decode_slice(bytes))
    }

    /// Validate a request body. With `empty_is_valid`, an empty body is
    /// valid without loading the schema, and the result carries no value.
    pub fn validate_body(
        &self,
        body: &[u8],
        schema_ref: &str,
        empty_is_valid: bool,
    ) -> ValidationResult {
        if body.is_empty() && empty_is_valid {
            tracing::debug!(schema = schema_ref, "empty body accepted");
            return ValidationResult::valid(None);
        }
        self.validate_bytes(body, schema_ref)
    }

    /// Validate an already decoded document.
    pub fn validate_value(&self, value: Value, schema_ref: &str) -> ValidationResult {
        self.run(schema_ref, || Ok(value))
    }

    /// Validate JSON text, then decode it a second time into `T`.
    ///
    /// The second decode repeats work already done for validation; use it
    /// only when a typed value is wanted. A document that validates but does
    /// not fit `T` yields a single [`ErrorKind::Decode`] error.
    ///
    /// [`ErrorKind::Decode`]: crate::result::ErrorKind::Decode
    pub fn validate_as<T: DeserializeOwned>(
        &self,
        json: &str,
        schema_ref: &str,
    ) -> ValidationResult<T> {
        let checked = self.validate(json, schema_ref);
        if !checked.is_valid() {
            return ValidationResult::invalid(checked.into_errors());
        }
        match jval_core::decode_as::<T>(json) {
            Ok(typed) => ValidationResult::valid(Some(typed)),
            Err(e) => ValidationResult::failure(ValidationError::from_decode(&e)),
        }
    }

    fn run(
        &self,
        schema_ref: &str,
        decode: impl FnOnce() -> Result<Value, DecodeError>,
    ) -> ValidationResult {
        let prepared = match self.prepare(schema_ref) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::debug!(schema = schema_ref, error = %e, "schema unavailable");
                return ValidationResult::failure(ValidationError::from_schema(&e));
            }
        };

        let value = match decode() {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(schema = schema_ref, code = e.code.as_str(), "document rejected by decoder");
                return ValidationResult::failure(ValidationError::from_decode(&e));
            }
        };

        let schema = match prepared {
            Prepared::Cached(schema) => schema,
            Prepared::Located(raw) => match self.finish(schema_ref, raw) {
                Ok(schema) => schema,
                Err(e) => {
                    tracing::warn!(schema = schema_ref, error = %e, "schema failed to compile");
                    return ValidationResult::failure(ValidationError::from_schema(&e));
                }
            },
        };

        match schema.validate(&value) {
            Ok(()) => {
                tracing::debug!(schema = schema_ref, "document valid");
                ValidationResult::valid(Some(value))
            }
            Err(errors) => {
                tracing::debug!(schema = schema_ref, errors = errors.len(), "document invalid");
                ValidationResult::invalid(errors)
            }
        }
    }

    fn prepare(&self, schema_ref: &str) -> Result<Prepared, SchemaError> {
        if self.options.cache_schemas {
            if let Some(schema) = self.cache.get(schema_ref) {
                return Ok(Prepared::Cached(schema));
            }
        }
        self.loader.fetch(schema_ref).map(Prepared::Located)
    }

    fn finish(&self, schema_ref: &str, raw: RawSchema) -> Result<Arc<CompiledSchema>, SchemaError> {
        let build = || -> Result<CompiledSchema, SchemaError> {
            let value = raw.parse()?;
            Compiler::from_options(&self.options)
                .with_loader(&self.loader)
                .compile(value, raw.uri.clone())
        };
        if self.options.cache_schemas {
            self.cache.get_or_try_insert_with(schema_ref, build)
        } else {
            build().map(Arc::new)
        }
    }
}
