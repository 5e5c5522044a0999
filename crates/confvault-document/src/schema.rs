//! Schema validation
//!
//! [`Schema`] turns an untrusted [`RawDocument`] into a typed model or a
//! [`ValidationError`] listing every violated field. [`TypedSchema`] implements
//! it for any serde model that derives [`schemars::JsonSchema`].

use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;

use jsonschema::{Draft, JSONSchema};
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};

use crate::document::{kind_of, RawDocument, VERSION_KEY};
use crate::error::{ValidationError, ValidationIssue};
use crate::version::Version;

/// Validation capability for configuration documents
pub trait Schema: Debug + Send + Sync {
    /// Typed, validated document
    type Document: Serialize + DeserializeOwned + Default + Clone + Debug + PartialEq;

    /// Schema version the typed model corresponds to
    fn current_version(&self) -> &str;

    /// Validate a raw document and build the typed model
    ///
    /// # Errors
    /// Returns every field violation found
    fn validate(&self, raw: &RawDocument) -> Result<Self::Document, ValidationError>;

    /// Convert a typed document back into its raw form
    ///
    /// # Errors
    /// Returns error if the model does not serialize to a mapping
    fn to_raw(&self, document: &Self::Document) -> Result<RawDocument, ValidationError> {
        RawDocument::from_typed(document)
            .map_err(|e| ValidationError::single(ValidationIssue::ROOT, e.to_string()))
    }

    /// Default document used when no configuration file exists
    fn defaults(&self) -> Self::Document {
        Self::Document::default()
    }
}

/// Typed configuration model bound to a schema version
pub trait VersionedModel:
    Serialize + DeserializeOwned + JsonSchema + Default + Clone + Debug + PartialEq + Send + Sync
{
    /// Schema version this model describes
    const SCHEMA_VERSION: &'static str;
}

/// [`Schema`] backed by a generated JSON Schema and serde deserialization
///
/// Validation runs in three passes:
/// 1. JSON Schema (types, required fields, ranges, enums) with field paths
/// 2. `version` must be a well-formed dotted version in a string
/// 3. Deserialization into `T`
pub struct TypedSchema<T> {
    _model: PhantomData<fn() -> T>,
}

impl<T: VersionedModel> TypedSchema<T> {
    /// Create schema for model `T`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }

    /// Generated JSON Schema for `T`
    #[must_use]
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(T)).unwrap_or(serde_json::Value::Null)
    }

    fn schema_issues(instance: &serde_json::Value) -> Vec<ValidationIssue> {
        let schema = Self::json_schema();
        let compiled = match JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema)
        {
            Ok(compiled) => compiled,
            Err(e) => {
                return vec![ValidationIssue::new(
                    ValidationIssue::ROOT,
                    format!("schema for {} failed to compile: {e}", std::any::type_name::<T>()),
                )]
            }
        };

        let mut issues = Vec::new();
        if let Err(errors) = compiled.validate(instance) {
            for error in errors {
                issues.push(ValidationIssue::new(
                    pointer_to_path(&error.instance_path.to_string()),
                    error.to_string(),
                ));
            }
        }
        issues
    }
}

impl<T: VersionedModel> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TypedSchema<T> {
    fn clone(&self) -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<T> Debug for TypedSchema<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSchema")
            .field("model", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: VersionedModel> Schema for TypedSchema<T> {
    type Document = T;

    fn current_version(&self) -> &str {
        T::SCHEMA_VERSION
    }

    fn validate(&self, raw: &RawDocument) -> Result<T, ValidationError> {
        match (raw.version(), raw.get(VERSION_KEY)) {
            (Some(version), _) => {
                if let Err(e) = Version::parse(&version) {
                    return Err(ValidationError::single(VERSION_KEY, e.to_string()));
                }
            }
            // `version: 1.10` parses as a float and would read back as "1.1"
            (None, Some(other)) => {
                return Err(ValidationError::single(
                    VERSION_KEY,
                    format!("must be a quoted string, found {}", kind_of(other)),
                ));
            }
            (None, None) => {}
        }

        let instance = raw.to_value();
        let issues = Self::schema_issues(&instance);

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        serde_json::from_value(instance)
            .map_err(|e| ValidationError::single(ValidationIssue::ROOT, e.to_string()))
    }
}

/// Convert a JSON pointer (`/services/redis/port`) to a dotted path
fn pointer_to_path(pointer: &str) -> String {
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}
