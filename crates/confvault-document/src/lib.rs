//! Confvault Document Model
//!
//! Everything a configuration store needs to reason about a document
//! without touching the filesystem.
//!
//! # Core Concepts
//!
//! - [`Version`]: dotted `major.minor[.patch]` schema versions
//! - [`RawDocument`]: untyped, order-preserving document tree
//! - [`DocumentDiff`]: added/modified/removed dotted paths
//! - [`Format`]: text encoding ([`YamlFormat`], [`JsonFormat`])
//! - [`Schema`]: validation into a typed model ([`TypedSchema`])
//! - [`StackConfig`]: the bundled stack configuration model
//!
//! # Example
//!
//! ```rust,ignore
//! use confvault_document::{Format, Schema, StackSchema, YamlFormat};
//!
//! let raw = YamlFormat.parse("version: '1.2'\n")?.unwrap_or_default();
//! let config = StackSchema::new().validate(&raw)?;
//! assert_eq!(config.services.redis.port, 6379);
//! ```

#![warn(unreachable_pub)]

mod diff;
mod document;
mod error;
mod format;
mod model;
mod schema;
mod version;

pub use diff::{compute_diff, DocumentDiff};
pub use document::{deep_merge, RawDocument, VERSION_KEY};
pub use error::{DocumentError, ValidationError, ValidationIssue, VersionError};
pub use format::{Format, JsonFormat, YamlFormat};
pub use model::{
    BackupSettings, DeploymentSettings, DockerSettings, Environment, LogLevel,
    MonitoringSettings, PostgresSettings, RedisSettings, ServiceSettings, StackConfig,
    StackSchema, TemporalSettings, CURRENT_SCHEMA_VERSION,
};
pub use schema::{Schema, TypedSchema, VersionedModel};
pub use version::Version;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
