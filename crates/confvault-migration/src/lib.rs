//! Confvault Migrations
//!
//! Versioned schema evolution for configuration documents.
//!
//! # Core Concepts
//!
//! - [`Migration`]: one `from -> to` transformation ([`FnMigration`] for closures)
//! - [`validate_before`]/[`validate_after`]: version guards run around every step
//! - [`MigrationRegistry`]: version graph, shortest-chain discovery, all-or-nothing execution
//! - [`MigrationHistory`]: audit record per executed step
//!
//! # Example
//!
//! ```rust,ignore
//! use confvault_migration::MigrationRegistry;
//!
//! let mut registry = MigrationRegistry::with_defaults();
//! if registry.needs_migration(&raw, "1.2") {
//!     let migrated = registry.migrate(&raw, "1.2", false)?;
//! }
//! ```

#![warn(unreachable_pub)]

mod builtin;
mod error;
mod history;
mod migration;
mod registry;

pub use builtin::{defaults as builtin_migrations, AddBackupAndRenameLogLevel, AddMonitoringSection};
pub use error::{
    GuardError, GuardPhase, MigrationError, PathError, RegistryError, StepFailure, TransformError,
};
pub use history::MigrationHistory;
pub use migration::{validate_after, validate_before, FnMigration, Migration, MigrationId};
pub use registry::{ChainReport, MigrationRegistry, StepReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
