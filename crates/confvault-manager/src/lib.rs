//! Confvault Configuration Manager
//!
//! Hierarchical, migration-aware loading and crash-safe persistence of a
//! versioned configuration document.
//!
//! # Core Concepts
//!
//! - [`ConfigManager`]: load, `load_and_migrate`, save, validate, merge
//! - [`ConfigLocations`]/[`ConfigScope`]: explicit, project and user scopes
//! - [`StoreOptions`]: file naming and directories
//!
//! # Example
//!
//! ```rust,ignore
//! use confvault_manager::{ConfigManager, StoreOptions};
//!
//! let mut manager = ConfigManager::new(StoreOptions::default());
//! let mut config = manager.load_and_migrate(None, false)?;
//! config.monitoring.enabled = true;
//! manager.save(&config)?;
//! ```

#![warn(unreachable_pub)]

mod error;
mod location;
mod manager;
mod options;
mod persist;

pub use error::{ConfigError, LoadError, SaveError};
pub use location::{default_user_dir, ConfigLocations, ConfigScope};
pub use manager::{ConfigManager, ConfigSource, Loaded};
pub use options::{
    StoreOptions, DEFAULT_BACKUP_SUFFIX, DEFAULT_FILE_NAME, DEFAULT_PROJECT_DIR_ENV,
    DEFAULT_PROJECT_SUBDIR,
};
pub use persist::{backup_path, DIR_MODE, FILE_MODE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
