//! Stack configuration model
//!
//! The typed document for schema version [`CURRENT_SCHEMA_VERSION`]:
//! deployment settings, backing services, monitoring and backups.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{TypedSchema, VersionedModel};

/// Schema for [`StackConfig`]
pub type StackSchema = TypedSchema<StackConfig>;

/// Current stack schema version
pub const CURRENT_SCHEMA_VERSION: &str = "1.2";

/// Root configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StackConfig {
    /// Schema version stamp
    pub version: String,

    /// Deployment settings
    #[serde(default)]
    pub deployment: DeploymentSettings,

    /// Backing services
    #[serde(default)]
    pub services: ServiceSettings,

    /// Health monitoring
    #[serde(default)]
    pub monitoring: MonitoringSettings,

    /// Scheduled backups
    #[serde(default)]
    pub backup: BackupSettings,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION.to_string(),
            deployment: DeploymentSettings::default(),
            services: ServiceSettings::default(),
            monitoring: MonitoringSettings::default(),
            backup: BackupSettings::default(),
        }
    }
}

impl VersionedModel for StackConfig {
    const SCHEMA_VERSION: &'static str = CURRENT_SCHEMA_VERSION;
}

/// Target environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Pre-production
    Staging,
    /// Production
    Production,
}

/// Log verbosity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Diagnostic detail
    Debug,
    /// Normal operation
    #[default]
    Info,
    /// Recoverable problems
    Warning,
    /// Failed operations
    Error,
    /// Service-level failures
    Critical,
}

/// Deployment settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DeploymentSettings {
    /// Target environment
    pub environment: Environment,
    /// Log verbosity
    pub logging_level: LogLevel,
    /// Optional project name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

/// Docker engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DockerSettings {
    /// Engine socket path
    pub socket: String,
    /// Compose project name
    pub compose_project: String,
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            socket: "/var/run/docker.sock".to_string(),
            compose_project: "stack".to_string(),
        }
    }
}

/// Redis settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RedisSettings {
    /// Hostname or address
    #[schemars(length(min = 1))]
    pub host: String,
    /// TCP port
    #[schemars(range(min = 1))]
    pub port: u16,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
        }
    }
}

/// PostgreSQL settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PostgresSettings {
    /// Hostname or address
    #[schemars(length(min = 1))]
    pub host: String,
    /// TCP port
    #[schemars(range(min = 1))]
    pub port: u16,
    /// Database name
    #[schemars(length(min = 1))]
    pub database: String,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "stack".to_string(),
        }
    }
}

/// Temporal settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TemporalSettings {
    /// Frontend hostname or address
    #[schemars(length(min = 1))]
    pub host: String,
    /// Frontend TCP port
    #[schemars(range(min = 1))]
    pub port: u16,
    /// Workflow namespace
    #[schemars(length(min = 1))]
    pub namespace: String,
}

impl Default for TemporalSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 7233,
            namespace: "default".to_string(),
        }
    }
}

/// Backing services
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ServiceSettings {
    /// Container engine
    pub docker: DockerSettings,
    /// Cache
    pub redis: RedisSettings,
    /// Database
    pub postgres: PostgresSettings,
    /// Workflow engine
    pub temporal: TemporalSettings,
}

/// Health monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MonitoringSettings {
    /// Whether health checks run
    pub enabled: bool,
    /// Seconds between health checks
    #[schemars(range(min = 1))]
    pub interval_seconds: u32,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 60,
        }
    }
}

/// Scheduled backups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BackupSettings {
    /// Whether backups run
    pub enabled: bool,
    /// Days to keep backups
    #[schemars(range(min = 1))]
    pub retention_days: u32,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            retention_days: 7,
        }
    }
}
