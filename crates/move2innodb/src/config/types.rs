//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Forum database connection.
    pub database: DatabaseConfig,

    /// Engine migration behavior.
    #[serde(default)]
    pub migration: MigrationConfig,

    /// Where the persisted flags live.
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// Accepted `database.ssl_mode` values.
///
/// `prefer` and `require` encrypt without verifying the server certificate;
/// `verify-ca` checks the chain only, `verify-full` also the host name.
pub const SSL_MODES: &[&str] = &["disable", "prefer", "require", "verify-ca", "verify-full"];

/// Forum database (MySQL/MariaDB) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database type (always "mysql").
    #[serde(default = "default_mysql")]
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Table name prefix of the forum deployment (default: "GDN_").
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    /// TLS mode, one of [`SSL_MODES`] (default: "prefer").
    #[serde(default = "default_prefer")]
    pub ssl_mode: String,

    /// Maximum pooled connections (default: 2).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// What to do when an ALTER TABLE fails part way through a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and keep processing the remaining tables.
    #[default]
    Continue,
    /// Stop at the first failure and report what was already changed.
    Halt,
}

/// Engine migration behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Failure handling for ALTER TABLE (default: continue).
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Stop issuing ALTERs once this many seconds have passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,

    /// Name of the MySQL advisory lock guarding a run (default: "move2innodb").
    #[serde(default = "default_lock_name")]
    pub lock_name: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            deadline_secs: None,
            lock_name: default_lock_name(),
        }
    }
}

/// Persisted settings location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// JSON file holding the consent and desired-state flags.
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

fn default_mysql() -> String {
    "mysql".to_string()
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_table_prefix() -> String {
    "GDN_".to_string()
}

fn default_prefer() -> String {
    "prefer".to_string()
}

fn default_max_connections() -> usize {
    2
}

fn default_lock_name() -> String {
    "move2innodb".to_string()
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("move2innodb-settings.json")
}
