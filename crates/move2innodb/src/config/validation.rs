//! Configuration validation.

use super::{Config, SSL_MODES};
use crate::error::{MigrateError, Result};

/// MySQL limits user-level lock names to 64 characters.
const MAX_LOCK_NAME_LEN: usize = 64;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let db = &config.database;

    if db.host.is_empty() {
        return Err(MigrateError::Config("database.host is required".into()));
    }
    if db.database.is_empty() {
        return Err(MigrateError::Config("database.database is required".into()));
    }
    if db.user.is_empty() {
        return Err(MigrateError::Config("database.user is required".into()));
    }
    if db.r#type != "mysql" {
        return Err(MigrateError::Config(format!(
            "database.type must be 'mysql', got '{}'",
            db.r#type
        )));
    }
    if !SSL_MODES.contains(&db.ssl_mode.as_str()) {
        return Err(MigrateError::Config(format!(
            "Invalid ssl_mode '{}'. Valid options: {}",
            db.ssl_mode,
            SSL_MODES.join(", ")
        )));
    }
    if db.max_connections == 0 {
        return Err(MigrateError::Config(
            "database.max_connections must be at least 1".into(),
        ));
    }

    // The prefix is spliced into DDL, keep it to identifier characters
    if !db
        .table_prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(MigrateError::Config(format!(
            "database.table_prefix may only contain letters, digits and '_', got '{}'",
            db.table_prefix
        )));
    }

    if let Some(0) = config.migration.deadline_secs {
        return Err(MigrateError::Config(
            "migration.deadline_secs must be at least 1".into(),
        ));
    }
    if config.migration.lock_name.is_empty() {
        return Err(MigrateError::Config(
            "migration.lock_name must not be empty".into(),
        ));
    }
    if config.migration.lock_name.chars().count() > MAX_LOCK_NAME_LEN {
        return Err(MigrateError::Config(format!(
            "migration.lock_name must be at most {} characters",
            MAX_LOCK_NAME_LEN
        )));
    }

    if config.settings.path.as_os_str().is_empty() {
        return Err(MigrateError::Config("settings.path is required".into()));
    }

    Ok(())
}
