//! Error types for the engine migration library.

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for refused migrations (consent, version, engine, permission).
pub const EXIT_REFUSED: u8 = 2;
/// Exit code for a failed ALTER TABLE.
pub const EXIT_DDL_FAILURE: u8 = 3;
/// Exit code when another migration holds the lock.
pub const EXIT_BUSY: u8 = 4;
/// Exit code for cancelled or timed out runs.
pub const EXIT_INTERRUPTED: u8 = 5;
/// Exit code for database connection or query errors.
pub const EXIT_DATABASE_ERROR: u8 = 6;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for engine migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// The operator has not granted consent for schema changes.
    #[error("refused: confirmation not granted")]
    ConsentMissing,

    /// The server is too old for InnoDB fulltext indexes.
    #[error("refused: unsupported server version '{version}'")]
    UnsupportedVersion { version: String },

    /// Requested engine is neither InnoDB nor MyISAM.
    #[error("refused: unsupported engine `{0}`")]
    UnsupportedEngine(String),

    /// An ALTER TABLE statement failed.
    #[error("ALTER TABLE failed for {table}: {message} (already changed: {})", format_changed(.changed))]
    DdlExecution {
        table: String,
        message: String,
        changed: Vec<String>,
    },

    /// Caller lacks the capability required by the settings action.
    #[error("permission denied: requires '{0}'")]
    PermissionDenied(String),

    /// Another migration is already running against the managed tables.
    #[error("another engine migration is already running")]
    Busy,

    /// Run was cancelled before all tables were processed.
    #[error("migration cancelled (already changed: {})", format_changed(.changed))]
    Cancelled { changed: Vec<String> },

    /// Run deadline expired before all tables were processed.
    #[error("migration deadline exceeded (already changed: {})", format_changed(.changed))]
    DeadlineExceeded { changed: Vec<String> },

    /// Server version string could not be parsed.
    ///
    /// Only returned by [`ServerVersion`](crate::core::ServerVersion) parsing.
    /// The migrator never surfaces it: an unreadable version fails closed and
    /// is reported as [`MigrateError::UnsupportedVersion`].
    #[error("cannot parse server version '{0}'")]
    VersionParse(String),

    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query error with context
    #[error("Database error: {message}\n  Context: {context}")]
    Database { message: String, context: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_changed(changed: &[String]) -> String {
    if changed.is_empty() {
        "none".to_string()
    } else {
        changed.join(", ")
    }
}

impl MigrateError {
    /// Create a Database error with context about where it occurred
    pub fn database(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Database {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// True for the guard refusals that leave the schema untouched.
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            MigrateError::ConsentMissing
                | MigrateError::UnsupportedVersion { .. }
                | MigrateError::UnsupportedEngine(_)
                | MigrateError::PermissionDenied(_)
        )
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) | MigrateError::Json(_) => {
                EXIT_CONFIG_ERROR
            }
            MigrateError::ConsentMissing
            | MigrateError::UnsupportedVersion { .. }
            | MigrateError::UnsupportedEngine(_)
            | MigrateError::PermissionDenied(_) => EXIT_REFUSED,
            MigrateError::DdlExecution { .. } => EXIT_DDL_FAILURE,
            MigrateError::Busy => EXIT_BUSY,
            MigrateError::Cancelled { .. } | MigrateError::DeadlineExceeded { .. } => {
                EXIT_INTERRUPTED
            }
            MigrateError::Database { .. } | MigrateError::VersionParse(_) => EXIT_DATABASE_ERROR,
            MigrateError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusal_messages() {
        assert_eq!(
            MigrateError::ConsentMissing.to_string(),
            "refused: confirmation not granted"
        );
        assert_eq!(
            MigrateError::UnsupportedEngine("postgres".into()).to_string(),
            "refused: unsupported engine `postgres`"
        );
        assert!(MigrateError::UnsupportedVersion {
            version: "5.5.9".into()
        }
        .to_string()
        .starts_with("refused: unsupported server version"));
    }

    #[test]
    fn test_ddl_error_lists_changed_tables() {
        let err = MigrateError::DdlExecution {
            table: "GDN_Comment".into(),
            message: "lock wait timeout".into(),
            changed: vec!["GDN_Discussion".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("GDN_Comment"));
        assert!(msg.contains("already changed: GDN_Discussion"));

        let none = MigrateError::Cancelled { changed: vec![] };
        assert!(none.to_string().contains("already changed: none"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::ConsentMissing.exit_code(), EXIT_REFUSED);
        assert_eq!(MigrateError::Busy.exit_code(), EXIT_BUSY);
        assert_eq!(MigrateError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            MigrateError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "x")).exit_code(),
            EXIT_IO_ERROR
        );
        assert!(MigrateError::ConsentMissing.is_refusal());
        assert!(!MigrateError::Busy.is_refusal());
    }
}
