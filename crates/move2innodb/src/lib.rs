//! # move2innodb
//!
//! Switch the storage engine of a forum's `Discussion` and `Comment` tables
//! between InnoDB and MyISAM.
//!
//! A switch only happens when:
//!
//! - the operator has explicitly consented (persisted flag),
//! - the server supports FULLTEXT indexes on InnoDB (MySQL >= 5.6.4),
//! - the requested engine is InnoDB or MyISAM.
//!
//! Tables already on the requested engine are left alone, so running the
//! same migration twice is a no-op.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use move2innodb::{Config, EngineMigrator, FileConfigStore, MysqlBackend};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> move2innodb::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let backend = Arc::new(MysqlBackend::connect(&config.database).await?);
//!     let store = FileConfigStore::open(&config.settings.path)?;
//!     let migrator = EngineMigrator::from_backend(backend, &config);
//!     let report = migrator
//!         .migrate_with_store(&store, "InnoDB", &CancellationToken::new())
//!         .await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod migrator;
pub mod settings;
pub mod store;

// Re-exports for convenient access
pub use config::{Config, DatabaseConfig, FailurePolicy, MigrationConfig, SettingsConfig};
pub use crate::core::{
    ConfigStore, EngineKind, ManagedTable, MigrationLock, SchemaInspector, ServerFlavor,
    ServerVersion, SqlExecutor,
};
pub use drivers::{HealthCheckResult, MysqlBackend};
pub use error::{MigrateError, Result};
pub use migrator::{EngineMigrator, EngineStatus, MigrateOptions, MigrationReport, TableOutcome};
pub use settings::{Principal, SettingsController, SettingsForm, SettingsView};
pub use store::{FileConfigStore, MemoryConfigStore, CONSENT_KEY, USE_INNODB_KEY};
