//! Core domain types and collaborator traits.

pub mod engine;
pub mod traits;
pub mod version;

pub use engine::{managed_table_names, EngineKind, ManagedTable, MANAGED_TABLES};
pub use traits::{ConfigStore, MigrationLock, NoLock, SchemaInspector, SqlExecutor};
pub use version::{fulltext_available, ServerFlavor, ServerVersion, FULLTEXT_MIN_VERSION};
