//! Collaborator traits consumed by the engine migrator.
//!
//! - [`SchemaInspector`]: reads server version and current table engines
//! - [`SqlExecutor`]: runs the ALTER TABLE statements
//! - [`MigrationLock`]: cross-process mutual exclusion for a run
//! - [`ConfigStore`]: persisted boolean flags (consent, desired state)
//!
//! The MySQL driver implements the first three; settings stores live in
//! [`crate::store`].

use async_trait::async_trait;

use crate::error::Result;

use super::engine::{EngineKind, ManagedTable};

/// Read-only view of the live schema.
#[async_trait]
pub trait SchemaInspector: Send + Sync {
    /// Raw server version string as returned by `SELECT VERSION()`.
    async fn server_version(&self) -> Result<String>;

    /// Current engines for the given tables in the connected database.
    ///
    /// Tables that do not exist are simply absent from the result.
    async fn table_engines(&self, tables: &[String]) -> Result<Vec<ManagedTable>>;
}

/// Executes engine-changing DDL.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Change the storage engine of one table.
    ///
    /// An `Err` means the statement failed; the caller decides whether to
    /// continue with the remaining tables.
    async fn alter_engine(&self, table: &str, engine: EngineKind) -> Result<()>;
}

/// Named lock held for the duration of one migration run.
#[async_trait]
pub trait MigrationLock: Send + Sync {
    /// Try to take the lock without waiting. Returns `false` if held elsewhere.
    async fn try_acquire(&self, name: &str) -> Result<bool>;

    /// Release a lock taken with [`try_acquire`](Self::try_acquire).
    async fn release(&self, name: &str) -> Result<()>;
}

/// Lock that always succeeds, for backends without advisory locks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLock;

#[async_trait]
impl MigrationLock for NoLock {
    async fn try_acquire(&self, _name: &str) -> Result<bool> {
        Ok(true)
    }

    async fn release(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}

/// Persisted boolean settings keyed by name.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Stored value, or `None` if the key was never set.
    async fn get_flag(&self, key: &str) -> Result<Option<bool>>;

    /// Store a value, persisting it before returning.
    async fn set_flag(&self, key: &str, value: bool) -> Result<()>;

    /// Stored value or `default` when unset.
    async fn flag_or(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self.get_flag(key).await?.unwrap_or(default))
    }

    /// Set `key` to `default` only if it has no value yet.
    async fn touch_flag(&self, key: &str, default: bool) -> Result<()> {
        if self.get_flag(key).await?.is_none() {
            self.set_flag(key, default).await?;
        }
        Ok(())
    }
}
