//! In-memory database fake shared by the migrator and settings tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::EngineMigrator;
use crate::core::{EngineKind, ManagedTable, MigrationLock, SchemaInspector, SqlExecutor};
use crate::error::{MigrateError, Result};

/// Fake server: version string, table engines, recorded ALTERs.
pub(crate) struct FakeDatabase {
    version: String,
    tables: Mutex<Vec<ManagedTable>>,
    alters: Mutex<Vec<(String, EngineKind)>>,
    failing: Vec<String>,
    queries: AtomicUsize,
    locked_elsewhere: AtomicBool,
    lock_held: AtomicBool,
    cancel_after_alter: Option<CancellationToken>,
    gate: Option<Arc<Notify>>,
}

impl FakeDatabase {
    pub fn new(version: &str, tables: &[(&str, &str)]) -> Self {
        Self {
            version: version.to_string(),
            tables: Mutex::new(
                tables
                    .iter()
                    .map(|(name, engine)| ManagedTable::new(*name, *engine))
                    .collect(),
            ),
            alters: Mutex::new(Vec::new()),
            failing: Vec::new(),
            queries: AtomicUsize::new(0),
            locked_elsewhere: AtomicBool::new(false),
            lock_held: AtomicBool::new(false),
            cancel_after_alter: None,
            gate: None,
        }
    }

    /// Standard forum tables with the given engines.
    pub fn forum(version: &str, discussion: &str, comment: &str) -> Self {
        Self::new(
            version,
            &[("GDN_Discussion", discussion), ("GDN_Comment", comment)],
        )
    }

    pub fn failing_on(mut self, table: &str) -> Self {
        self.failing.push(table.to_string());
        self
    }

    pub fn locked_elsewhere(self) -> Self {
        self.locked_elsewhere.store(true, Ordering::SeqCst);
        self
    }

    /// Cancel `token` right after the first successful ALTER.
    pub fn cancel_after_alter(mut self, token: CancellationToken) -> Self {
        self.cancel_after_alter = Some(token);
        self
    }

    /// Block every ALTER until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn alters(&self) -> Vec<(String, EngineKind)> {
        self.alters.lock().unwrap().clone()
    }

    pub fn alter_count(&self) -> usize {
        self.alters.lock().unwrap().len()
    }

    /// Number of inspector calls (version + engine queries).
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn engine_of(&self, table: &str) -> Option<String> {
        self.tables
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.current_engine.clone())
    }

    pub fn lock_held(&self) -> bool {
        self.lock_held.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaInspector for FakeDatabase {
    async fn server_version(&self) -> Result<String> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.version.clone())
    }

    async fn table_engines(&self, tables: &[String]) -> Result<Vec<ManagedTable>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        // Reverse order: callers must not rely on the server's row order
        Ok(self
            .tables
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|t| tables.contains(&t.name))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SqlExecutor for FakeDatabase {
    async fn alter_engine(&self, table: &str, engine: EngineKind) -> Result<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.failing.iter().any(|t| t == table) {
            return Err(MigrateError::database(
                "Lock wait timeout exceeded",
                format!("ALTER TABLE {}", table),
            ));
        }
        self.alters
            .lock()
            .unwrap()
            .push((table.to_string(), engine));
        if let Some(t) = self
            .tables
            .lock()
            .unwrap()
            .iter_mut()
            .find(|t| t.name == table)
        {
            t.current_engine = engine.to_string();
        }
        if let Some(token) = &self.cancel_after_alter {
            token.cancel();
        }
        Ok(())
    }
}

#[async_trait]
impl MigrationLock for FakeDatabase {
    async fn try_acquire(&self, _name: &str) -> Result<bool> {
        if self.locked_elsewhere.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(!self.lock_held.swap(true, Ordering::SeqCst))
    }

    async fn release(&self, _name: &str) -> Result<()> {
        self.lock_held.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Migrator over `db` with prefix `GDN_` and `db` as the lock.
pub(crate) fn migrator(db: &Arc<FakeDatabase>) -> EngineMigrator {
    EngineMigrator::new(db.clone(), db.clone(), "GDN_").with_lock(db.clone())
}
