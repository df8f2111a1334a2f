//! Engine migrator - the guarded check-then-alter procedure.
//!
//! A run passes three guards in a fixed order before touching the schema:
//!
//! 1. operator consent (no database access when missing)
//! 2. server version supports InnoDB fulltext (>= 5.6.4)
//! 3. target engine is InnoDB or MyISAM
//!
//! It then reads the current engine of each managed table and issues one
//! `ALTER TABLE ... ENGINE=...` per table that differs. Nothing is rolled
//! back: each ALTER stands on its own, and re-running is a no-op.

mod report;

pub use report::{MigrationReport, TableOutcome, NOTE_SEPARATOR, NO_CHANGES};

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, FailurePolicy, MigrationConfig};
use crate::core::{
    fulltext_available, managed_table_names, ConfigStore, EngineKind, ManagedTable,
    MigrationLock, NoLock, SchemaInspector, ServerFlavor, SqlExecutor,
};
use crate::error::{MigrateError, Result};
use crate::store::CONSENT_KEY;

/// Per-run behavior.
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub failure_policy: FailurePolicy,
    pub deadline: Option<Duration>,
    pub lock_name: String,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        MigrateOptions::from(&MigrationConfig::default())
    }
}

impl From<&MigrationConfig> for MigrateOptions {
    fn from(config: &MigrationConfig) -> Self {
        Self {
            failure_policy: config.failure_policy,
            deadline: config.deadline(),
            lock_name: config.lock_name.clone(),
        }
    }
}

/// Read-only snapshot of the server and the managed tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub server_version: String,
    pub flavor: ServerFlavor,
    pub fulltext_available: bool,
    pub tables: Vec<ManagedTable>,
    pub missing: Vec<String>,
}

/// Switches the managed forum tables between storage engines.
pub struct EngineMigrator {
    inspector: Arc<dyn SchemaInspector>,
    executor: Arc<dyn SqlExecutor>,
    lock: Arc<dyn MigrationLock>,
    table_prefix: String,
    options: MigrateOptions,
    running: Mutex<()>,
}

impl EngineMigrator {
    /// Create a migrator with default options and no cross-process lock.
    pub fn new(
        inspector: Arc<dyn SchemaInspector>,
        executor: Arc<dyn SqlExecutor>,
        table_prefix: impl Into<String>,
    ) -> Self {
        Self {
            inspector,
            executor,
            lock: Arc::new(NoLock),
            table_prefix: table_prefix.into(),
            options: MigrateOptions::default(),
            running: Mutex::new(()),
        }
    }

    /// Create a migrator over one backend that inspects, alters and locks.
    pub fn from_backend<B>(backend: Arc<B>, config: &Config) -> Self
    where
        B: SchemaInspector + SqlExecutor + MigrationLock + 'static,
    {
        Self::new(
            backend.clone(),
            backend.clone(),
            config.database.table_prefix.clone(),
        )
        .with_lock(backend)
        .with_options(MigrateOptions::from(&config.migration))
    }

    /// Guard runs with a cross-process lock.
    pub fn with_lock(mut self, lock: Arc<dyn MigrationLock>) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_options(mut self, options: MigrateOptions) -> Self {
        self.options = options;
        self
    }

    /// Physical names of the managed tables, in processing order.
    pub fn table_names(&self) -> Vec<String> {
        managed_table_names(&self.table_prefix)
    }

    /// Whether the server supports FULLTEXT indexes on InnoDB.
    ///
    /// Unparseable version strings count as unsupported.
    pub async fn is_fulltext_available(&self) -> Result<bool> {
        let version = self.inspector.server_version().await?;
        Ok(fulltext_available(&version))
    }

    /// Server version and current engines, without changing anything.
    pub async fn status(&self) -> Result<EngineStatus> {
        let server_version = self.inspector.server_version().await?;
        let names = self.table_names();
        let current = self.inspector.table_engines(&names).await?;

        let mut tables = Vec::new();
        let mut missing = Vec::new();
        for name in &names {
            match find_table(&current, name) {
                Some(t) => tables.push(t.clone()),
                None => missing.push(name.clone()),
            }
        }

        Ok(EngineStatus {
            flavor: ServerFlavor::detect(&server_version),
            fulltext_available: fulltext_available(&server_version),
            server_version,
            tables,
            missing,
        })
    }

    /// Run with the consent flag read once from `store`.
    pub async fn migrate_with_store(
        &self,
        store: &dyn ConfigStore,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<MigrationReport> {
        let consent = store.flag_or(CONSENT_KEY, false).await?;
        self.migrate(consent, target, cancel).await
    }

    /// Switch the managed tables to `target`.
    ///
    /// `consent` is the operator's explicit confirmation for this call.
    /// Guards short-circuit in order: consent, server version, engine name.
    pub async fn migrate(
        &self,
        consent: bool,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<MigrationReport> {
        if !consent {
            warn!("Engine migration to '{}' refused: no operator consent", target);
            return Err(MigrateError::ConsentMissing);
        }

        let version = self.inspector.server_version().await?;
        if !fulltext_available(&version) {
            warn!("Engine migration refused: server version '{}' is too old", version);
            return Err(MigrateError::UnsupportedVersion { version });
        }

        let target: EngineKind = target.parse().map_err(|e| {
            warn!("Engine migration refused: {}", e);
            e
        })?;

        let _running = self.running.try_lock().map_err(|_| MigrateError::Busy)?;

        let lock_name = self.options.lock_name.as_str();
        if !self.lock.try_acquire(lock_name).await? {
            warn!("Advisory lock '{}' is held by another session", lock_name);
            return Err(MigrateError::Busy);
        }

        let result = self.run(target, cancel).await;

        if let Err(e) = self.lock.release(lock_name).await {
            warn!("Failed to release advisory lock '{}': {}", lock_name, e);
        }

        result
    }

    async fn run(&self, target: EngineKind, cancel: &CancellationToken) -> Result<MigrationReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        let deadline = self.options.deadline.map(|d| clock + d);

        info!("Starting engine migration {} to {}", run_id, target);

        let names = self.table_names();
        let current = self.inspector.table_engines(&names).await?;

        let mut outcomes = Vec::with_capacity(names.len());
        let mut changed: Vec<String> = Vec::new();

        for name in &names {
            let Some(table) = find_table(&current, name) else {
                warn!("Table {} not found, skipping", name);
                outcomes.push(TableOutcome::Missing {
                    table: name.clone(),
                });
                continue;
            };

            if !table.needs_change(target) {
                debug!("{} already uses {}", table.name, table.current_engine);
                outcomes.push(TableOutcome::Unchanged {
                    table: table.name.clone(),
                    engine: table.current_engine.clone(),
                });
                continue;
            }

            if cancel.is_cancelled() {
                warn!("Engine migration {} cancelled before {}", run_id, table.name);
                return Err(MigrateError::Cancelled { changed });
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!("Engine migration {} hit its deadline before {}", run_id, table.name);
                return Err(MigrateError::DeadlineExceeded { changed });
            }

            match self.executor.alter_engine(&table.name, target).await {
                Ok(()) => {
                    info!(
                        "Engine of {} changed from {} to {}",
                        table.name, table.current_engine, target
                    );
                    changed.push(table.name.clone());
                    outcomes.push(TableOutcome::Changed {
                        table: table.name.clone(),
                        from: table.current_engine.clone(),
                        to: target,
                    });
                }
                Err(e) => match self.options.failure_policy {
                    FailurePolicy::Halt => {
                        warn!("ALTER TABLE {} failed, halting: {}", table.name, e);
                        return Err(MigrateError::DdlExecution {
                            table: table.name.clone(),
                            message: e.to_string(),
                            changed,
                        });
                    }
                    FailurePolicy::Continue => {
                        warn!("ALTER TABLE {} failed, continuing: {}", table.name, e);
                        outcomes.push(TableOutcome::Failed {
                            table: table.name.clone(),
                            from: table.current_engine.clone(),
                            message: e.to_string(),
                        });
                    }
                },
            }
        }

        let report = MigrationReport {
            run_id,
            target,
            started_at,
            completed_at: Utc::now(),
            duration_seconds: clock.elapsed().as_secs_f64(),
            outcomes,
        };
        info!("Engine migration {} finished: {}", report.run_id, report.summary());
        Ok(report)
    }
}

/// MySQL folds table names to lower case on some platforms
/// (`lower_case_table_names`), so match names case-insensitively.
fn find_table<'a>(tables: &'a [ManagedTable], name: &str) -> Option<&'a ManagedTable> {
    tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
pub(crate) mod testing;
