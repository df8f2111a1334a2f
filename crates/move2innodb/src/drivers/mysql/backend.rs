//! MySQL/MariaDB backend over a mysql_async connection pool.

use std::time::Instant;

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, SslOpts};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::dialect::MysqlDialect;
use crate::config::{DatabaseConfig, SSL_MODES};
use crate::core::{EngineKind, ManagedTable, MigrationLock, SchemaInspector, SqlExecutor};
use crate::error::{MigrateError, Result};

/// Result of a connectivity check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub connected: bool,
    pub latency_ms: u64,
    pub server_version: Option<String>,
    pub error: Option<String>,
}

/// Forum database backend.
///
/// Implements [`SchemaInspector`], [`SqlExecutor`] and [`MigrationLock`].
/// The advisory lock is session-scoped in MySQL, so the connection that took
/// it is parked here until [`MigrationLock::release`].
pub struct MysqlBackend {
    pool: Pool,
    dialect: MysqlDialect,
    lock_conn: Mutex<Option<Conn>>,
}

impl MysqlBackend {
    /// Connect to the forum database from configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let ssl_opts = Self::build_ssl_opts(&config.ssl_mode)?;

        let mut builder = OptsBuilder::default()
            .ip_or_hostname(&config.host)
            .tcp_port(config.port)
            .db_name(Some(&config.database))
            .user(Some(&config.user))
            .pass(Some(&config.password));

        if let Some(ssl) = ssl_opts {
            builder = builder.ssl_opts(ssl);
        }

        let constraints = PoolConstraints::new(1, config.max_connections).ok_or_else(|| {
            MigrateError::Config("database.max_connections must be at least 1".into())
        })?;
        let opts: Opts = builder
            .pool_opts(PoolOpts::new().with_constraints(constraints))
            .into();
        let pool = Pool::new(opts);

        // Test connection
        let mut conn = pool
            .get_conn()
            .await
            .map_err(|e| MigrateError::database(e, "connecting to MySQL"))?;
        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| MigrateError::database(e, "testing MySQL connection"))?;
        drop(conn);

        info!(
            "Connected to MySQL: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            pool,
            dialect: MysqlDialect::new(),
            lock_conn: Mutex::new(None),
        })
    }

    /// Map `ssl_mode` to TLS options; `None` means plaintext.
    fn build_ssl_opts(ssl_mode: &str) -> Result<Option<SslOpts>> {
        let opts = match ssl_mode {
            "disable" => {
                warn!("MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
                None
            }
            "prefer" | "require" => {
                warn!(
                    "ssl_mode={}: TLS enabled but server certificate is not verified. \
                     Consider using 'verify-full' for production.",
                    ssl_mode
                );
                Some(SslOpts::default().with_danger_accept_invalid_certs(true))
            }
            "verify-ca" => {
                info!("ssl_mode=verify-ca: certificate chain verification enabled");
                Some(SslOpts::default().with_danger_skip_domain_validation(true))
            }
            "verify-full" => {
                info!("ssl_mode=verify-full: certificate verification enabled");
                Some(SslOpts::default())
            }
            other => {
                return Err(MigrateError::Config(format!(
                    "Invalid ssl_mode '{}'. Valid options: {}",
                    other,
                    SSL_MODES.join(", ")
                )))
            }
        };
        Ok(opts)
    }

    async fn conn(&self, context: &str) -> Result<Conn> {
        self.pool
            .get_conn()
            .await
            .map_err(|e| MigrateError::database(e, context))
    }

    /// Round-trip a trivial query and report latency and server version.
    pub async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let outcome: Result<String> = async {
            let mut conn = self.conn("health check").await?;
            conn.query_first::<String, _>(self.dialect.version_query())
                .await
                .map_err(|e| MigrateError::database(e, "health check"))?
                .ok_or_else(|| MigrateError::database("empty result", "health check"))
        }
        .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(version) => HealthCheckResult {
                connected: true,
                latency_ms,
                server_version: Some(version),
                error: None,
            },
            Err(e) => HealthCheckResult {
                connected: false,
                latency_ms,
                server_version: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Release the advisory lock connection (if any) and close the pool.
    pub async fn close(self) {
        if let Some(conn) = self.lock_conn.into_inner() {
            drop(conn);
        }
        if let Err(e) = self.pool.disconnect().await {
            warn!("Error closing MySQL pool: {}", e);
        }
    }
}

#[async_trait]
impl SchemaInspector for MysqlBackend {
    async fn server_version(&self) -> Result<String> {
        let mut conn = self.conn("reading server version").await?;
        let version: Option<String> = conn
            .query_first(self.dialect.version_query())
            .await
            .map_err(|e| MigrateError::database(e, "reading server version"))?;
        version.ok_or_else(|| MigrateError::database("VERSION() returned no row", "reading server version"))
    }

    async fn table_engines(&self, tables: &[String]) -> Result<Vec<ManagedTable>> {
        if tables.is_empty() {
            return Ok(Vec::new());
        }

        let sql = self.dialect.build_engine_query(tables.len());
        debug!("Inspecting engines: {}", sql);

        let params: Vec<mysql_async::Value> =
            tables.iter().map(|t| mysql_async::Value::from(t.as_str())).collect();

        let mut conn = self.conn("inspecting table engines").await?;
        let rows: Vec<(String, Option<String>)> = conn
            .exec(sql, params)
            .await
            .map_err(|e| MigrateError::database(e, "inspecting table engines"))?;

        Ok(rows
            .into_iter()
            .map(|(name, engine)| ManagedTable::new(name, engine.unwrap_or_default()))
            .collect())
    }
}

#[async_trait]
impl SqlExecutor for MysqlBackend {
    async fn alter_engine(&self, table: &str, engine: EngineKind) -> Result<()> {
        let sql = self.dialect.build_alter_engine(table, engine);
        debug!("Executing: {}", sql);

        let mut conn = self.conn("altering table engine").await?;
        conn.query_drop(sql)
            .await
            .map_err(|e| MigrateError::database(e, format!("ALTER TABLE {}", table)))
    }
}

#[async_trait]
impl MigrationLock for MysqlBackend {
    async fn try_acquire(&self, name: &str) -> Result<bool> {
        let mut slot = self.lock_conn.lock().await;
        if slot.is_some() {
            // Already held by this backend
            return Ok(false);
        }

        let mut conn = self.conn("acquiring advisory lock").await?;
        let got: Option<Option<i64>> = conn
            .exec_first(self.dialect.lock_query(), (name,))
            .await
            .map_err(|e| MigrateError::database(e, "acquiring advisory lock"))?;

        if got.flatten() == Some(1) {
            debug!("Acquired advisory lock '{}'", name);
            *slot = Some(conn);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn release(&self, name: &str) -> Result<()> {
        let conn = self.lock_conn.lock().await.take();
        if let Some(mut conn) = conn {
            let _: Option<Option<i64>> = conn
                .exec_first(self.dialect.unlock_query(), (name,))
                .await
                .map_err(|e| MigrateError::database(e, "releasing advisory lock"))?;
            debug!("Released advisory lock '{}'", name);
        }
        Ok(())
    }
}
