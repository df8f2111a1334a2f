//! MySQL/MariaDB SQL text.

use crate::core::EngineKind;

/// MySQL/MariaDB dialect for the handful of statements this tool issues.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// Quote an identifier, doubling embedded backticks.
    pub fn quote_ident(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    /// `ALTER TABLE` statement switching one table's engine.
    pub fn build_alter_engine(&self, table: &str, engine: EngineKind) -> String {
        format!("ALTER TABLE {} ENGINE={}", self.quote_ident(table), engine.as_str())
    }

    /// Query returning `(table_name, engine)` for `count` bound table names
    /// in the current database.
    pub fn build_engine_query(&self, count: usize) -> String {
        let placeholders = vec!["?"; count].join(", ");
        // CAST avoids collation/binary surprises from information_schema on 8.0
        format!(
            "SELECT CAST(table_name AS CHAR(255)) AS table_name, \
                    CAST(engine AS CHAR(64)) AS engine \
             FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name IN ({})",
            placeholders
        )
    }

    pub fn version_query(&self) -> &'static str {
        "SELECT VERSION()"
    }

    /// Non-blocking advisory lock acquisition.
    pub fn lock_query(&self) -> &'static str {
        "SELECT GET_LOCK(?, 0)"
    }

    pub fn unlock_query(&self) -> &'static str {
        "SELECT RELEASE_LOCK(?)"
    }
}
