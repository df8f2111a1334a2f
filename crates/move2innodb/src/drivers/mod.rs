//! Database driver implementations.
//!
//! - [`mysql`]: MySQL/MariaDB backend implementing the schema inspection,
//!   DDL execution and advisory lock traits.

pub mod mysql;

pub use mysql::{HealthCheckResult, MysqlBackend, MysqlDialect};
