//! MySQL/MariaDB database driver.
//!
//! - [`MysqlDialect`]: SQL text for introspection, DDL and advisory locks
//! - [`MysqlBackend`]: pooled connection implementing the collaborator traits
//!
//! # Supported Versions
//!
//! Any MySQL or MariaDB server that exposes `information_schema.tables`.
//! Switching to InnoDB is additionally gated on version 5.6.4.

mod backend;
mod dialect;

pub use backend::{HealthCheckResult, MysqlBackend};
pub use dialect::MysqlDialect;
