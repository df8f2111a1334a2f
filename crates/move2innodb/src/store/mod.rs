//! Persisted settings flags.
//!
//! Implementations of [`ConfigStore`](crate::core::ConfigStore):
//!
//! - [`FileConfigStore`]: JSON file, written atomically
//! - [`MemoryConfigStore`]: in-process map for tests and dry runs

mod file;
mod memory;

pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;

/// Explicit operator consent to change table engines.
pub const CONSENT_KEY: &str = "move2InnoDB.IKnowWhatIDo";

/// Desired state shown on the settings form: InnoDB when true.
pub const USE_INNODB_KEY: &str = "move2InnoDB.UseInnoDB";
