//! Storage engines and the tables whose engine can be switched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MigrateError;

/// Storage engines this tool can switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineKind {
    #[serde(rename = "InnoDB")]
    InnoDb,
    #[serde(rename = "MyISAM")]
    MyIsam,
}

impl EngineKind {
    /// Canonical spelling as used in `ENGINE=` clauses.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::InnoDb => "InnoDB",
            EngineKind::MyIsam => "MyISAM",
        }
    }

    /// Case-insensitive comparison against an engine label reported by the server.
    pub fn matches(&self, label: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(label.trim())
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "innodb" => Ok(EngineKind::InnoDb),
            "myisam" => Ok(EngineKind::MyIsam),
            _ => Err(MigrateError::UnsupportedEngine(s.to_string())),
        }
    }
}

/// The two forum tables managed by this tool, in processing order.
pub const MANAGED_TABLES: [&str; 2] = ["Discussion", "Comment"];

/// Physical names of the managed tables for a given table prefix.
pub fn managed_table_names(prefix: &str) -> Vec<String> {
    MANAGED_TABLES
        .iter()
        .map(|t| format!("{}{}", prefix, t))
        .collect()
}

/// A managed table together with the engine the server currently reports.
///
/// The engine label is kept verbatim: servers may report engines other than
/// InnoDB/MyISAM (e.g. `Aria` on MariaDB).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedTable {
    pub name: String,
    pub current_engine: String,
}

impl ManagedTable {
    pub fn new(name: impl Into<String>, current_engine: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current_engine: current_engine.into(),
        }
    }

    /// Whether an ALTER is required to reach `target`.
    pub fn needs_change(&self, target: EngineKind) -> bool {
        !target.matches(&self.current_engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("innodb".parse::<EngineKind>().unwrap(), EngineKind::InnoDb);
        assert_eq!("INNODB".parse::<EngineKind>().unwrap(), EngineKind::InnoDb);
        assert_eq!("MyIsam".parse::<EngineKind>().unwrap(), EngineKind::MyIsam);
        assert_eq!(" myisam ".parse::<EngineKind>().unwrap(), EngineKind::MyIsam);
    }

    #[test]
    fn test_parse_rejects_other_engines() {
        let err = "postgres".parse::<EngineKind>().unwrap_err();
        assert!(matches!(err, MigrateError::UnsupportedEngine(ref v) if v == "postgres"));
        assert!("Aria".parse::<EngineKind>().is_err());
        assert!("".parse::<EngineKind>().is_err());
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(EngineKind::InnoDb.to_string(), "InnoDB");
        assert_eq!(EngineKind::MyIsam.to_string(), "MyISAM");
    }

    #[test]
    fn test_managed_table_names() {
        assert_eq!(
            managed_table_names("GDN_"),
            vec!["GDN_Discussion".to_string(), "GDN_Comment".to_string()]
        );
        assert_eq!(managed_table_names(""), vec!["Discussion", "Comment"]);
    }

    #[test]
    fn test_needs_change() {
        let table = ManagedTable::new("GDN_Comment", "innodb");
        assert!(!table.needs_change(EngineKind::InnoDb));
        assert!(table.needs_change(EngineKind::MyIsam));

        let aria = ManagedTable::new("GDN_Comment", "Aria");
        assert!(aria.needs_change(EngineKind::InnoDb));
        assert!(aria.needs_change(EngineKind::MyIsam));
    }
}
