//! Outcome of one engine migration run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::EngineKind;
use crate::error::Result;

/// Summary when a run made no changes and hit no failures.
pub const NO_CHANGES: &str = "no table has been changed";

/// Separator between per-table notes in [`MigrationReport::summary`].
pub const NOTE_SEPARATOR: &str = "\n";

/// What happened to one managed table, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TableOutcome {
    /// ALTER issued and succeeded.
    Changed {
        table: String,
        from: String,
        to: EngineKind,
    },
    /// Already on the target engine.
    Unchanged { table: String, engine: String },
    /// Not present in the connected database.
    Missing { table: String },
    /// ALTER issued and failed.
    Failed {
        table: String,
        from: String,
        message: String,
    },
}

impl TableOutcome {
    pub fn table(&self) -> &str {
        match self {
            TableOutcome::Changed { table, .. }
            | TableOutcome::Unchanged { table, .. }
            | TableOutcome::Missing { table }
            | TableOutcome::Failed { table, .. } => table,
        }
    }

    /// Human-readable note for changed and failed tables.
    pub fn note(&self) -> Option<String> {
        match self {
            TableOutcome::Changed { table, from, to } => {
                Some(format!("`{}` changed from `{}` to `{}`", table, from, to))
            }
            TableOutcome::Failed { table, message, .. } => {
                Some(format!("`{}` failed: {}", table, message))
            }
            TableOutcome::Unchanged { .. } | TableOutcome::Missing { .. } => None,
        }
    }
}

/// Result of a migration run that passed all guards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Unique run identifier.
    pub run_id: String,

    /// Engine the run switched to.
    pub target: EngineKind,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Per-table outcomes in processing order.
    pub outcomes: Vec<TableOutcome>,
}

impl MigrationReport {
    /// Tables whose engine was changed.
    pub fn changed_tables(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, TableOutcome::Changed { .. }))
            .map(|o| o.table().to_string())
            .collect()
    }

    /// Tables whose ALTER failed.
    pub fn failed_tables(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, TableOutcome::Failed { .. }))
            .map(|o| o.table().to_string())
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, TableOutcome::Failed { .. }))
    }

    /// Per-table notes joined by [`NOTE_SEPARATOR`], or [`NO_CHANGES`].
    pub fn summary(&self) -> String {
        let notes: Vec<String> = self.outcomes.iter().filter_map(TableOutcome::note).collect();
        if notes.is_empty() {
            NO_CHANGES.to_string()
        } else {
            notes.join(NOTE_SEPARATOR)
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcomes: Vec<TableOutcome>) -> MigrationReport {
        let now = Utc::now();
        MigrationReport {
            run_id: "test".into(),
            target: EngineKind::InnoDb,
            started_at: now,
            completed_at: now,
            duration_seconds: 0.0,
            outcomes,
        }
    }

    #[test]
    fn test_summary_no_changes() {
        let r = report(vec![
            TableOutcome::Unchanged {
                table: "GDN_Discussion".into(),
                engine: "InnoDB".into(),
            },
            TableOutcome::Missing {
                table: "GDN_Comment".into(),
            },
        ]);
        assert_eq!(r.summary(), NO_CHANGES);
        assert!(r.changed_tables().is_empty());
    }

    #[test]
    fn test_summary_joins_without_trailing_separator() {
        let r = report(vec![
            TableOutcome::Changed {
                table: "GDN_Discussion".into(),
                from: "MyISAM".into(),
                to: EngineKind::InnoDb,
            },
            TableOutcome::Failed {
                table: "GDN_Comment".into(),
                from: "MyISAM".into(),
                message: "lock wait timeout".into(),
            },
        ]);
        assert_eq!(
            r.summary(),
            "`GDN_Discussion` changed from `MyISAM` to `InnoDB`\n`GDN_Comment` failed: lock wait timeout"
        );
        assert!(r.has_failures());
        assert_eq!(r.failed_tables(), vec!["GDN_Comment".to_string()]);
    }

    #[test]
    fn test_to_json_tags_outcomes() {
        let r = report(vec![TableOutcome::Missing {
            table: "GDN_Comment".into(),
        }]);
        let json = r.to_json().unwrap();
        assert!(json.contains("\"outcome\": \"missing\""));
        assert!(json.contains("\"target\": \"InnoDB\""));
    }
}
