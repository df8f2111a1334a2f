//! Server version parsing and the InnoDB fulltext version gate.
//!
//! Version strings such as `5.7.33-log`, `8.0.36-0ubuntu0.22.04.1` or
//! `10.6.16-MariaDB-1:10.6.16+maria~ubu2204` are reduced to their leading
//! numeric dotted prefix before comparison. The comparison is purely
//! numeric: it does not know about server brands, so MariaDB 10.x compares
//! as newer than MySQL 5.6.4.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MigrateError;

/// First MySQL release with FULLTEXT index support on InnoDB tables.
pub const FULLTEXT_MIN_VERSION: [u64; 3] = [5, 6, 4];

/// Numeric dotted server version.
///
/// Ordering compares segments left to right; missing trailing segments count
/// as zero, so `5.6` == `5.6.0`.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct ServerVersion {
    segments: Vec<u64>,
}

impl ServerVersion {
    pub fn new(segments: Vec<u64>) -> Self {
        Self { segments }
    }

    /// Parse the leading numeric dotted prefix of a server version string.
    ///
    /// Everything from the first character that is neither a digit nor a dot
    /// is discarded. Fails when no numeric segment remains.
    pub fn parse_prefix(raw: &str) -> Result<Self, MigrateError> {
        let prefix: &str = raw
            .trim()
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()
            .unwrap_or("");

        let mut segments = Vec::new();
        for part in prefix.split('.') {
            if part.is_empty() {
                // "5..6" or a trailing dot: stop at the first gap
                break;
            }
            let value = part
                .parse::<u64>()
                .map_err(|_| MigrateError::VersionParse(raw.to_string()))?;
            segments.push(value);
        }

        if segments.is_empty() {
            return Err(MigrateError::VersionParse(raw.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    fn segment(&self, idx: usize) -> u64 {
        self.segments.get(idx).copied().unwrap_or(0)
    }

    /// True when InnoDB supports FULLTEXT indexes on this version.
    pub fn supports_innodb_fulltext(&self) -> bool {
        *self >= Self::new(FULLTEXT_MIN_VERSION.to_vec())
    }
}

impl PartialEq for ServerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

impl FromStr for ServerVersion {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_prefix(s)
    }
}

/// Server family, detected from the version string for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerFlavor {
    Mysql,
    Mariadb,
}

impl ServerFlavor {
    pub fn detect(raw: &str) -> Self {
        if raw.to_ascii_lowercase().contains("mariadb") {
            ServerFlavor::Mariadb
        } else {
            ServerFlavor::Mysql
        }
    }
}

/// Decide fulltext availability from a raw version string.
///
/// Fails closed: an empty or unparseable string reports `false`.
pub fn fulltext_available(raw: &str) -> bool {
    match ServerVersion::parse_prefix(raw) {
        Ok(version) => version.supports_innodb_fulltext(),
        Err(_) => {
            tracing::warn!("Unrecognized server version '{}', treating as unsupported", raw);
            false
        }
    }
}
