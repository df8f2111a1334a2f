//! Administrative settings action.
//!
//! The operator-facing entry point: a permission-gated form with one
//! checkbox ("use InnoDB for Discussion and Comment"). Submitting it stores
//! the consent flag and triggers the matching engine migration.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::{ConfigStore, EngineKind};
use crate::error::{MigrateError, Result};
use crate::migrator::{EngineMigrator, MigrationReport};
use crate::store::{CONSENT_KEY, USE_INNODB_KEY};

/// Capability required to view or submit the settings form.
pub const MANAGE_SETTINGS: &str = "Garden.Settings.Manage";

const NOTICE_CAUTION: &str = "Changing the storage engine rewrites the Discussion and Comment \
tables and changes how fulltext search ranks results. Only enable this if you know what you \
are doing.";

const NOTICE_UNSUPPORTED: &str = "Wrong version of MySQL. Nothing will happen here...";

/// Caller identity with its granted permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    pub permissions: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Local operator allowed to manage settings.
    pub fn operator(name: impl Into<String>) -> Self {
        Self::new(name, [MANAGE_SETTINGS])
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    fn require(&self, permission: &str) -> Result<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(MigrateError::PermissionDenied(permission.to_string()))
        }
    }
}

/// Submitted form values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsForm {
    pub use_innodb: bool,
}

impl SettingsForm {
    pub fn target(&self) -> EngineKind {
        if self.use_innodb {
            EngineKind::InnoDb
        } else {
            EngineKind::MyIsam
        }
    }
}

/// Form state for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsView {
    /// Current value of the checkbox.
    pub use_innodb: bool,
    /// False when the server cannot host InnoDB fulltext indexes.
    pub enabled: bool,
    pub notice: String,
}

/// Settings page controller.
pub struct SettingsController {
    migrator: Arc<EngineMigrator>,
    store: Arc<dyn ConfigStore>,
}

impl SettingsController {
    pub fn new(migrator: Arc<EngineMigrator>, store: Arc<dyn ConfigStore>) -> Self {
        Self { migrator, store }
    }

    /// Activation hook: make sure consent defaults to false, then try to
    /// switch to InnoDB (refused unless consent was already given).
    pub async fn setup(&self, cancel: &CancellationToken) -> Result<MigrationReport> {
        self.store.touch_flag(CONSENT_KEY, false).await?;
        self.migrator
            .migrate_with_store(self.store.as_ref(), EngineKind::InnoDb.as_str(), cancel)
            .await
    }

    /// Current form state.
    pub async fn view(&self, principal: &Principal) -> Result<SettingsView> {
        principal.require(MANAGE_SETTINGS)?;

        let use_innodb = self.store.flag_or(USE_INNODB_KEY, false).await?;
        let enabled = self.migrator.is_fulltext_available().await?;
        let notice = if enabled {
            NOTICE_CAUTION
        } else {
            NOTICE_UNSUPPORTED
        };

        Ok(SettingsView {
            use_innodb,
            enabled,
            notice: notice.to_string(),
        })
    }

    /// Handle a form submission.
    ///
    /// Enabling stores consent before migrating to InnoDB. Disabling
    /// migrates back to MyISAM first and withdraws consent afterwards,
    /// whatever the migration outcome.
    pub async fn submit(
        &self,
        principal: &Principal,
        form: SettingsForm,
        cancel: &CancellationToken,
    ) -> Result<MigrationReport> {
        principal.require(MANAGE_SETTINGS)?;
        info!(
            "{} submitted engine settings: use_innodb={}",
            principal.name, form.use_innodb
        );

        let target = form.target();
        if form.use_innodb {
            self.store.set_flag(CONSENT_KEY, true).await?;
            self.store.set_flag(USE_INNODB_KEY, true).await?;
            self.migrator
                .migrate_with_store(self.store.as_ref(), target.as_str(), cancel)
                .await
        } else {
            let result = self
                .migrator
                .migrate_with_store(self.store.as_ref(), target.as_str(), cancel)
                .await;
            self.store.set_flag(USE_INNODB_KEY, false).await?;
            self.store.set_flag(CONSENT_KEY, false).await?;
            result
        }
    }
}
