use chrono::{DateTime, Utc};
use std::env;
use tracing::debug;

use crate::errors::RestoreError;

pub const PROJECT_ID: &str = "project_id";
pub const BACKUP_INSTANCE: &str = "backup_instance";
pub const RESTORE_INSTANCE: &str = "restore_instance";

/// Settings for a single restore run.
///
/// `current_time` is captured once when the configuration is built and is the
/// "now" every verification compares against, for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub project_id: String,
    pub backup_instance: String,
    pub restore_instance: String,
    pub current_time: DateTime<Utc>,
}

impl Config {
    pub fn from_env() -> Result<Self, RestoreError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. All missing keys are reported together.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RestoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut fetch = |key: &str| {
            let value = lookup(key);
            if value.is_none() {
                missing.push(key.to_string());
            }
            value.unwrap_or_default()
        };

        let project_id = fetch(PROJECT_ID);
        let backup_instance = fetch(BACKUP_INSTANCE);
        let restore_instance = fetch(RESTORE_INSTANCE);

        if !missing.is_empty() {
            return Err(RestoreError::Configuration { missing });
        }

        let config = Self::with_current_time(
            &project_id,
            &backup_instance,
            &restore_instance,
            Utc::now(),
        );
        debug!(
            project_id = %config.project_id,
            backup_instance = %config.backup_instance,
            restore_instance = %config.restore_instance,
            current_time = %config.current_time,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn with_current_time(
        project_id: &str,
        backup_instance: &str,
        restore_instance: &str,
        current_time: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id: project_id.to_string(),
            backup_instance: backup_instance.to_string(),
            restore_instance: restore_instance.to_string(),
            current_time,
        }
    }
}
