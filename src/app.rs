use tracing::{info, warn};

use crate::config::Config;
use crate::errors::RestoreError;
use crate::gcp::{restore_backup_args, GcloudClientTrait};
use crate::types::{BackupRecord, RestoreOutcome, RestoreRequest};
use crate::verification::{select_latest, verify_backup};

/// Restores the newest verified backup of one Cloud SQL instance onto another.
pub struct Restorer {
    pub config: Config,
    pub gcloud: Box<dyn GcloudClientTrait>,
    pub dry_run_mode: bool,
}

impl Restorer {
    pub fn new(gcloud: Box<dyn GcloudClientTrait>, config: Config, dry_run_mode: bool) -> Self {
        Self {
            config,
            gcloud,
            dry_run_mode,
        }
    }

    pub async fn latest_backup(&self) -> Result<BackupRecord, RestoreError> {
        let backups = self
            .gcloud
            .list_backups(&self.config.project_id, &self.config.backup_instance)
            .await?;
        info!(
            instance = %self.config.backup_instance,
            count = backups.len(),
            "Listed backups"
        );

        let latest = select_latest(backups)?;
        info!(
            backup_id = %latest.id,
            end_time = %latest.end_time,
            status = %latest.status,
            backup_type = latest.backup_type.as_deref().unwrap_or("unknown"),
            source_instance = latest.instance.as_deref().unwrap_or("unknown"),
            "Selected most recent backup"
        );
        Ok(latest)
    }

    pub fn verify_backup(&self, backup: &BackupRecord) -> Result<(), RestoreError> {
        verify_backup(backup, &self.config)?;
        info!(backup_id = %backup.id, "Backup verified");
        Ok(())
    }

    pub fn restore_request(&self, backup_id: &str) -> RestoreRequest {
        RestoreRequest {
            backup_id: backup_id.to_string(),
            project_id: self.config.project_id.clone(),
            backup_instance: self.config.backup_instance.clone(),
            restore_instance: self.config.restore_instance.clone(),
        }
    }

    /// Submits the restore asynchronously. A returned outcome means the
    /// provider accepted the request, not that the restore finished.
    pub async fn restore_backup(&self, backup_id: &str) -> Result<RestoreOutcome, RestoreError> {
        let request = self.restore_request(backup_id);

        if self.dry_run_mode {
            let command = format!("gcloud {}", restore_backup_args(&request).join(" "));
            warn!(command = %command, "Dry-run mode, restore not submitted");
            return Ok(RestoreOutcome::DryRun {
                backup_id: backup_id.to_string(),
                command,
            });
        }

        info!(
            backup_id = %backup_id,
            backup_instance = %request.backup_instance,
            restore_instance = %request.restore_instance,
            "Submitting restore"
        );
        let output = self.gcloud.restore_backup(&request).await?;
        info!(
            stdout = %output.stdout.trim(),
            stderr = %output.stderr.trim(),
            "Restore request accepted"
        );

        Ok(RestoreOutcome::Submitted {
            backup_id: backup_id.to_string(),
            output,
        })
    }

    /// List, select, verify, restore. A verification failure stops the run
    /// before anything is submitted.
    pub async fn run(&self) -> Result<RestoreOutcome, RestoreError> {
        let latest = self.latest_backup().await?;
        self.verify_backup(&latest)?;
        self.restore_backup(&latest.id).await
    }
}
