use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, warn};

use crate::errors::RestoreError;
use crate::types::{BackupRecord, CommandOutput, RestoreRequest};

pub const DEFAULT_GCLOUD: &str = "gcloud";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

#[mockall::automock]
#[async_trait]
pub trait GcloudClientTrait: Send + Sync {
    async fn list_backups(
        &self,
        project_id: &str,
        instance_id: &str,
    ) -> Result<Vec<BackupRecord>, RestoreError>;
    async fn restore_backup(
        &self,
        restore_request: &RestoreRequest,
    ) -> Result<CommandOutput, RestoreError>;
}

pub fn list_backups_args(project_id: &str, instance_id: &str) -> Vec<String> {
    vec![
        "sql".to_string(),
        "backups".to_string(),
        "list".to_string(),
        "-i".to_string(),
        instance_id.to_string(),
        "--project".to_string(),
        project_id.to_string(),
        "--format=json".to_string(),
    ]
}

pub fn restore_backup_args(restore_request: &RestoreRequest) -> Vec<String> {
    vec![
        "sql".to_string(),
        "backups".to_string(),
        "restore".to_string(),
        restore_request.backup_id.clone(),
        format!("--restore-instance={}", restore_request.restore_instance),
        "--project".to_string(),
        restore_request.project_id.clone(),
        format!("--backup-instance={}", restore_request.backup_instance),
        "--async".to_string(),
        "--quiet".to_string(),
    ]
}

/// Runs the gcloud CLI as a child process, one bounded call at a time.
pub struct GcloudCli {
    program: String,
    leading_args: Vec<String>,
    timeout: Duration,
}

impl GcloudCli {
    pub fn new(program: &str, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            leading_args: Vec::new(),
            timeout,
        }
    }

    /// Arguments placed before every subcommand, e.g. `--verbosity=error`.
    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    pub fn describe(&self, args: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.leading_args.iter().map(String::as_str))
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn run(&self, args: &[String]) -> Result<CommandOutput, RestoreError> {
        let command = self.describe(args);
        debug!(command = %command, timeout_secs = self.timeout.as_secs_f64(), "Executing gcloud command");

        let mut child = AsyncCommand::new(&self.program);
        child
            .args(&self.leading_args)
            .args(args)
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, child.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(RestoreError::process(
                    &command,
                    format!("could not be launched: {}", e),
                ))
            }
            Err(_) => {
                warn!(command = %command, "gcloud command timed out, killing it");
                return Err(RestoreError::process(
                    &command,
                    format!("timed out after {:?}", self.timeout),
                ));
            }
        };

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            return Err(RestoreError::process(
                &command,
                format!("{}: {}", output.status, result.stderr.trim()),
            ));
        }

        Ok(result)
    }
}

#[async_trait]
impl GcloudClientTrait for GcloudCli {
    async fn list_backups(
        &self,
        project_id: &str,
        instance_id: &str,
    ) -> Result<Vec<BackupRecord>, RestoreError> {
        let args = list_backups_args(project_id, instance_id);
        let output = self.run(&args).await?;

        serde_json::from_str(&output.stdout).map_err(|source| RestoreError::Decoding {
            command: self.describe(&args),
            source,
        })
    }

    async fn restore_backup(
        &self,
        restore_request: &RestoreRequest,
    ) -> Result<CommandOutput, RestoreError> {
        self.run(&restore_backup_args(restore_request)).await
    }
}
