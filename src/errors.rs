use chrono::{DateTime, FixedOffset, Utc};
use thiserror::Error;

/// Exit status when a required environment variable is missing.
pub const EXIT_CONFIGURATION: i32 = 3;
/// Exit status when the gcloud CLI could not be run or its output was unusable.
pub const EXIT_PROCESS: i32 = 1;
/// Exit status when no backup is safe to restore.
pub const EXIT_VERIFICATION: i32 = 2;

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Missing environment variable(s): {}", .missing.join(", "))]
    Configuration { missing: Vec<String> },

    #[error("Command `{command}` failed: {reason}")]
    ProcessExecution { command: String, reason: String },

    #[error("Could not decode output of `{command}`: {source}")]
    Decoding {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No backups available to restore")]
    EmptyBackupList,

    #[error("Backup {backup_id} has an unrecognised endTime {value:?}: {reason}")]
    TimestampFormat {
        backup_id: String,
        value: String,
        reason: String,
    },

    #[error(
        "Backup {backup_id} is not restorable: status {status:?}, endTime {end_time}, run started {current_time}"
    )]
    BackupNotVerified {
        backup_id: String,
        status: String,
        end_time: DateTime<FixedOffset>,
        current_time: DateTime<Utc>,
    },
}

impl RestoreError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RestoreError::Configuration { .. } => EXIT_CONFIGURATION,
            RestoreError::ProcessExecution { .. } | RestoreError::Decoding { .. } => EXIT_PROCESS,
            RestoreError::EmptyBackupList
            | RestoreError::TimestampFormat { .. }
            | RestoreError::BackupNotVerified { .. } => EXIT_VERIFICATION,
        }
    }

    pub fn process(command: &str, reason: impl Into<String>) -> Self {
        RestoreError::ProcessExecution {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}
