use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One entry of `gcloud sql backups list --format=json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackupRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    pub status: String,
    #[serde(rename = "type", default)]
    pub backup_type: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
}

impl BackupRecord {
    pub fn new(id: &str, end_time: &str, status: &str) -> Self {
        Self {
            id: id.to_string(),
            end_time: end_time.to_string(),
            status: status.to_string(),
            backup_type: None,
            instance: None,
        }
    }
}

// gcloud prints backup run ids as strings, the Admin API as int64.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected backup id as string or number, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreRequest {
    pub backup_id: String,
    pub project_id: String,
    pub backup_instance: String,
    pub restore_instance: String,
}

/// Captured result of a finished CLI invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    /// The provider accepted the asynchronous restore request.
    Submitted {
        backup_id: String,
        output: CommandOutput,
    },
    /// Dry-run: verification passed, nothing was sent.
    DryRun { backup_id: String, command: String },
}

impl RestoreOutcome {
    pub fn backup_id(&self) -> &str {
        match self {
            RestoreOutcome::Submitted { backup_id, .. } | RestoreOutcome::DryRun { backup_id, .. } => {
                backup_id
            }
        }
    }
}
