use chrono::{DateTime, FixedOffset, Utc};
use tracing::debug;

use crate::config::Config;
use crate::errors::RestoreError;
use crate::types::BackupRecord;

/// Timestamp layout printed by gcloud, e.g. `2019-12-13T02:48:49.121000+00:00`.
pub const END_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%6f%:z";

pub const SUCCESSFUL_STATUS: &str = "successful";

// Byte offset of the `.` after the seconds field.
const FRACTION_DOT: usize = 19;
const FRACTION_DIGITS: usize = 6;

/// Parse a backup's `endTime` in [`END_TIME_FORMAT`]. A fraction of one to
/// six digits is accepted, as is a trailing `Z` in place of `+00:00`.
pub fn parse_end_time(backup: &BackupRecord) -> Result<DateTime<FixedOffset>, RestoreError> {
    let invalid = |reason: String| RestoreError::TimestampFormat {
        backup_id: backup.id.clone(),
        value: backup.end_time.clone(),
        reason,
    };

    let raw = backup.end_time.as_str();
    if raw.chars().any(char::is_whitespace) {
        return Err(invalid("whitespace is not allowed".to_string()));
    }

    let normalised = normalise_end_time(raw);
    DateTime::parse_from_str(&normalised, END_TIME_FORMAT).map_err(|e| invalid(e.to_string()))
}

/// Pads a short fraction to microseconds and turns a `Z` suffix into `+00:00`.
/// Anything else is left for the strict parse to reject.
fn normalise_end_time(raw: &str) -> String {
    let mut value = match raw.strip_suffix('Z') {
        Some(base) => format!("{}+00:00", base),
        None => raw.to_string(),
    };

    if value.get(FRACTION_DOT..FRACTION_DOT + 1) == Some(".") {
        let start = FRACTION_DOT + 1;
        let digits = value[start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if (1..FRACTION_DIGITS).contains(&digits) {
            value.insert_str(start + digits, &"0".repeat(FRACTION_DIGITS - digits));
        }
    }
    value
}

/// Pick the backup that finished last. Ties resolve to any maximal element.
pub fn select_latest(backups: Vec<BackupRecord>) -> Result<BackupRecord, RestoreError> {
    let dated = backups
        .into_iter()
        .map(|backup| parse_end_time(&backup).map(|end| (end, backup)))
        .collect::<Result<Vec<_>, _>>()?;

    dated
        .into_iter()
        .max_by_key(|(end, _)| *end)
        .map(|(_, backup)| backup)
        .ok_or(RestoreError::EmptyBackupList)
}

/// A backup is restorable once it reports success and finished strictly
/// before the run started.
pub fn verify_backup(backup: &BackupRecord, config: &Config) -> Result<(), RestoreError> {
    let end_time = parse_end_time(backup)?;
    let successful = backup.status.to_lowercase() == SUCCESSFUL_STATUS;
    let finished = end_time.with_timezone(&Utc) < config.current_time;

    debug!(
        backup_id = %backup.id,
        status = %backup.status,
        end_time = %end_time,
        current_time = %config.current_time,
        successful,
        finished,
        "Verifying backup"
    );

    if successful && finished {
        Ok(())
    } else {
        Err(RestoreError::BackupNotVerified {
            backup_id: backup.id.clone(),
            status: backup.status.clone(),
            end_time,
            current_time: config.current_time,
        })
    }
}
