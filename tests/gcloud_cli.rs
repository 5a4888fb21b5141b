#![cfg(unix)]

use cloudsql_restore::errors::RestoreError;
use cloudsql_restore::gcp::{GcloudCli, GcloudClientTrait};
use cloudsql_restore::types::RestoreRequest;
use std::time::Duration;

// Stands in for gcloud: `sh -c <script> gcloud <args...>`.
fn fake_gcloud(script: &str, timeout: Duration) -> GcloudCli {
    GcloudCli::new("/bin/sh", timeout).with_leading_args(vec![
        "-c".to_string(),
        script.to_string(),
        "gcloud".to_string(),
    ])
}

const LISTING: &str = r#"[{"id":"1","endTime":"2024-01-01T00:00:00.000000+00:00","status":"SUCCESSFUL"},{"id":"2","endTime":"2024-02-01T00:00:00.000000+00:00","status":"SUCCESSFUL","type":"ON_DEMAND"}]"#;

#[tokio::test]
async fn test_list_backups_decodes_json() {
    let script = format!(
        r#"[ "$*" = "sql backups list -i prod-db --project my-project --format=json" ] || exit 9
printf '%s' '{}'"#,
        LISTING
    );
    let gcloud = fake_gcloud(&script, Duration::from_secs(10));

    let backups = gcloud.list_backups("my-project", "prod-db").await.unwrap();
    assert_eq!(backups.len(), 2);
    assert_eq!(backups[1].id, "2");
    assert_eq!(backups[1].backup_type.as_deref(), Some("ON_DEMAND"));
}

#[tokio::test]
async fn test_list_backups_invalid_json() {
    let gcloud = fake_gcloud("echo 'Listed 0 items.'", Duration::from_secs(10));

    let err = gcloud.list_backups("my-project", "prod-db").await.unwrap_err();
    assert!(matches!(err, RestoreError::Decoding { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_non_zero_exit_carries_stderr() {
    let gcloud = fake_gcloud(
        "echo 'ERROR: (gcloud.sql.backups.list) HTTPError 403' >&2; exit 1",
        Duration::from_secs(10),
    );

    match gcloud.list_backups("my-project", "prod-db").await {
        Err(RestoreError::ProcessExecution { command, reason }) => {
            assert!(command.contains("sql backups list -i prod-db"));
            assert!(reason.contains("HTTPError 403"));
        }
        other => panic!("expected process failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_binary() {
    let gcloud = GcloudCli::new("/nonexistent/gcloud", Duration::from_secs(10));

    match gcloud.list_backups("my-project", "prod-db").await {
        Err(RestoreError::ProcessExecution { reason, .. }) => {
            assert!(reason.contains("could not be launched"))
        }
        other => panic!("expected launch failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_hung_command_times_out() {
    let gcloud = fake_gcloud("exec sleep 30", Duration::from_millis(200));

    let started = std::time::Instant::now();
    match gcloud.list_backups("my-project", "prod-db").await {
        Err(RestoreError::ProcessExecution { reason, .. }) => assert!(reason.contains("timed out")),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_restore_passes_async_flags() {
    let script = r#"[ "$*" = "sql backups restore 42 --restore-instance=dr-db --project my-project --backup-instance=prod-db --async --quiet" ] || exit 9
echo 'Restore request issued for [dr-db].' >&2"#;
    let gcloud = fake_gcloud(script, Duration::from_secs(10));

    let request = RestoreRequest {
        backup_id: "42".to_string(),
        project_id: "my-project".to_string(),
        backup_instance: "prod-db".to_string(),
        restore_instance: "dr-db".to_string(),
    };
    let output = gcloud.restore_backup(&request).await.unwrap();

    assert_eq!(output.status, Some(0));
    assert_eq!(output.stderr.trim(), "Restore request issued for [dr-db].");
}
