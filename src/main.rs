use anyhow::{anyhow, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cloudsql_restore::app::Restorer;
use cloudsql_restore::config::Config;
use cloudsql_restore::errors::RestoreError;
use cloudsql_restore::gcp::{GcloudCli, DEFAULT_GCLOUD};
use cloudsql_restore::types::RestoreOutcome;

fn cli() -> Command {
    Command::new("cloudsql-restore")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Restore the latest verified Cloud SQL backup onto another instance")
        .after_help(
            "Reads project_id, backup_instance and restore_instance from the environment.\n\
             Exit codes: 1 gcloud failed, 2 no restorable backup, 3 missing configuration.",
        )
        .arg(
            Arg::new("gcloud")
                .long("gcloud")
                .env("GCLOUD_PATH")
                .default_value(DEFAULT_GCLOUD)
                .help("Path to the gcloud binary"),
        )
        .arg(
            Arg::new("gcloud-arg")
                .long("gcloud-arg")
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .help("Extra argument passed to gcloud before the subcommand (repeatable)"),
        )
        .arg(
            Arg::new("timeout-secs")
                .long("timeout-secs")
                .env("GCLOUD_TIMEOUT_SECS")
                .default_value("600")
                .value_parser(value_parser!(u64).range(1..))
                .help("Give up on a gcloud call after this many seconds"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Select and verify the backup but do not submit the restore")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Emit logs as JSON lines")
                .action(ArgAction::SetTrue),
        )
}

fn init_logging(json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}

fn build_gcloud(matches: &ArgMatches) -> GcloudCli {
    let program = matches
        .get_one::<String>("gcloud")
        .map(String::as_str)
        .unwrap_or(DEFAULT_GCLOUD);
    let timeout = matches
        .get_one::<u64>("timeout-secs")
        .copied()
        .map(Duration::from_secs)
        .unwrap_or(cloudsql_restore::gcp::DEFAULT_TIMEOUT);
    let leading_args = matches
        .get_many::<String>("gcloud-arg")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    GcloudCli::new(program, timeout).with_leading_args(leading_args)
}

async fn run(matches: &ArgMatches) -> Result<RestoreOutcome, RestoreError> {
    let config = Config::from_env()?;
    info!(
        project_id = %config.project_id,
        backup_instance = %config.backup_instance,
        restore_instance = %config.restore_instance,
        "Starting Cloud SQL restore"
    );

    let restorer = Restorer::new(
        Box::new(build_gcloud(matches)),
        config,
        matches.get_flag("dry-run"),
    );
    restorer.run().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("json-logs"))?;

    match run(&matches).await {
        Ok(outcome) => {
            info!(backup_id = %outcome.backup_id(), "Done");
            Ok(())
        }
        Err(err) => {
            let code = err.exit_code();
            error!(exit_code = code, "{}", err);
            std::process::exit(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn test_repeated_gcloud_args() {
        let matches = cli()
            .try_get_matches_from([
                "cloudsql-restore",
                "--gcloud",
                "/usr/local/bin/gcloud",
                "--gcloud-arg",
                "--verbosity=error",
                "--gcloud-arg",
                "--account=ops@example.com",
                "--timeout-secs",
                "30",
            ])
            .unwrap();
        let gcloud = build_gcloud(&matches);
        assert_eq!(
            gcloud.describe(&[]),
            "/usr/local/bin/gcloud --verbosity=error --account=ops@example.com"
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(cli()
            .try_get_matches_from(["cloudsql-restore", "--timeout-secs", "0"])
            .is_err());
    }
}
