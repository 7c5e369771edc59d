//! # stoa-runner
//!
//! Host entry point: assembles the process logger from the JSON config and
//! drives the seed timestamp generator.
//!
//! # Usage
//!
//! ```bash
//! stoa-runner run config.json --env development
//! stoa-runner seed config.json --blocks 5 --txs 1
//! ```

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::DateTime;
use clap::{Parser, Subcommand};
use stoa_log::logging::{handle_panics, init_logging};
use stoa_log::transport::TransportConfig;
use stoa_log::{Environment, Logger};
use tracing::{info, warn};

use crate::config::{AppConfig, load_config};

/// Stoa logging and seed-data runner.
#[derive(Parser)]
#[command(name = "stoa-runner", about = "Stoa logging and seed-data runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble the logger and run until Ctrl+C.
    Run {
        /// Configuration file path (JSON).
        config: PathBuf,

        /// Environment discriminator (test, development, production).
        /// Overrides STOA_ENV and the config file.
        #[arg(long)]
        env: Option<String>,
    },
    /// Print backdated timestamps for a run of seeded blocks.
    Seed {
        /// Configuration file path (JSON).
        config: PathBuf,

        /// Number of blocks to date.
        #[arg(short, long, default_value_t = 10)]
        blocks: usize,

        /// Transactions per block (0 dates empty blocks).
        #[arg(long, default_value_t = 1)]
        txs: u64,
    },
}

/// Upper bound on draining transports at exit. Database retries do not
/// end on their own.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Run { config, env } => run(&config, env.as_deref()).await,
        Command::Seed { config, blocks, txs } => seed(&config, blocks, txs),
    }
}

fn environment_for(config: &AppConfig, env: Option<&str>) -> Environment {
    match env {
        Some(value) => config.logging.resolve_environment(Some(value)),
        None => config.logging.environment(),
    }
}

/// Build the logger for `environment` with every configured transport.
///
/// Transports that fail to build are reported through the logger itself
/// and skipped. The database transport is attached only if the connection
/// succeeds and `connect_db` is set.
async fn assemble(config: &AppConfig, environment: Environment, connect_db: bool) -> Logger {
    let mut logger = Logger::create(environment);

    for transport in config.logging.transports(environment) {
        match &transport {
            TransportConfig::Database { uri } => {
                if connect_db && !logger.build_db_connection(uri).await {
                    logger.warn("continuing without database logging");
                }
            }
            _ => match transport.build() {
                Ok(Some(built)) => {
                    logger.add_boxed(built);
                }
                Ok(None) => {}
                Err(e) => logger.error(format!("unable to create {} transport: {e}", transport.kind())),
            },
        }
    }

    logger
}

async fn run(config_path: &Path, env: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let environment = environment_for(&config, env);

    let logger = Arc::new(assemble(&config, environment, true).await);
    init_logging(Arc::clone(&logger))?;
    handle_panics(Arc::clone(&logger));

    info!(
        "stoa-runner starting, config={}, environment={environment}, level={}, transports={:?}",
        config_path.display(),
        logger.level(),
        logger.transport_names(),
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, logger.shutdown()).await.is_err() {
        warn!("log transports not drained after {SHUTDOWN_TIMEOUT:?}, pending records dropped");
    }
    Ok(())
}

fn seed(config_path: &Path, blocks: usize, txs: u64) -> Result<()> {
    let config = load_config(config_path)?;
    let mut state = config.seed_data;

    if !state.seed {
        println!("seeding disabled (seed_data.seed = false); all dates are 0");
    }

    for (block, date) in seed_dates(&mut state, blocks, txs).into_iter().enumerate() {
        let iso = DateTime::from_timestamp(date, 0).map(|d| d.to_rfc3339()).unwrap_or_default();
        println!("block {block}: {date} ({iso})");
    }
    Ok(())
}

fn seed_dates(state: &mut stoa_seed::SeedState, blocks: usize, txs: u64) -> Vec<i64> {
    state.backdate(std::iter::repeat_n(txs, blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stoa_seed::SeedState;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["stoa-runner", "seed", "c.json", "--blocks", "3", "--txs", "0"]).unwrap();
        match cli.command {
            Command::Seed { blocks, txs, .. } => {
                assert_eq!(blocks, 3);
                assert_eq!(txs, 0);
            }
            _ => panic!("expected seed"),
        }

        let cli = Cli::try_parse_from(["stoa-runner", "run", "c.json", "--env", "test"]).unwrap();
        assert!(matches!(cli.command, Command::Run { env: Some(ref e), .. } if e == "test"));
    }

    #[test]
    fn explicit_env_overrides_config() {
        let config: AppConfig = serde_json::from_str(r#"{"logging": {"environment": "development"}}"#).unwrap();
        assert_eq!(environment_for(&config, Some("test")), Environment::Test);
    }

    #[test]
    fn seed_dates_anchor_then_step_back() {
        let mut state = SeedState { seed: true, iterator: 2, genesis_timestamp: 1_700_000_000 };
        assert_eq!(seed_dates(&mut state, 3, 1), vec![1_700_000_000, 1_699_913_600, 1_699_827_200]);
    }

    #[tokio::test]
    async fn assemble_adds_file_and_skips_database() {
        let dir = tempfile::tempdir().unwrap();
        let json = format!(
            r#"{{"logging": {{"folder": {:?}, "console": false, "database_url": "mongodb://unused"}}}}"#,
            dir.path()
        );
        let config: AppConfig = serde_json::from_str(&json).unwrap();

        let logger = assemble(&config, Environment::Development, false).await;
        assert_eq!(logger.level(), stoa_log::Level::Debug);
        assert_eq!(logger.transport_names(), vec!["file"]);
    }
}
