use std::{
    io::Write,
    num::NonZeroUsize,
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use price_sync::{
    catalog::overrides::{OverrideTable, load_overrides_path},
    config::{
        ConfigError, DEFAULT_API_BASE, DEFAULT_API_KEY_HEADER, DEFAULT_BATCH_SIZE,
        DEFAULT_PACING, DEFAULT_REQUEST_TIMEOUT, ProviderConfig, RunConfig,
    },
    db::connection::connect,
    error::SyncError,
    providers::build_provider,
    sync::{SyncOptions, sync_prices},
};
use shared_utils::env::get_env_var;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Sync CoinGecko USD prices into airdrop metadata")]
struct Cli {
    /// Compute and report everything, write nothing
    #[arg(long)]
    dry_run: bool,

    /// Process at most N records (lowest ids first); 0 means no limit
    #[arg(long, value_name = "N")]
    limit: Option<u32>,

    /// TOML file with an [overrides] table layered over the curated list
    #[arg(long, value_name = "FILE")]
    overrides: Option<PathBuf>,

    /// Start from an empty override table instead of the curated one
    #[arg(long)]
    no_curated_overrides: bool,

    /// Identifiers per price request
    #[arg(long, default_value_t = NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN))]
    batch_size: NonZeroUsize,

    /// Pause between price requests, in milliseconds
    #[arg(long, default_value_t = DEFAULT_PACING.as_millis() as u64)]
    pacing_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Header the API key is sent in (use x-cg-pro-api-key for the pro tier)
    #[arg(long, default_value = DEFAULT_API_KEY_HEADER)]
    api_key_header: String,

    /// Database URL; postgres:// or postgresql:// for PostgreSQL, else a SQLite path
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// API root
    #[arg(long, env = "COINGECKO_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// API key
    #[arg(long, env = "COINGECKO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

struct Settings {
    database_url: String,
    provider: ProviderConfig,
    overrides: OverrideTable,
    options: SyncOptions,
}

impl Cli {
    /// Resolve flags and environment into settings. Nothing is opened yet.
    fn settings(self) -> Result<Settings, ConfigError> {
        let database_url = match self.database_url.filter(|u| !u.trim().is_empty()) {
            Some(url) => url.trim().to_string(),
            None => get_env_var("DATABASE_URL")?,
        };
        let api_key = self.api_key.filter(|k| !k.trim().is_empty());

        let base = if self.no_curated_overrides {
            OverrideTable::empty()
        } else {
            OverrideTable::curated()
        };
        let overrides = match &self.overrides {
            Some(path) => base.merged_with(load_overrides_path(path)?),
            None => base,
        };

        Ok(Settings {
            database_url,
            provider: ProviderConfig::new(&self.api_base, api_key, &self.api_key_header),
            overrides,
            options: SyncOptions {
                dry_run: self.dry_run,
                limit: self.limit.filter(|n| *n > 0),
                run: RunConfig {
                    batch_size: self.batch_size,
                    pacing: Duration::from_millis(self.pacing_ms),
                    request_timeout: Duration::from_secs(self.timeout_secs),
                },
            },
        })
    }
}

async fn run(cli: Cli) -> Result<(), SyncError> {
    let settings = cli.settings()?;
    info!(
        api_base = %settings.provider.base_url,
        overrides = settings.overrides.len(),
        dry_run = settings.options.dry_run,
        "starting price sync"
    );

    let provider = build_provider(&settings.provider, &settings.options.run)?;
    let mut store = connect(&settings.database_url)?;
    let report = sync_prices(
        store.as_mut(),
        provider.as_ref(),
        &settings.overrides,
        &settings.options,
    )
    .await?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "{report}").context("failed to write report to stdout")?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // usage errors are configuration faults; --help and --version are not
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
