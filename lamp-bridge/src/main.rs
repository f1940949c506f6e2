//! lampsync-bridge binary entry point.
//!
//! Usage:
//! ```bash
//! lampsync-bridge --config bridge.toml
//! lampsync-bridge --config bridge.toml --check
//! lampsync-bridge --skip-boot-sync
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use lampsync_bridge::config::Config;
use lampsync_bridge::http::health;
use lampsync_bridge::server::{self, RunOptions};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_CONFIG_PATH: &str = "bridge.toml";

/// oneM2M to GPIO bridge.
#[derive(Parser, Debug)]
#[command(name = "lampsync-bridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: bridge.toml if present, else built-in defaults)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Start serving immediately without fetching initial states
    #[arg(long)]
    skip_boot_sync: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, source) = load_config(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    match &source {
        Some(path) => tracing::info!("Loaded configuration from {}", path.display()),
        None => tracing::warn!(
            "No {} found, using built-in actuator table",
            DEFAULT_CONFIG_PATH
        ),
    }

    if cli.check {
        print_summary(&config);
        return Ok(());
    }

    health::init_start_time();
    tracing::info!("lampsync-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    server::run(
        config,
        RunOptions {
            skip_boot_sync: cli.skip_boot_sync,
        },
    )
    .await
    .context("bridge failed")
}

/// Explicit path must exist; the default path is optional.
fn load_config(path: Option<&std::path::Path>) -> Result<(Config, Option<PathBuf>)> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !default.exists() {
                return Ok((Config::default(), None));
            }
            default
        }
    };

    let config = Config::from_file(&path)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok((config, Some(path)))
}

fn print_summary(config: &Config) {
    println!("Configuration OK");
    println!(
        "  listen:   http://{}{}",
        config.server.bind_address, config.server.notify_path
    );
    println!(
        "  platform: origin {:?}, pace {:?}, timeout {:?}, identity {:?}",
        config.platform.origin,
        config.platform.pace(),
        config.platform.request_timeout(),
        config.platform.identity_policy
    );
    println!("  actuators:");
    for a in &config.actuators {
        println!("    {}  GPIO{:<3} {}", a.id, a.pin, a.url);
    }
}
