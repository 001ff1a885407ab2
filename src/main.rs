//! conductor - docker compose 重启服务
//!
//! Usage:
//! - Normal mode: `conductor /etc/conductor/config.toml`
//! - With custom port: `conductor --port 9000`
//! - Validate config only: `conductor --check /etc/conductor/config.toml`

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use conductor::config::constants::DEFAULT_CONFIG_PATH;
use conductor::Config;

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "conductor", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(env = "CONDUCTOR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the listening port
    #[arg(long, env = "CONDUCTOR_PORT")]
    port: Option<u16>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conductor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    if cli.check {
        print_summary(&cli, &config);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(conductor::shutdown_signal(shutdown.clone()));

    conductor::run(config, shutdown).await
}

fn print_summary(cli: &Cli, config: &Config) {
    println!("Configuration OK: {}", cli.config.display());
    println!("  listen:        {}:{}", config.bind, config.port);
    println!("  docker:        {}", config.docker);
    println!("  timeout:       {}s", config.command_timeout);
    match config.force_update_interval {
        Some(secs) => println!("  force update:  every {}s", secs),
        None => println!("  force update:  disabled"),
    }
    match config.prune_interval {
        Some(secs) => println!("  prune:         every {}s", secs),
        None => println!("  prune:         disabled"),
    }
    for name in config.composition_names() {
        if let Some(composition) = config.composition(name) {
            println!("  [{}] {}", name, composition.work.display());
        }
    }
}
