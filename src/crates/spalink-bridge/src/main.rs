//! SpaLink bridge entry point.
//!
//! Wires the protocol engine to an RS-485-over-TCP gateway and prints the
//! decoded event stream to stdout, one `<topic> <value>` line per event.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ BridgeConfig::load()    -- TOML file, all keys optional
//!  └─ gateway::run()          -- reconnect loop
//!       ├─ TCP bytes  -> SpaEngine::feed
//!       ├─ SpaEngine replies -> TCP (writer task channel)
//!       ├─ interval   -> SpaEngine::on_tick
//!       └─ events     -> stdout
//! ```

mod config;
mod decode;
mod gateway;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::BridgeConfig;

/// Bridge between a Balboa spa bus gateway and a topic/value event stream.
#[derive(Parser, Debug)]
#[command(name = "spalink", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Connect to the gateway and stream decoded events.
    Run {
        /// Path to bridge.toml (defaults apply when omitted).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Gateway host:port, overriding the config file.
        #[arg(long)]
        gateway: Option<String>,
    },
    /// Pretty-print a hex capture of bus traffic.
    Decode {
        /// Capture file of whitespace-separated hex bytes; stdin if omitted.
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Run { config, gateway } => {
            let mut cfg =
                BridgeConfig::load(config.as_deref()).context("loading bridge config")?;
            if let Some(addr) = gateway {
                cfg.gateway.addr = addr;
            }
            info!(version = spalink_core::VERSION, addr = %cfg.gateway.addr, "spalink bridge starting");

            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("shutdown signal received");
                    let _ = shutdown_tx.send(true);
                }
            });

            gateway::run(
                cfg.gateway.addr.clone(),
                Duration::from_secs(cfg.gateway.reconnect_secs),
                Duration::from_secs(cfg.node.tick_secs),
                shutdown_rx,
            )
            .await
        }
        Cmd::Decode { file } => decode::run(file.as_deref()),
    }
}
