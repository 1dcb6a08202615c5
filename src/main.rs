//! cpuwatch: rolling per-process CPU time averages over HTTP.
//!
//! Run with:  `RUST_LOG=info cpuwatch`, then open `/stats` in a browser.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cpuwatch_config::{default_path, load as load_config, CpuWatchConfig, StoreMode};
use cpuwatch_core::{ProcessRegistry, SnapshotProvider};
use cpuwatch_server::{build_router, run_server};
use cpuwatch_system::{
    live_snapshot, spawn_sampler, FileSnapshotProvider, FileSnapshotStore, Sampler, SysinfoSource,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cpuwatch", version, about = "Serve rolling per-process CPU time averages")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/cpuwatch/cpuwatch.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// How snapshots reach the HTTP handlers
    #[arg(long, value_enum)]
    store: Option<StoreArg>,

    /// JSON snapshot location for `--store file`
    #[arg(long)]
    store_path: Option<PathBuf>,

    /// Directory holding stats.html and its scripts
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreArg {
    Memory,
    File,
}

impl Cli {
    /// Command-line flags win over the config file.
    fn apply(self, config: &mut CpuWatchConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = self.static_dir {
            config.server.static_dir = dir;
        }
        if let Some(store) = self.store {
            config.store.mode = match store {
                StoreArg::Memory => StoreMode::Memory,
                StoreArg::File   => StoreMode::File,
            };
        }
        if let Some(path) = self.store_path {
            config.store.path = path;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("cpuwatch v{} starting", env!("CARGO_PKG_VERSION"));

    let mut cli = Cli::parse();
    let config_path = cli.config.take().unwrap_or_else(default_path);
    let mut config = load_config(&config_path)?;
    cli.apply(&mut config);
    config.validate()?;

    let registry = ProcessRegistry::new(config.avg_interval()?, config.sampling.round_to);
    let sampler = Sampler::new(SysinfoSource::new(), registry, config.sampling.period()?);

    let (sampler, provider) = match config.store.mode {
        StoreMode::Memory => {
            let (publisher, reader) = live_snapshot();
            let provider: Arc<dyn SnapshotProvider> = Arc::new(reader);
            (sampler.with_sink(publisher), provider)
        }
        StoreMode::File => {
            let path = &config.store.path;
            info!("Publishing snapshots to '{}'", path.display());
            let provider: Arc<dyn SnapshotProvider> =
                Arc::new(FileSnapshotProvider::new(path, SysinfoSource::new()));
            (sampler.with_sink(FileSnapshotStore::new(path)), provider)
        }
    };

    let (host, port) = (config.server.host.as_str(), config.server.port);
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("cannot bind {host}:{port}"))?;
    info!("Open http://{host}:{port}/stats in a browser; Ctrl-C to stop");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sampler_task = spawn_sampler(sampler, shutdown_rx.clone());
    let app = build_router(provider, config.server.static_dir.clone());
    let mut server = tokio::spawn(run_server(listener, app, shutdown_rx));

    let finished = tokio::select! {
        res = &mut server => Some(res),
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!("Cannot listen for Ctrl-C: {e}");
            }
            None
        }
    };

    info!("Shutting down");
    shutdown_tx.send_replace(true);

    let served = match finished {
        Some(res) => res,
        None => server.await,
    };
    match served {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("HTTP server failed: {e}"),
        Err(e) => error!("HTTP server task failed: {e}"),
    }

    let sampler = sampler_task.await.context("sampler task failed")?;
    info!(ticks = sampler.ticks(), "Stopped");
    Ok(())
}
