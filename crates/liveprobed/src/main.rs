//! liveprobed: the liveprobe daemon.
//!
//! Loads a probe file, checks every listed systemd unit on its own
//! schedule, restarts units that fail their liveness probe, and serves the
//! resulting health on an HTTP endpoint.
//!
//! # Usage
//!
//! ```text
//! liveprobed --config /etc/liveprobe/liveprobe.toml start --listen 0.0.0.0:2112
//! liveprobed --config /etc/liveprobe/liveprobe.toml validate
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use liveprobe_core::{ProbeFile, ProbeSpec};
use liveprobe_health::ProberManager;
use liveprobe_metrics::HealthGauges;
use liveprobe_probe::{Dispatcher, DispatcherConfig};
use liveprobe_units::SystemctlController;
use liveprobed::{ApiState, build_router};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "liveprobed", about = "Liveness probing for systemd services")]
struct Cli {
    /// Probe file to load.
    #[arg(long, global = true, default_value = "./liveprobe.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe every configured service until interrupted.
    Start {
        /// Address for the metrics and health endpoints.
        #[arg(long, default_value = "0.0.0.0:2112")]
        listen: SocketAddr,

        /// Do not follow HTTP redirects that leave the probed host.
        #[arg(long)]
        no_follow_non_local_redirects: bool,

        /// `systemctl` executable used to look up and restart units.
        #[arg(long, default_value = "systemctl")]
        systemctl: PathBuf,
    },
    /// Load and validate the probe file, then print the resulting probes.
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,liveprobed=debug,liveprobe=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Start {
            listen,
            no_follow_non_local_redirects,
            systemctl,
        } => run(&cli.config, listen, !no_follow_non_local_redirects, systemctl).await,
        Command::Validate => validate(&cli.config),
    }
}

fn load(config: &Path) -> anyhow::Result<Vec<ProbeSpec>> {
    ProbeFile::load(config).with_context(|| format!("loading probe file {}", config.display()))
}

fn validate(config: &Path) -> anyhow::Result<()> {
    let specs = load(config)?;
    for spec in &specs {
        println!(
            "{}: {} probe, initial delay {:?}, every {:?}, timeout {:?}, failure threshold {}, success threshold {}, auto-restart {}",
            spec.service_name,
            spec.action.kind(),
            spec.initial_delay,
            spec.period,
            spec.timeout,
            spec.failure_threshold,
            spec.success_threshold,
            spec.auto_restart,
        );
    }
    println!("{} probe(s) valid", specs.len());
    Ok(())
}

async fn run(
    config: &Path,
    listen: SocketAddr,
    follow_non_local_redirects: bool,
    systemctl: PathBuf,
) -> anyhow::Result<()> {
    info!(config = %config.display(), "liveprobe daemon starting");

    let specs = load(config)?;
    info!(probes = specs.len(), "probe file loaded");

    // ── Initialize subsystems ──────────────────────────────────

    let dispatcher = Dispatcher::new(DispatcherConfig {
        follow_non_local_redirects,
    })
    .context("building probe dispatcher")?;
    let units = SystemctlController::new(systemctl);
    let gauges = Arc::new(HealthGauges::new());
    let manager = Arc::new(ProberManager::new(
        Arc::new(dispatcher),
        Arc::new(units),
        gauges.clone(),
    ));

    for spec in specs {
        let service = spec.service_name.clone();
        if let Err(e) = manager.register(spec).await {
            manager.shutdown().await;
            return Err(e).with_context(|| format!("registering {service}"));
        }
    }

    // ── Start API server ───────────────────────────────────────

    let router = build_router(ApiState {
        manager: manager.clone(),
        gauges,
    });
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    info!(addr = %listen, "metrics endpoint listening");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(error = %e, "failed to listen for ctrl-c, shutting down"),
            }
        })
        .await;

    manager.shutdown().await;
    served.context("serving HTTP API")?;

    info!("liveprobe daemon stopped");
    Ok(())
}
