//! TCP round-robin load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                 TCP BALANCER                  │
//!                     │                                               │
//!   Client ──────────▶│  listener ──▶ dispatcher ──▶ worker pool ─────┼──▶ Backend
//!                     │                   │                           │
//!                     │                   ▼                           │
//!                     │           round robin + probe                 │
//!                     │                   │                           │
//!                     │                   ▼                           │
//!                     │               registry ◀── health sweep       │
//!                     │                   ▲                           │
//!   Operator ────────▶│  admin (/add /remove /list /cooldown /status) │
//!                     └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use tcp_balancer::admin::AdminControl;
use tcp_balancer::config::validation::validate_config;
use tcp_balancer::config::{load_config, BalancerConfig, ConfigError, ConfigWatcher, ReloadPlan};
use tcp_balancer::lifecycle::{wait_for_signal, Shutdown};
use tcp_balancer::net::{bind_tcp, Listener};
use tcp_balancer::observability::{logging, metrics};
use tcp_balancer::{BalancerError, BalancerServer};

#[derive(Parser, Debug)]
#[command(name = "tcp-balancer")]
#[command(about = "Round-robin TCP load balancer with active health checks", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the data-port bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Override the admin bind address.
    #[arg(long)]
    admin_bind: Option<String>,

    /// Override the log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tcp-balancer: {}", e);
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tcp-balancer starting");

    if let Err(e) = run(args, config).await {
        tracing::error!(error = %e, "Fatal startup error");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}

fn build_config(args: &Args) -> Result<BalancerConfig, BalancerError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::default(),
    };

    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(admin_bind) = &args.admin_bind {
        config.admin.bind_address = admin_bind.clone();
    }
    if let Some(level) = &args.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

async fn run(args: Args, config: BalancerConfig) -> Result<(), BalancerError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        admin_address = %config.admin.bind_address,
        workers = config.dispatcher.worker_pool_size,
        cooldown_secs = config.health_check.cooldown_secs,
        backends = config.backends.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;
    let admin = if config.admin.enabled {
        Some(bind_tcp(&config.admin.bind_address).await?)
    } else {
        None
    };

    let server = BalancerServer::new(config.clone());
    let shutdown = Arc::new(Shutdown::new());

    // Keep the watcher alive for the lifetime of the process.
    let _watcher = match &args.config {
        Some(path) => Some(spawn_reload(path.clone(), config, server.control())?),
        None => None,
    };

    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown.trigger();
            wait_for_signal().await;
            tracing::warn!("Second signal received, exiting without draining");
            std::process::exit(130);
        });
    }

    server.run(listener, admin, &shutdown).await;
    Ok(())
}

fn spawn_reload(
    path: PathBuf,
    mut current: BalancerConfig,
    control: Arc<AdminControl>,
) -> Result<notify::RecommendedWatcher, BalancerError> {
    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let handle = watcher.run()?;

    tokio::spawn(async move {
        while let Some(next) = updates.recv().await {
            let plan = ReloadPlan::diff(&current, &next);

            if let Some(seconds) = plan.cooldown_secs {
                match control.set_cooldown(seconds).await {
                    Ok(()) => tracing::info!(
                        cooldown = ?Duration::from_secs(seconds),
                        "Applied reloaded health check cooldown"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Ignoring reloaded cooldown"),
                }
            }
            if !plan.restart_required.is_empty() {
                tracing::warn!(
                    sections = ?plan.restart_required,
                    "Changed config sections take effect after restart"
                );
            }
            current = next;
        }
    });

    Ok(handle)
}
