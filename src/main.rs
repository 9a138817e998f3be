//! Demo server for request-apm.
//!
//! Loads an optional TOML config, installs logging (and metrics when
//! enabled), and serves a few sample routes behind `ApmLayer` using the
//! tracing-backed telemetry backend.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use request_apm::backend::TracingBackend;
use request_apm::config::loader::{apply_env_overrides, load_config};
use request_apm::config::AppConfig;
use request_apm::observability::{logging, metrics};
use request_apm::server;

#[derive(Parser, Debug)]
#[command(name = "request-apm", version, about = "APM-instrumented demo server")]
struct Args {
    /// Path to a TOML config file.
    #[arg(short, long, env = "REQUEST_APM_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut config = AppConfig::default();
            apply_env_overrides(&mut config.apm, |key| std::env::var(key).ok());
            config
        }
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    logging::init_logging(config.observability.log_format, &config.observability.log_filter);
    tracing::info!(
        bind_address = %config.server.bind_address,
        apm = ?config.apm,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = match TcpListener::bind(&config.server.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, bind_address = %config.server.bind_address, "Bind failed");
            return ExitCode::FAILURE;
        }
    };

    let router = server::build_router(&config, &TracingBackend);
    if let Err(e) = server::serve(listener, router, server::shutdown_signal()).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
