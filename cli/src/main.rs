//! Box office service CLI
//!
//! ```sh
//! # Default config (~/.config/boxoffice/config.toml)
//! boxoffice-service
//!
//! # Custom config path
//! boxoffice-service --config /etc/boxoffice/config.toml
//!
//! # Override the port
//! boxoffice-service --api-port 9000
//!
//! # Validate config without starting
//! boxoffice-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use boxoffice::config::AppConfig;
use boxoffice::server::{init_tracing, ServerHandle, ServerOptions};

/// Seat reservation, checkout and waiting room service.
#[derive(Parser, Debug)]
#[command(
    name = "boxoffice-service",
    version,
    about = "Seat reservation and waiting room service",
    long_about = "REST API for holding seats, checking out and queueing \
                  shoppers for high-demand events.\n\n\
                  Default config: ~/.config/boxoffice/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "BOXOFFICE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(boxoffice::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(mut cfg) => {
            if let Some(ref level) = cli.log_level {
                cfg.logging.level = level.clone();
            }
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            if cli.check {
                eprintln!("Configuration is invalid: {}", e);
                std::process::exit(1);
            }
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
            AppConfig::default()
        }
    };

    // ── CLI overrides ──────────────────────────────────────────
    if let Some(port) = cli.api_port {
        info!("CLI override: api_port = {}", port);
        config.server.api_port = port;
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file  : {}", config_path.display());
        println!("   API address  : {}:{}", config.server.api_host, config.server.api_port);
        println!("   Storage      : {}", config.database.connection_url());
        println!("   Hold window  : {} min", config.reservations.hold_minutes);
        println!(
            "   Waiting room : {} active per event, {} min sessions",
            config.waiting_room.max_active_per_event, config.waiting_room.session_minutes
        );
        println!("   Log level    : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions { config }).await?;
    handle.install_signal_handler();

    info!("Press Ctrl+C to shut down gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
