//! # axisd
//!
//! Motion-axis control node. Loads the node configuration, builds the
//! control core from the driver registry and serves the binary command
//! protocol until SIGINT/SIGTERM.

use axisd_common::config::{ConfigError, LogLevel};
use axisd_common::consts::DEFAULT_CONFIG_PATH;
use axisd_control_unit::config::{NodeConfig, Transport, load_config};
use axisd_control_unit::cycle::ControlCore;
use axisd_control_unit::server::Server;
use axisd_hal::DriverRegistry;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Networked motion-axis controller.
#[derive(Parser, Debug)]
#[command(name = "axisd")]
#[command(version)]
#[command(about = "Command protocol server and axis dispatcher for up to ten motion axes")]
struct Args {
    /// Node configuration TOML. Without this flag a missing default file
    /// means built-in defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override `server.port`.
    #[arg(long)]
    port: Option<u16>,

    /// Override `server.transport`.
    #[arg(long, value_enum)]
    transport: Option<Transport>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let loaded = resolve_config(&args);

    let log_level = loaded
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("axisd v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = loaded
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(run);
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("axisd shutdown complete");
}

fn resolve_config(args: &Args) -> Result<NodeConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => match load_config(Path::new(DEFAULT_CONFIG_PATH)) {
            Err(ConfigError::FileNotFound) => NodeConfig::default(),
            other => other?,
        },
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(transport) = args.transport {
        config.server.transport = transport;
    }
    config.validate()?;
    Ok(config)
}

fn run(config: NodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        service = %config.shared.service_name,
        port = config.server.port,
        transport = ?config.server.transport,
        profile = ?config.motion.profile,
        "config OK"
    );

    let registry = DriverRegistry::with_builtin();
    let core = ControlCore::from_config(&config, &registry)?;
    let server = Server::bind(&config.server, core)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    info!(addr = %server.local_addr()?, "serving");
    let mut core = server.run(running)?;
    if core.stats().handshake_timeouts > 0 {
        warn!(
            timeouts = core.stats().handshake_timeouts,
            "companion missed handshakes during this run"
        );
    }
    core.shutdown();
    Ok(())
}

fn setup_tracing(args: &Args, configured: LogLevel) {
    let directive = if args.verbose {
        "debug"
    } else {
        configured.as_directive()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        directive
            .parse()
            .unwrap_or_else(|_| tracing::Level::INFO.into()),
    );

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
