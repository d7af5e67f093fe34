//! Toolhost stdio server - main entry point.
//!
//! Registers the builtin integrations, starts the background watchdog and
//! serves JSON-RPC on stdin/stdout until the client disconnects or the
//! process is interrupted.
//!
//! ```bash
//! toolhost --config ./toolhost.json
//! TOOLHOST_MONITOR_ENABLED=false toolhost
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use toolhost::monitor::{Monitor, MonitorTools};
use toolhost::tools::{ExampleTools, ToolRegistry};
use toolhost::transport::StdioServer;
use toolhost::{Config, Result};

/// Grace period for runtime tasks once serving has ended. The stdin reader
/// sits on a blocking-pool thread and only returns when a line arrives, so
/// shutdown must not wait for it.
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Serve tools over stdio.
#[derive(Debug, Parser)]
#[command(name = "toolhost", version, about)]
struct Cli {
    /// JSON configuration file. Defaults apply when omitted.
    #[arg(long, env = "TOOLHOST_CONFIG")]
    config: Option<PathBuf>,

    /// Do not start the watchdog automatically.
    #[arg(long)]
    no_watchdog: bool,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env()?;
    if cli.no_watchdog {
        config.monitor.autostart = false;
    }
    config.validate()?;
    Ok(config)
}

async fn run(config: Config) -> Result<()> {
    let monitor = Arc::new(Monitor::new(config.monitor.clone())?);

    let mut registry = ToolRegistry::new();
    registry.register_provider(Arc::new(ExampleTools))?;
    registry.register_provider(Arc::new(MonitorTools::new(Arc::clone(&monitor))))?;
    tracing::info!("registered {} tools", registry.len());

    if config.monitor.enabled && config.monitor.autostart {
        if let Err(e) = monitor.start() {
            tracing::warn!("watchdog autostart failed: {}", e);
        }
    }

    let server = StdioServer::new(registry, config.server, config.transport);
    let served = server.serve_stdio().await;

    monitor.shutdown().await;
    served?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("toolhost: {}", e);
            return ExitCode::FAILURE;
        }
    };

    toolhost::observability::init_tracing(&config.observability);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("failed to build async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = runtime.block_on(run(config));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}
