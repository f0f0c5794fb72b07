//! Event router demo binary.
//!
//! Hosts the sample users/messages API either behind a local HTTP gateway or
//! for a single event read from a JSON file.
//!
//! ```text
//! event-router [--config router.toml] serve
//! event-router [--config router.toml] invoke event.json
//! ```

mod demo;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use event_router::config::{load_config, RouterConfig};
use event_router::http::{Event, LocalGateway};
use event_router::observability::{logging, metrics};
use event_router::pipeline::Router;

use crate::demo::DemoStore;

#[derive(Parser)]
#[command(name = "event-router")]
#[command(about = "HTTP event router for function-as-a-service handlers", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the router over HTTP (default)
    Serve,
    /// Dispatch one event from a JSON file and print the response
    Invoke {
        /// Path to the event JSON
        event: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    logging::init_logging(&config.logging);

    tracing::info!(
        debug = config.router.debug,
        cors = config.router.cors,
        "event-router v0.1.0 starting"
    );

    let mut router = Router::from_config(&config);
    demo::install(&mut router, Arc::new(DemoStore::seeded()))?;
    let router = Arc::new(router);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if config.metrics.enabled {
                match config.metrics.address.parse() {
                    Ok(addr) => metrics::init_metrics(addr)?,
                    Err(_) => tracing::error!(
                        metrics_address = %config.metrics.address,
                        "Failed to parse metrics address"
                    ),
                }
            }

            let listener = TcpListener::bind(&config.server.bind_address).await?;
            LocalGateway::new(router, &config.server).run(listener).await?;
            tracing::info!("Shutdown complete");
        }
        Commands::Invoke { event } => {
            let raw = std::fs::read_to_string(&event)?;
            let event: Event = serde_json::from_str(&raw)?;
            let response = router.respond(event).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
