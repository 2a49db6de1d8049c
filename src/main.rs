//! Presence Agent CLI
//!
//! Serves the presence feed over HTTP, or samples a single detector once.

use clap::{Parser, Subcommand, ValueEnum};
use presence_agent::{
    config::Config, platform::Platform, server, MobileAppIngester, MusicDetector, WindowTracker,
    VERSION,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "presence-agent")]
#[command(version = VERSION)]
#[command(about = "Best-effort desk presence feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve snapshots, streams, and ingestion endpoints over HTTP
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Sample one detector once and print the snapshot as JSON
    Sample {
        /// Which detector to sample
        #[arg(long, value_enum, default_value = "window")]
        source: Source,
    },

    /// Show configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Window,
    Music,
    Mobile,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(host, port).await,
        Commands::Sample { source } => cmd_sample(source),
        Commands::Config => cmd_config(),
    }
}

async fn cmd_serve(host: Option<String>, port: Option<u16>) {
    let mut config = Config::load().unwrap_or_default();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let (addr, shutdown_tx) = match server::run(config).await {
        Ok(running) => running,
        Err(e) => {
            eprintln!("Error starting server: {e}");
            std::process::exit(1);
        }
    };

    println!("Presence Agent v{VERSION}");
    println!("Listening on http://{addr}");
    println!("Press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error waiting for Ctrl+C: {e}");
    }

    println!();
    println!("Shutting down...");
    let _ = shutdown_tx.send(());
}

fn cmd_sample(source: Source) {
    let system = Arc::new(Platform::default());

    let json = match source {
        Source::Window => {
            let tracker = WindowTracker::new(system);
            serde_json::to_string_pretty(&tracker.sample())
        }
        Source::Music => {
            let detector = MusicDetector::new(system);
            serde_json::to_string_pretty(&detector.sample())
        }
        Source::Mobile => {
            let ingester = MobileAppIngester::new();
            serde_json::to_string_pretty(&ingester.snapshot())
        }
    };

    match json {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing snapshot: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
