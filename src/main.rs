use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fileserver::config::{CONFIG_ENV, Config, Overrides};
use fileserver::server::{Server, Shutdown, shutdown};

/// Serves static files and accepts JSON uploads over keep-alive HTTP/1.1.
#[derive(Debug, Parser)]
#[command(name = "fileserver", version)]
struct Cli {
    /// Port to listen on [default: 8080]
    port: Option<u16>,

    /// Address to bind [default: 127.0.0.1]
    host: Option<String>,

    /// Maximum connections served at once [default: 10]
    max_threads: Option<usize>,

    /// YAML config file; positional arguments override it
    #[arg(long, env = CONFIG_ENV)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(
        cli.config.as_deref(),
        Overrides {
            port: cli.port,
            host: cli.host,
            max_threads: cli.max_threads,
        },
    )?;

    let server = Server::bind(cfg).await?;

    let shutdown_tx = Shutdown::new();
    let rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        shutdown::wait_for_signal().await;
        shutdown_tx.trigger();
    });

    server.run(rx).await
}
