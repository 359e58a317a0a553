use anyhow::Result;
use clap::Parser;
use dupcheck::config::ServerConfig;
use dupcheck::server;
use std::path::PathBuf;
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about = "Find duplicate rows in uploaded CSV files")]
struct ServerArgs {
    #[clap(short, long)]
    config: Option<PathBuf>,
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(short, long)]
    port: Option<u16>,
    #[clap(long)]
    export_dir: Option<PathBuf>,
    #[clap(long)]
    cors_origin: Option<String>,
}

impl ServerArgs {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())?;
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(export_dir) = self.export_dir {
            config.export_dir = export_dir;
        }
        if self.cors_origin.is_some() {
            config.cors_origin = self.cors_origin;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    setup_logging(args.log_level.as_deref());

    let config = args.into_config()?;
    info!("Starting server on port {}", config.port);
    server::start_server(config).await?;

    Ok(())
}

/// `RUST_LOG` wins over `--log-level`.
fn setup_logging(log_level: Option<&str>) {
    let level = log_level
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("handlebars=off,{}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
