use clap::Parser;
use optipress_server::{AppState, ServerConfig, create_router};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Optipress image upload and optimization service", long_about = None)]
struct Args {
    /// Configuration file (default: bundled defaults plus ./optipress.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configured value
    #[arg(short, long)]
    listen: Option<String>,

    /// Storage root directory, overrides the configured value
    #[arg(short, long)]
    data_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::load()?,
    };
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(root) = args.data_root {
        config.storage.root = root;
    }

    let state = AppState::new(&config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!(
        listen = %config.listen,
        root = %config.storage.root.display(),
        "Optipress server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
