use anyhow::Result;
use clap::Parser;
use resize_packager::engine::ResizeEngine;
use resize_packager::models::Config;
use resize_packager::server::{router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "resize-packager")]
#[command(about = "Resize uploaded images and publish them as a zip archive")]
struct CliArgs {
    /// Address to listen on. Overrides BIND_ADDR.
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Keep archives in memory instead of uploading them.
    #[arg(long)]
    dry_run: bool,
}

fn load_config(args: &CliArgs) -> resize_packager::Result<Config> {
    dotenvy::dotenv().ok();

    let mut config = Config::from_lookup(|key| {
        if key == "DRY_RUN" && args.dry_run {
            Some("true".to_string())
        } else {
            std::env::var(key).ok()
        }
    })?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    Ok(config)
}

async fn serve(config: Config) -> Result<()> {
    let engine = ResizeEngine::from_config(&config).await?;
    let state = AppState {
        engine: Arc::new(engine),
        spool_dir: config.spool_dir.clone(),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state, config.max_upload_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resize_packager=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resize-packager");

    let args = CliArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    match serve(config).await {
        Ok(()) => {
            info!("Server stopped");
            Ok(())
        }
        Err(e) => {
            error!("Server failed: {}", e);
            std::process::exit(1);
        }
    }
}
