use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chatscrape_common::observability::{LogConfig, init_logging};
use chatscrape_config::{ChatscrapeConfig, ChatscrapeConfigLoader};
use chatscrape_runtime::{ServiceHandle, ServiceRuntime};
use chatscrape_web::browser::FantocciniCapturer;
use chatscrape_web::service::ScrapeService;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

mod routes;

const DEFAULT_CONFIG_FILE: &str = "chatscrape.yaml";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Serve chat-conversation extraction over HTTP.
#[derive(Debug, Parser)]
#[command(name = "chatscrape", version)]
struct Cli {
    /// YAML config file. Without it `chatscrape.yaml` is used when present.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Listen port, overriding the configured one.
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins over file, CLI wins over both)
    let loader = match &cli.config {
        Some(path) => ChatscrapeConfigLoader::new().with_file(path),
        None => ChatscrapeConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let mut cfg: ChatscrapeConfig = loader.load().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        cfg.server.port = port;
    }

    // 2) Logging from the loaded settings
    let log_path = init_logging(LogConfig {
        app_name: "chatscrape",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    info!(target: "server", log = %log_path.display(), "logging initialised");

    let runtime = ServiceRuntime::build("chatscrape", None)?;
    runtime.run(SHUTDOWN_GRACE, |handle| serve(cfg, handle))
}

async fn serve(cfg: ChatscrapeConfig, handle: ServiceHandle) -> Result<()> {
    let capturer = FantocciniCapturer::new(cfg.browser.clone());
    let app = routes::build_router(Arc::new(ScrapeService::new(capturer)));

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        target: "server",
        %addr,
        webdriver = %cfg.browser.webdriver_url,
        "chatscrape listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { handle.shutdown_requested().await })
        .await?;

    info!(target: "server", "server stopped");
    Ok(())
}
