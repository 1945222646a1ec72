use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use snipdoc_core::config_file::{self, apply_env};
use snipdoc_core::remote::GoogleDrive;
use snipdoc_core::{Config, DocumentStore, RemoteDocuments};
use snipdoc_pdf_mupdf::MupdfBackend;
use snipdoc_web::{AppState, router};

/// Extract text from PDFs and save snippets to local .docx files or Google Drive
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (replaces the platform/CWD cascade)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long)]
    bind: Option<String>,

    /// Directory holding the managed .docx files
    #[arg(long)]
    docs_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Resolve configuration: CLI flags > env vars > config files > defaults
    let file = match &cli.config {
        Some(path) => config_file::load_from_path(path)
            .with_context(|| format!("cannot load config file {}", path.display()))?,
        None => config_file::load_config(),
    };
    let mut config = Config::from(apply_env(file, |key| std::env::var(key).ok()));
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(docs_dir) = cli.docs_dir {
        config.docs_dir = docs_dir;
    }
    tracing::debug!(?config, "resolved configuration");

    let store = DocumentStore::open(&config.docs_dir).with_context(|| {
        format!(
            "cannot open documents directory {}",
            config.docs_dir.display()
        )
    })?;

    let remote = GoogleDrive::from_config(&config)
        .map(|drive| Arc::new(drive) as Arc<dyn RemoteDocuments>);
    if remote.is_none() {
        tracing::warn!(
            "no Google credentials configured (GOOGLE_ACCESS_TOKEN or GOOGLE_TOKEN_FILE); \
             saving to Google Drive is disabled"
        );
    }

    let static_dir = config.static_dir.clone().filter(|dir| {
        let exists = dir.is_dir();
        if !exists {
            tracing::warn!(dir = %dir.display(), "static directory not found, not serving frontend");
        }
        exists
    });

    let state = Arc::new(AppState {
        store: Arc::new(store),
        pdf: Arc::new(MupdfBackend::new()),
        remote,
        static_dir,
        max_upload_bytes: config.max_upload_bytes,
    });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("cannot bind {}", config.bind))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
