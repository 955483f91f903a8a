//! appforged — the AppForge daemon.
//!
//! Single binary that assembles the AppForge subsystems:
//! - Deployment registry (redb)
//! - Provider catalog
//! - Fallback orchestrator
//! - Analytics aggregator
//! - REST API
//!
//! # Usage
//!
//! ```text
//! appforged init-config --path appforge.toml
//! appforged serve --config appforge.toml --port 8787
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use appforge_analytics::AnalyticsAggregator;
use appforge_api::{ApiState, build_router};
use appforge_core::ForgeConfig;
use appforge_orchestrator::Orchestrator;
use appforge_providers::ProviderCatalog;
use appforge_state::StateStore;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,appforged=debug,appforge=debug";

#[derive(Parser)]
#[command(name = "appforged", about = "AppForge daemon", version)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server.
    Serve {
        /// Path to appforge.toml. Built-in defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides `server.port`).
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state (overrides `server.data_dir`).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Base URL used in deployment links (overrides `server.public_base_url`).
        #[arg(long)]
        public_base_url: Option<String>,
    },

    /// Write the default configuration file.
    InitConfig {
        #[arg(long, default_value = "appforge.toml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve {
            config,
            port,
            data_dir,
            public_base_url,
        } => {
            let mut config = match config {
                Some(path) => ForgeConfig::from_file(&path)
                    .with_context(|| format!("failed to load config from {}", path.display()))?,
                None => ForgeConfig::default(),
            };
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.server.data_dir = data_dir;
            }
            if let Some(base) = public_base_url {
                config.server.public_base_url = base;
            }
            run_server(config).await
        }
        Command::InitConfig { path, force } => init_config(&path, force),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(path, ForgeConfig::default().to_toml_string()?)?;
    info!(path = %path.display(), "default configuration written");
    Ok(())
}

async fn run_server(config: ForgeConfig) -> anyhow::Result<()> {
    info!("AppForge daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&config.server.data_dir)?;
    let db_path = config.server.data_dir.join("appforge.redb");

    // ── Initialize subsystems ──────────────────────────────────

    let store = StateStore::open(&db_path)?.with_index_capacity(config.registry.index_capacity);
    info!(path = ?db_path, capacity = store.index_capacity(), "state store opened");

    let catalog = ProviderCatalog::from_config(&config);
    if catalog.default_chain().is_empty() {
        warn!("no provider has credentials, every request will use the template fallback");
    }

    let analytics = AnalyticsAggregator::new(store.clone());

    let orchestrator = Orchestrator::new(catalog, store.clone(), analytics.clone())
        .with_provider_timeout(config.provider_timeout())
        .with_public_base_url(config.server.public_base_url.clone());
    info!(
        timeout_secs = config.generation.provider_timeout_secs,
        "orchestrator initialized"
    );

    // ── Start API server ───────────────────────────────────────

    let router = build_router(ApiState {
        orchestrator,
        store,
        analytics,
        preview_chars: config.registry.preview_chars,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("AppForge daemon stopped");
    Ok(())
}
