// Vaani - citizen grievance voice assistant
// Main entry point

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use vaani::config::load_config;
use vaani::llm::LlmClient;
use vaani::router::IntentRouter;
use vaani::server::{self, AppState, RateLimiter};
use vaani::store::GrievanceStore;

#[derive(Parser)]
#[command(name = "vaani", about = "Citizen grievance voice assistant backend")]
struct Args {
    /// Config file (default: ~/.vaani/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the HTTP bind address from the config
    #[arg(long)]
    bind: Option<String>,

    /// Override the database path from the config
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vaani=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    // Missing credentials abort here, never mid-call
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(db) = args.db {
        config.db_path = db;
    }

    let store = Arc::new(GrievanceStore::open(&config.db_path, config.hotspots)?);

    let client = LlmClient::new(config.api_key.clone(), config.request_timeout_secs)?;
    let router = IntentRouter::new(client, config.model.clone(), config.max_tokens);

    let limiter = RateLimiter::new(
        config.rate_limit.requests_per_second,
        config.rate_limit.burst,
    );

    let state = Arc::new(AppState::new(store, router, config.knowledge_note.clone()));

    server::serve(state, &config.bind_address, limiter).await
}
