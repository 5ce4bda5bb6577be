// HTTP surface
//
// One axum app serving both collaborators: the telephony webhook that
// drives conversation turns, and the operator dashboard consuming the
// grievance store.

mod handlers;
mod middleware;
mod types;

pub use handlers::{create_router, health_check};
pub use middleware::RateLimiter;
pub use types::{
    ApiError, AssignRequest, EscalateRequest, HotspotQuery, LimitQuery, ResolveRequest,
    TurnRequest, TurnResponse,
};

use anyhow::Result;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::conversation::ConversationHistory;
use crate::dispatch::Dispatcher;
use crate::router::IntentRouter;
use crate::store::GrievanceStore;

// Natural-language turns are small; 1MB blocks oversized foreign payloads
const MAX_BODY_BYTES: usize = 1024 * 1024;
const LIMITER_PURGE_SECS: u64 = 600;

/// Shared application state behind every handler
pub struct AppState {
    pub store: Arc<GrievanceStore>,
    pub router: IntentRouter,
    pub dispatcher: Dispatcher,
    /// Conversation history per active call, keyed by call id
    pub sessions: DashMap<String, ConversationHistory>,
    /// Static reference material handed to the router as context
    pub knowledge_note: String,
}

impl AppState {
    pub fn new(store: Arc<GrievanceStore>, router: IntentRouter, knowledge_note: String) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&store)),
            store,
            router,
            sessions: DashMap::new(),
            knowledge_note,
        }
    }
}

/// Serve the app until ctrl-c
pub async fn serve(state: Arc<AppState>, bind_address: &str, limiter: RateLimiter) -> Result<()> {
    let addr: SocketAddr = bind_address.parse()?;

    // Keep the limiter's bucket map bounded
    let purge_limiter = limiter.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(LIMITER_PURGE_SECS)).await;
            purge_limiter.purge_idle(LIMITER_PURGE_SECS);
        }
    });

    let app = create_router(state)
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit,
        ))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("Starting grievance assistant server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
