// Route table and request handlers

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::conversation::{detect_confirmation, ConversationHistory};
use crate::router::FALLBACK_UTTERANCE;
use crate::store::{
    AreaDetails, AreaHotspot, DashboardStats, Emergency, Escalation, Feedback, Grievance,
    GrievanceFilter, StatusCheck,
};

use super::types::{
    ApiError, AssignRequest, EscalateRequest, HotspotQuery, LimitQuery, ResolveRequest,
    TurnRequest, TurnResponse,
};
use super::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Voice webhook
        .route("/calls/:call_id/turn", post(handle_turn))
        .route("/calls/:call_id", delete(handle_end_call))
        // Operator API
        .route("/grievances", get(handle_list_grievances))
        .route("/grievances/:ticket_id", get(handle_get_grievance))
        .route("/grievances/:ticket_id/resolve", post(handle_resolve))
        .route("/grievances/:ticket_id/escalate", post(handle_escalate))
        .route("/grievances/:ticket_id/assign", post(handle_assign))
        .route("/grievances/:ticket_id/escalations", get(handle_list_escalations))
        .route("/grievances/:ticket_id/status-checks", get(handle_list_status_checks))
        .route("/feedback", get(handle_list_feedback))
        .route("/emergencies", get(handle_list_emergencies))
        // Reporting
        .route("/stats/dashboard", get(handle_dashboard_stats))
        .route("/stats/hotspots", get(handle_hotspots))
        .route("/stats/areas/:area", get(handle_area_details))
        .route("/health", get(health_check))
        .with_state(state)
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// One conversational turn. Citizen-facing: every failure degrades to a
/// spoken fallback with HTTP 200, never an error payload.
async fn handle_turn(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<String>,
    Json(body): Json<TurnRequest>,
) -> Json<TurnResponse> {
    let text = body.text.trim().to_string();
    if text.is_empty() {
        return Json(TurnResponse {
            utterance: FALLBACK_UTTERANCE.to_string(),
            intent: None,
            ticket_id: None,
        });
    }

    // Clone the session out rather than holding a map guard across the
    // model call; turns within one call arrive sequentially.
    let mut history = state
        .sessions
        .get(&call_id)
        .map(|entry| entry.value().clone())
        .unwrap_or_else(ConversationHistory::with_greeting);

    history.push_user(&text);
    let user_confirmed = detect_confirmation(&text);

    tracing::info!(call_id = %call_id, user_confirmed, "Routing turn");

    let decision = state
        .router
        .route(history.turns(), &state.knowledge_note, user_confirmed)
        .await;

    let mut utterance = decision.utterance.clone();
    let mut intent = None;
    let mut ticket_id = None;

    if let Some(action) = &decision.action {
        let outcome = state.dispatcher.execute(action, Some(&call_id)).await;
        intent = Some(action.intent_name().to_string());
        ticket_id = outcome.ticket_id;
        if !outcome.utterance.is_empty() {
            utterance = outcome.utterance;
        }
    }

    if utterance.is_empty() {
        utterance = FALLBACK_UTTERANCE.to_string();
    }

    history.push_assistant(&utterance);
    state.sessions.insert(call_id, history);

    Json(TurnResponse {
        utterance,
        intent,
        ticket_id,
    })
}

/// Telephony provider signals the call ended; drop its history
async fn handle_end_call(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> Json<serde_json::Value> {
    state.sessions.remove(&call_id);
    tracing::info!(call_id = %call_id, "Call session cleaned up");
    Json(serde_json::json!({"ended": true}))
}

async fn handle_list_grievances(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<GrievanceFilter>,
) -> Result<Json<Vec<Grievance>>, ApiError> {
    Ok(Json(state.store.list(&filter).await?))
}

async fn handle_get_grievance(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Grievance>, ApiError> {
    Ok(Json(state.store.get(&ticket_id.to_uppercase()).await?))
}

async fn handle_resolve(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
    Json(body): Json<ResolveRequest>,
) -> Result<Json<Grievance>, ApiError> {
    let grievance = state
        .store
        .resolve(
            &ticket_id.to_uppercase(),
            &body.resolved_by,
            &body.resolution_notes,
            body.citizen_rating,
        )
        .await?;
    Ok(Json(grievance))
}

async fn handle_escalate(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
    Json(body): Json<EscalateRequest>,
) -> Result<Json<Grievance>, ApiError> {
    let grievance = state
        .store
        .escalate(
            &ticket_id.to_uppercase(),
            &body.reason,
            body.escalated_by.as_deref(),
            None,
        )
        .await?;
    Ok(Json(grievance))
}

async fn handle_assign(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
    Json(body): Json<AssignRequest>,
) -> Result<Json<Grievance>, ApiError> {
    let grievance = state
        .store
        .assign(&ticket_id.to_uppercase(), &body.assigned_to, body.remarks.as_deref())
        .await?;
    Ok(Json(grievance))
}

async fn handle_list_escalations(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Vec<Escalation>>, ApiError> {
    Ok(Json(state.store.list_escalations(&ticket_id.to_uppercase()).await?))
}

async fn handle_list_status_checks(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Vec<StatusCheck>>, ApiError> {
    Ok(Json(state.store.list_status_checks(&ticket_id.to_uppercase()).await?))
}

async fn handle_list_feedback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Feedback>>, ApiError> {
    Ok(Json(state.store.list_feedback(query.limit).await?))
}

async fn handle_list_emergencies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Emergency>>, ApiError> {
    Ok(Json(state.store.list_emergencies(query.limit).await?))
}

async fn handle_dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.store.dashboard_stats().await?))
}

async fn handle_hotspots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HotspotQuery>,
) -> Result<Json<Vec<AreaHotspot>>, ApiError> {
    Ok(Json(state.store.hotspots(query.flagged_only, query.min_complaints).await?))
}

async fn handle_area_details(
    State(state): State<Arc<AppState>>,
    Path(area): Path<String>,
) -> Result<Json<AreaDetails>, ApiError> {
    Ok(Json(state.store.area_details(&area).await?))
}
