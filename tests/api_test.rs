// Integration tests for the HTTP surface
//
// The operator API is exercised with in-process oneshot requests; the
// voice webhook is driven against a mocked LLM endpoint.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

use vaani::llm::LlmClient;
use vaani::router::IntentRouter;
use vaani::server::{create_router, AppState};
use vaani::store::{GrievanceStore, HotspotThresholds, NewGrievance, Priority};

/// State wired to an LLM endpoint that doesn't exist; operator routes
/// never touch it.
fn state_without_llm(dir: &TempDir) -> Arc<AppState> {
    state_with_llm_url(dir, "http://127.0.0.1:9/v1/messages")
}

fn state_with_llm_url(dir: &TempDir, url: &str) -> Arc<AppState> {
    let store = Arc::new(
        GrievanceStore::open(&dir.path().join("api.db"), HotspotThresholds::default()).unwrap(),
    );
    let client = LlmClient::new("test-key".to_string(), 5)
        .unwrap()
        .with_api_url(url.to_string());
    let router = IntentRouter::new(client, "test-model".to_string(), 256);
    Arc::new(AppState::new(store, router, String::new()))
}

async fn seed_grievance(state: &AppState) -> String {
    state
        .store
        .create_grievance(NewGrievance {
            citizen_name: Some("Rajesh Kumar".to_string()),
            contact: Some("9876543210".to_string()),
            description: "No water for 5 days".to_string(),
            location: Some("Sector 12".to_string()),
            department: "Water (DJB)".to_string(),
            category: "Water Supply".to_string(),
            priority: Priority::High,
            call_id: None,
        })
        .await
        .unwrap()
        .ticket_id
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let app = create_router(state_without_llm(&dir));

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_get_grievance_and_404() {
    let dir = TempDir::new().unwrap();
    let state = state_without_llm(&dir);
    let ticket = seed_grievance(&state).await;
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/grievances/{ticket}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ticket_id"], ticket);
    assert_eq!(body["status"], "OPEN");

    let response = app.oneshot(get_request("/grievances/DEL-000000")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "not_found");
    assert!(body["error"]["message"].as_str().unwrap().contains("DEL-000000"));
}

#[tokio::test]
async fn test_resolve_then_conflict() {
    let dir = TempDir::new().unwrap();
    let state = state_without_llm(&dir);
    let ticket = seed_grievance(&state).await;
    let app = create_router(state);

    let resolve = serde_json::json!({
        "resolved_by": "Officer Sharma",
        "resolution_notes": "Tanker dispatched, supply restored",
        "citizen_rating": 4
    });

    let response = app
        .clone()
        .oneshot(json_request("POST", &format!("/grievances/{ticket}/resolve"), resolve.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "RESOLVED");
    assert_eq!(body["resolved_by"], "Officer Sharma");

    // Second resolve is an explicit conflict, not a no-op
    let response = app
        .oneshot(json_request("POST", &format!("/grievances/{ticket}/resolve"), resolve))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn test_escalate_endpoint_and_404() {
    let dir = TempDir::new().unwrap();
    let state = state_without_llm(&dir);
    let ticket = seed_grievance(&state).await;
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/grievances/{ticket}/escalate"),
            serde_json::json!({"reason": "No action in a week"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ESCALATED");
    assert_eq!(body["escalated"], 1);

    let response = app
        .oneshot(json_request(
            "POST",
            "/grievances/DEL-000000/escalate",
            serde_json::json!({"reason": "whatever"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_with_filters() {
    let dir = TempDir::new().unwrap();
    let state = state_without_llm(&dir);
    seed_grievance(&state).await;
    seed_grievance(&state).await;
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(get_request("/grievances?department=Water%20(DJB)&status=OPEN"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let response = app
        .oneshot(get_request("/grievances?priority=Critical"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_stats_endpoints() {
    let dir = TempDir::new().unwrap();
    let state = state_without_llm(&dir);
    seed_grievance(&state).await;
    let app = create_router(state);

    let response = app.clone().oneshot(get_request("/stats/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total_open_complaints"], 1);

    let response = app
        .clone()
        .oneshot(get_request("/stats/hotspots?min_complaints=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app.oneshot(get_request("/stats/areas/sector%2012")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["area"]["total_complaints"], 1);
}

#[tokio::test]
async fn test_voice_turn_registers_after_confirmation() {
    let mut llm = mockito::Server::new_async().await;
    let _mock = llm
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(
            serde_json::json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "model": "test-model",
                "stop_reason": "tool_use",
                "content": [{
                    "type": "tool_use",
                    "id": "toolu_1",
                    "name": "register_grievance",
                    "input": {
                        "name": "Rajesh Kumar",
                        "contact": "9876543210",
                        "issue": "no water for 5 days in Sector 12, 20 houses affected",
                        "location": "Sector 12"
                    }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let state = state_with_llm_url(&dir, &format!("{}/v1/messages", llm.url()));
    let app = create_router(Arc::clone(&state));

    let response = app
        .oneshot(json_request(
            "POST",
            "/calls/call_42/turn",
            serde_json::json!({"text": "yes please register it"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["intent"], "register_grievance");
    let ticket = body["ticket_id"].as_str().unwrap().to_string();
    assert!(body["utterance"].as_str().unwrap().contains(&ticket));

    // The grievance landed in the store with the routed classification
    let stored = state.store.get(&ticket).await.unwrap();
    assert_eq!(stored.department, "Water (DJB)");
    assert!(stored.priority >= Priority::High);
    assert_eq!(stored.call_id.as_deref(), Some("call_42"));
}

#[tokio::test]
async fn test_voice_turn_gate_holds_without_confirmation() {
    let mut llm = mockito::Server::new_async().await;
    let _mock = llm
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(
            serde_json::json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "model": "test-model",
                "stop_reason": "tool_use",
                "content": [{
                    "type": "tool_use",
                    "id": "toolu_1",
                    "name": "register_grievance",
                    "input": {
                        "name": "Rajesh Kumar",
                        "contact": "9876543210",
                        "issue": "no water",
                        "location": "Sector 12"
                    }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let state = state_with_llm_url(&dir, &format!("{}/v1/messages", llm.url()));
    let app = create_router(Arc::clone(&state));

    // "register my complaint" carries no confirmation keyword
    let response = app
        .oneshot(json_request(
            "POST",
            "/calls/call_43/turn",
            serde_json::json!({"text": "register my complaint about water"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body.get("intent").is_none());
    assert!(body["utterance"].as_str().unwrap().contains("Shall I register"));

    // Nothing was written
    let stats = state.store.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_open_complaints, 0);
}

#[tokio::test]
async fn test_voice_turn_llm_outage_degrades_to_fallback() {
    let dir = TempDir::new().unwrap();
    // Port 9 is discard; the connection fails fast
    let state = state_with_llm_url(&dir, "http://127.0.0.1:9/v1/messages");
    let app = create_router(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/calls/call_44/turn",
            serde_json::json!({"text": "hello?"}),
        ))
        .await
        .unwrap();
    // Citizens never see raw errors
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["utterance"], "I'm sorry, could you please repeat that?");
}

#[tokio::test]
async fn test_end_call_drops_session() {
    let dir = TempDir::new().unwrap();
    let state = state_without_llm(&dir);
    state
        .sessions
        .insert("call_77".to_string(), vaani::conversation::ConversationHistory::with_greeting());
    let app = create_router(Arc::clone(&state));

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/calls/call_77")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.sessions.get("call_77").is_none());
}
