// Intent routing
//
// One model call per conversational turn: the transcript goes in with
// the six tool schemas, a spoken utterance and at most one validated
// action come out. The confirmation gate is enforced here in code,
// independent of what the prompt asks the model to do.

use crate::conversation::Turn;
use crate::llm::{LlmClient, Message, MessageRequest};

use super::intent::{ActionRequest, IntentError};
use super::{prompt, schemas};

/// Spoken when the model produces nothing usable
pub const FALLBACK_UTTERANCE: &str = "I'm sorry, could you please repeat that?";

/// What the router hands back for one turn
#[derive(Debug, Clone)]
pub struct Decision {
    pub utterance: String,
    pub action: Option<ActionRequest>,
}

impl Decision {
    fn fallback() -> Self {
        Self {
            utterance: FALLBACK_UTTERANCE.to_string(),
            action: None,
        }
    }
}

pub struct IntentRouter {
    client: LlmClient,
    model: String,
    max_tokens: u32,
}

impl IntentRouter {
    pub fn new(client: LlmClient, model: String, max_tokens: u32) -> Self {
        Self {
            client,
            model,
            max_tokens,
        }
    }

    /// Route one conversational turn. Pure over its inputs: no
    /// conversation state lives here, and the citizen never sees a raw
    /// error; every failure degrades to the fallback utterance.
    pub async fn route(&self, turns: &[Turn], context: &str, user_confirmed: bool) -> Decision {
        let messages: Vec<Message> = turns
            .iter()
            .map(|t| Message {
                role: t.role.as_str().to_string(),
                content: t.content.clone(),
            })
            .collect();

        if messages.is_empty() {
            return Decision::fallback();
        }

        let request = MessageRequest::new(&self.model, self.max_tokens, messages)
            .with_system(prompt::system_prompt(context, user_confirmed))
            .with_tools(schemas::all_tools());

        let response = match self.client.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Routing call failed: {e:#}");
                return Decision::fallback();
            }
        };

        let mut utterance = response.text().trim().to_string();
        let mut action = None;

        // At most one action per turn: the first decodable tool use wins
        for tool_use in response.tool_uses() {
            match ActionRequest::from_tool_use(&tool_use.name, &tool_use.input) {
                Ok(parsed) => {
                    if parsed.requires_confirmation() && !user_confirmed {
                        tracing::info!(intent = parsed.intent_name(),
                            "Suppressing unconfirmed mutating action");
                        if utterance.is_empty() {
                            utterance = confirmation_question(&parsed).to_string();
                        }
                    } else {
                        tracing::info!(intent = parsed.intent_name(), "Action selected");
                        action = Some(parsed);
                    }
                    break;
                }
                Err(IntentError::MissingField { field, intent }) => {
                    tracing::info!(intent, field, "Incomplete tool payload, re-prompting");
                    if utterance.is_empty() {
                        utterance = ask_for_field(field);
                    }
                    break;
                }
                Err(e) => {
                    tracing::warn!("Discarding tool payload: {e}");
                    // Fall through: a later block may still decode
                }
            }
        }

        if utterance.is_empty() && action.is_none() {
            return Decision::fallback();
        }

        Decision { utterance, action }
    }
}

fn confirmation_question(action: &ActionRequest) -> &'static str {
    match action {
        ActionRequest::RegisterGrievance(_) => "Shall I register this complaint for you?",
        ActionRequest::Escalate(_) => "Shall I escalate this complaint to senior authorities?",
        ActionRequest::RecordFeedback(_) => "Shall I record this feedback?",
        _ => "Shall I go ahead with this?",
    }
}

/// One missing field per turn
fn ask_for_field(field: &str) -> String {
    match field {
        "name" => "Could you please tell me your full name?".to_string(),
        "contact" => "What is your mobile number?".to_string(),
        "location" => "Which area are you calling from?".to_string(),
        "issue" => "Could you describe the issue in a little more detail?".to_string(),
        "ticket_id" => "Could you please tell me your ticket number?".to_string(),
        "reason" => "Why would you like this complaint escalated?".to_string(),
        "feedback_text" => "What feedback would you like to share?".to_string(),
        "description" => "Can you tell me what is happening there?".to_string(),
        other => format!("Could you please tell me the {}?", other.replace('_', " ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationHistory;

    fn tool_response(name: &str, input: serde_json::Value) -> String {
        serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "test-model",
            "stop_reason": "tool_use",
            "content": [
                {"type": "tool_use", "id": "toolu_1", "name": name, "input": input}
            ]
        })
        .to_string()
    }

    fn text_response(text: &str) -> String {
        serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "test-model",
            "stop_reason": "end_turn",
            "content": [{"type": "text", "text": text}]
        })
        .to_string()
    }

    fn router_for(server: &mockito::Server) -> IntentRouter {
        let client = LlmClient::new("test-key".to_string(), 5)
            .unwrap()
            .with_api_url(format!("{}/v1/messages", server.url()));
        IntentRouter::new(client, "test-model".to_string(), 256)
    }

    fn one_turn(text: &str) -> ConversationHistory {
        let mut history = ConversationHistory::new();
        history.push_user(text);
        history
    }

    #[tokio::test]
    async fn test_unconfirmed_register_is_suppressed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(tool_response(
                "register_grievance",
                serde_json::json!({
                    "name": "Rajesh", "contact": "9876543210",
                    "issue": "no water", "location": "Rohini"
                }),
            ))
            .create_async()
            .await;

        let router = router_for(&server);
        let history = one_turn("register my water complaint");
        let decision = router.route(history.turns(), "", false).await;

        assert!(decision.action.is_none(), "gate must hold when unconfirmed");
        assert_eq!(decision.utterance, "Shall I register this complaint for you?");
    }

    #[tokio::test]
    async fn test_confirmed_register_passes() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(tool_response(
                "register_grievance",
                serde_json::json!({
                    "name": "Rajesh", "contact": "9876543210",
                    "issue": "no water for 5 days, 20 houses affected",
                    "location": "Sector 12"
                }),
            ))
            .create_async()
            .await;

        let router = router_for(&server);
        let history = one_turn("yes please register it");
        let decision = router.route(history.turns(), "", true).await;

        match decision.action {
            Some(ActionRequest::RegisterGrievance(r)) => {
                assert_eq!(r.department, "Water (DJB)");
                assert!(r.priority >= crate::store::Priority::High);
            }
            other => panic!("expected register action, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_status_check_exempt_from_gate() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(tool_response(
                "check_complaint_status",
                serde_json::json!({"ticket_id": "DEL-123456"}),
            ))
            .create_async()
            .await;

        let router = router_for(&server);
        let history = one_turn("DEL-123456 status");
        let decision = router.route(history.turns(), "", false).await;

        match decision.action {
            Some(ActionRequest::CheckStatus(c)) => assert_eq!(c.ticket_id, "DEL-123456"),
            other => panic!("expected status action, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_emergency_bypasses_gate() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(tool_response(
                "emergency_assistance",
                serde_json::json!({
                    "emergency_type": "fire",
                    "location": "MG Road",
                    "description": "there's a fire right now"
                }),
            ))
            .create_async()
            .await;

        let router = router_for(&server);
        let history = one_turn("there's a fire right now at MG Road");
        let decision = router.route(history.turns(), "", false).await;

        match decision.action {
            Some(ActionRequest::Emergency(e)) => {
                assert_eq!(e.emergency_type, "fire");
                assert_eq!(e.location, "MG Road");
            }
            other => panic!("expected emergency action, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_incomplete_register_asks_for_one_field() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(tool_response(
                "register_grievance",
                serde_json::json!({"name": "Rajesh", "issue": "no water", "location": "Rohini"}),
            ))
            .create_async()
            .await;

        let router = router_for(&server);
        let history = one_turn("yes register it");
        let decision = router.route(history.turns(), "", true).await;

        assert!(decision.action.is_none());
        assert_eq!(decision.utterance, "What is your mobile number?");
    }

    #[tokio::test]
    async fn test_empty_model_output_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(text_response(""))
            .create_async()
            .await;

        let router = router_for(&server);
        let history = one_turn("mumble");
        let decision = router.route(history.turns(), "", false).await;

        assert_eq!(decision.utterance, FALLBACK_UTTERANCE);
        assert!(decision.action.is_none());
    }

    #[tokio::test]
    async fn test_plain_text_answer_passes_through() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(text_response("The helpline is open from nine to five."))
            .create_async()
            .await;

        let router = router_for(&server);
        let history = one_turn("when are you open?");
        let decision = router.route(history.turns(), "", false).await;

        assert_eq!(decision.utterance, "The helpline is open from nine to five.");
        assert!(decision.action.is_none());
    }
}
