// LLM API request/response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Tool definition (Messages API-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// JSON Schema for tool input parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String, // Usually "object"
    pub properties: Value,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
}

impl MessageRequest {
    pub fn new(model: &str, max_tokens: u32, messages: Vec<Message>) -> Self {
        Self {
            model: model.to_string(),
            max_tokens,
            system: None,
            messages,
            tools: None,
        }
    }

    /// Set the system prompt
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Add tools to the request
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub response_type: String,
    pub role: String,
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
}

/// Content block - text or a tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
}

impl ContentBlock {
    pub fn is_tool_use(&self) -> bool {
        matches!(self, ContentBlock::ToolUse { .. })
    }

    /// Extract text from text block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A decoded tool invocation from the model
#[derive(Debug, Clone)]
pub struct ToolUse {
    pub name: String,
    pub input: Value,
}

impl MessageResponse {
    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| block.as_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_tool_uses(&self) -> bool {
        self.content.iter().any(|block| block.is_tool_use())
    }

    /// Extract tool uses from the response, in order
    pub fn tool_uses(&self) -> Vec<ToolUse> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { name, input, .. } => Some(ToolUse {
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_request_serialization_skips_empty_tools() {
        let request = MessageRequest::new("test-model", 256, vec![Message::user("hello")]);
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("\"tools\""));
        assert!(!json.contains("\"system\""));
    }

    #[test]
    fn test_message_request_with_system_and_tools() {
        let tool = ToolDefinition {
            name: "check_complaint_status".to_string(),
            description: "Check status of existing complaint".to_string(),
            input_schema: ToolInputSchema {
                schema_type: "object".to_string(),
                properties: serde_json::json!({"ticket_id": {"type": "string"}}),
                required: vec!["ticket_id".to_string()],
            },
        };
        let request = MessageRequest::new("test-model", 256, vec![Message::user("status?")])
            .with_system("You are a voice assistant.")
            .with_tools(vec![tool]);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"system\":\"You are a voice assistant.\""));
        assert!(json.contains("\"check_complaint_status\""));
    }

    #[test]
    fn test_response_text_and_tool_uses() {
        let response: MessageResponse = serde_json::from_str(
            r#"{
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "model": "test-model",
                "stop_reason": "tool_use",
                "content": [
                    {"type": "text", "text": "One moment."},
                    {"type": "tool_use", "id": "toolu_1", "name": "check_complaint_status",
                     "input": {"ticket_id": "DEL-123456"}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(response.text(), "One moment.");
        assert!(response.has_tool_uses());
        let uses = response.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].name, "check_complaint_status");
        assert_eq!(uses[0].input["ticket_id"], "DEL-123456");
    }

    #[test]
    fn test_response_without_tools() {
        let response: MessageResponse = serde_json::from_str(
            r#"{
                "id": "msg_2",
                "type": "message",
                "role": "assistant",
                "model": "test-model",
                "stop_reason": "end_turn",
                "content": [{"type": "text", "text": "Namaste."}]
            }"#,
        )
        .unwrap();
        assert!(!response.has_tool_uses());
        assert!(response.tool_uses().is_empty());
    }
}
