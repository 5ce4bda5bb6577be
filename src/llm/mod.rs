// LLM API client
//
// Thin wrapper over the hosted Messages API: request/response types,
// tool definitions, and transport-level retry. Intent decisions live
// in the router, not here.

mod client;
mod retry;
pub mod types;

pub use client::LlmClient;
pub use retry::with_retry;
pub use types::{ContentBlock, Message, MessageRequest, MessageResponse, ToolDefinition, ToolInputSchema, ToolUse};
