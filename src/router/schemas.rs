// The six fixed tool schemas sent with every routing call

use serde_json::json;

use crate::classify::{CATEGORIES, DEPARTMENTS};
use crate::llm::{ToolDefinition, ToolInputSchema};

use super::intent::{EMERGENCY_TYPES, INFO_QUERY_TYPES};

fn tool(name: &str, description: &str, properties: serde_json::Value, required: &[&str]) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: ToolInputSchema {
            schema_type: "object".to_string(),
            properties,
            required: required.iter().map(|s| s.to_string()).collect(),
        },
    }
}

/// All six intent tools, in routing-priority order
pub fn all_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "register_grievance",
            "Register a new citizen grievance after explicit confirmation and all required details are collected.",
            json!({
                "name": {"type": "string", "description": "Citizen's full name as spoken. Do not guess."},
                "contact": {"type": "string", "description": "10-digit mobile number for updates"},
                "issue": {"type": "string", "description": "Detailed grievance description in the citizen's own words"},
                "location": {"type": "string", "description": "Specific area, colony, sector, street, or landmark"},
                "department": {"type": "string", "enum": DEPARTMENTS},
                "category": {"type": "string", "enum": CATEGORIES},
                "priority": {"type": "string", "enum": ["Low", "Medium", "High", "Critical"]}
            }),
            &["name", "contact", "issue", "location", "department", "category", "priority"],
        ),
        tool(
            "check_complaint_status",
            "Check the status of an existing complaint by ticket number.",
            json!({
                "ticket_id": {"type": "string", "description": "Ticket number, e.g. DEL-A1B2C3"},
                "phone_number": {"type": "string"}
            }),
            &["ticket_id"],
        ),
        tool(
            "escalate_complaint",
            "Escalate an existing complaint to higher authorities.",
            json!({
                "ticket_id": {"type": "string"},
                "reason": {"type": "string", "description": "Why the citizen wants escalation"},
                "phone_number": {"type": "string"}
            }),
            &["ticket_id", "reason"],
        ),
        tool(
            "provide_general_info",
            "Answer a general question about services, procedures, or departments.",
            json!({
                "query_type": {"type": "string", "enum": INFO_QUERY_TYPES},
                "department": {"type": "string"}
            }),
            &["query_type"],
        ),
        tool(
            "record_feedback",
            "Record citizen feedback about service quality.",
            json!({
                "rating": {"type": "integer", "enum": [1, 2, 3, 4, 5]},
                "feedback_text": {"type": "string"},
                "ticket_id": {"type": "string"},
                "phone_number": {"type": "string"}
            }),
            &["rating", "feedback_text"],
        ),
        tool(
            "emergency_assistance",
            "Immediate emergency dispatch. Use the moment the citizen reports an ongoing emergency.",
            json!({
                "emergency_type": {"type": "string", "enum": EMERGENCY_TYPES},
                "location": {"type": "string"},
                "phone_number": {"type": "string"},
                "description": {"type": "string"}
            }),
            &["emergency_type", "location", "phone_number", "description"],
        ),
    ]
}
