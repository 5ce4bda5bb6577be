// Structured action requests
//
// One closed sum type for everything the router can hand to the
// dispatcher. Tool payloads from the model are decoded and validated
// here; an action is only constructed once every required field for
// its intent is present.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::classify;
use crate::store::Priority;

pub const EMERGENCY_TYPES: &[&str] = &["medical", "fire", "crime", "disaster", "accident", "other"];

pub const INFO_QUERY_TYPES: &[&str] = &[
    "office_hours",
    "helpline_numbers",
    "procedures",
    "eligibility",
    "documents_required",
    "online_services",
    "other",
];

#[derive(Debug, Error, PartialEq)]
pub enum IntentError {
    #[error("unrecognized tool: {0}")]
    UnknownTool(String),

    #[error("{intent} is missing required field {field}")]
    MissingField {
        intent: &'static str,
        field: &'static str,
    },

    #[error("malformed tool payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegisterGrievance {
    pub name: String,
    pub contact: String,
    pub issue: String,
    pub location: String,
    pub department: String,
    pub category: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckStatus {
    pub ticket_id: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Escalate {
    pub ticket_id: String,
    pub reason: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeneralInfo {
    pub query_type: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordFeedback {
    pub rating: i64,
    pub feedback_text: String,
    pub ticket_id: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Emergency {
    pub emergency_type: String,
    pub location: String,
    pub phone_number: Option<String>,
    pub description: String,
}

/// The single hand-off type between router and dispatcher
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ActionRequest {
    RegisterGrievance(RegisterGrievance),
    CheckStatus(CheckStatus),
    Escalate(Escalate),
    GeneralInfo(GeneralInfo),
    RecordFeedback(RecordFeedback),
    Emergency(Emergency),
}

impl ActionRequest {
    /// Tool name the model used to request this action
    pub fn intent_name(&self) -> &'static str {
        match self {
            ActionRequest::RegisterGrievance(_) => "register_grievance",
            ActionRequest::CheckStatus(_) => "check_complaint_status",
            ActionRequest::Escalate(_) => "escalate_complaint",
            ActionRequest::GeneralInfo(_) => "provide_general_info",
            ActionRequest::RecordFeedback(_) => "record_feedback",
            ActionRequest::Emergency(_) => "emergency_assistance",
        }
    }

    /// Whether executing this action mutates the grievance store
    pub fn is_mutating(&self) -> bool {
        !matches!(self, ActionRequest::GeneralInfo(_))
    }

    /// Mutating intents sit behind the confirmation gate; emergencies
    /// are time-critical and bypass it, and status checks write only an
    /// audit row, so they pass as well.
    pub fn requires_confirmation(&self) -> bool {
        matches!(
            self,
            ActionRequest::RegisterGrievance(_)
                | ActionRequest::Escalate(_)
                | ActionRequest::RecordFeedback(_)
        )
    }

    /// Decode and validate a model tool invocation
    pub fn from_tool_use(name: &str, input: &Value) -> Result<Self, IntentError> {
        match name {
            "register_grievance" => parse_register(input),
            "check_complaint_status" => parse_check_status(input),
            "escalate_complaint" => parse_escalate(input),
            "provide_general_info" => parse_general_info(input),
            "record_feedback" => parse_feedback(input),
            "emergency_assistance" => parse_emergency(input),
            other => Err(IntentError::UnknownTool(other.to_string())),
        }
    }
}

fn str_field(input: &Value, key: &str) -> Option<String> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn require(
    input: &Value,
    intent: &'static str,
    field: &'static str,
) -> Result<String, IntentError> {
    str_field(input, field).ok_or(IntentError::MissingField { intent, field })
}

fn parse_register(input: &Value) -> Result<ActionRequest, IntentError> {
    const INTENT: &str = "register_grievance";
    let name = require(input, INTENT, "name")?;
    let contact = require(input, INTENT, "contact")?;
    let issue = require(input, INTENT, "issue")?;
    let location = require(input, INTENT, "location")?;

    // Classification fields are auto-derived when the model omits or
    // mangles them; severity disagreements resolve upward.
    let department =
        classify::department_or_classify(&str_field(input, "department").unwrap_or_default(), &issue);
    let category =
        classify::category_or_classify(&str_field(input, "category").unwrap_or_default(), &issue);
    let priority =
        classify::priority_or_classify(&str_field(input, "priority").unwrap_or_default(), &issue);

    Ok(ActionRequest::RegisterGrievance(RegisterGrievance {
        name,
        contact,
        issue,
        location,
        department,
        category,
        priority,
    }))
}

fn parse_check_status(input: &Value) -> Result<ActionRequest, IntentError> {
    let ticket_id = require(input, "check_complaint_status", "ticket_id")?.to_uppercase();
    Ok(ActionRequest::CheckStatus(CheckStatus {
        ticket_id,
        phone_number: str_field(input, "phone_number"),
    }))
}

fn parse_escalate(input: &Value) -> Result<ActionRequest, IntentError> {
    const INTENT: &str = "escalate_complaint";
    let ticket_id = require(input, INTENT, "ticket_id")?.to_uppercase();
    let reason = require(input, INTENT, "reason")?;
    Ok(ActionRequest::Escalate(Escalate {
        ticket_id,
        reason,
        phone_number: str_field(input, "phone_number"),
    }))
}

fn parse_general_info(input: &Value) -> Result<ActionRequest, IntentError> {
    let query_type = str_field(input, "query_type")
        .map(|q| q.to_lowercase())
        .filter(|q| INFO_QUERY_TYPES.contains(&q.as_str()))
        .unwrap_or_else(|| "other".to_string());
    Ok(ActionRequest::GeneralInfo(GeneralInfo {
        query_type,
        department: str_field(input, "department"),
    }))
}

fn parse_feedback(input: &Value) -> Result<ActionRequest, IntentError> {
    const INTENT: &str = "record_feedback";
    let rating = input
        .get("rating")
        .and_then(Value::as_i64)
        .ok_or(IntentError::MissingField {
            intent: INTENT,
            field: "rating",
        })?;
    if !(1..=5).contains(&rating) {
        return Err(IntentError::Malformed(format!("rating {rating} out of range 1-5")));
    }
    let feedback_text = require(input, INTENT, "feedback_text")?;
    Ok(ActionRequest::RecordFeedback(RecordFeedback {
        rating,
        feedback_text,
        ticket_id: str_field(input, "ticket_id"),
        phone_number: str_field(input, "phone_number"),
    }))
}

fn parse_emergency(input: &Value) -> Result<ActionRequest, IntentError> {
    const INTENT: &str = "emergency_assistance";
    // Time-critical: location and a description are enough to dispatch;
    // type defaults to "other" and the callback number can follow later.
    let location = require(input, INTENT, "location")?;
    let description = require(input, INTENT, "description")?;
    let emergency_type = str_field(input, "emergency_type")
        .map(|t| t.to_lowercase())
        .filter(|t| EMERGENCY_TYPES.contains(&t.as_str()))
        .unwrap_or_else(|| "other".to_string());
    Ok(ActionRequest::Emergency(Emergency {
        emergency_type,
        location,
        phone_number: str_field(input, "phone_number"),
        description,
    }))
}
