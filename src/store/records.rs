// Persisted record types for the grievance store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grievance lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Open,
    InProgress,
    Resolved,
    Closed,
    Escalated,
    PendingInfo,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::InProgress => "IN_PROGRESS",
            Status::Resolved => "RESOLVED",
            Status::Closed => "CLOSED",
            Status::Escalated => "ESCALATED",
            Status::PendingInfo => "PENDING_INFO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Status::Open),
            "IN_PROGRESS" => Some(Status::InProgress),
            "RESOLVED" => Some(Status::Resolved),
            "CLOSED" => Some(Status::Closed),
            "ESCALATED" => Some(Status::Escalated),
            "PENDING_INFO" => Some(Status::PendingInfo),
            _ => None,
        }
    }

    /// RESOLVED and CLOSED records are never reopened by automated flows
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Resolved | Status::Closed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complaint priority, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Priority::Low),
            "Medium" => Some(Priority::Medium),
            "High" => Some(Priority::High),
            "Critical" => Some(Priority::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hotspot severity for an area, derived from open-complaint thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HotspotLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl HotspotLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HotspotLevel::Low => "LOW",
            HotspotLevel::Medium => "MEDIUM",
            HotspotLevel::High => "HIGH",
            HotspotLevel::Critical => "CRITICAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(HotspotLevel::Low),
            "MEDIUM" => Some(HotspotLevel::Medium),
            "HIGH" => Some(HotspotLevel::High),
            "CRITICAL" => Some(HotspotLevel::Critical),
            _ => None,
        }
    }
}

/// The canonical grievance record
#[derive(Debug, Clone, Serialize)]
pub struct Grievance {
    pub ticket_id: String,
    pub citizen_name: Option<String>,
    pub contact: Option<String>,
    pub description: String,
    pub location: Option<String>,
    /// Normalized location used for hotspot grouping
    pub area: Option<String>,
    pub department: String,
    pub category: String,
    pub priority: Priority,
    pub status: Status,
    pub call_id: Option<String>,
    pub escalated: i64,
    pub escalation_reason: Option<String>,
    pub assigned_to: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub resolution_notes: Option<String>,
    pub citizen_rating: Option<i64>,
    pub resolution_time_hours: Option<f64>,
}

/// Fields required to create a grievance; the store mints the ticket id
#[derive(Debug, Clone)]
pub struct NewGrievance {
    pub citizen_name: Option<String>,
    pub contact: Option<String>,
    pub description: String,
    pub location: Option<String>,
    pub department: String,
    pub category: String,
    pub priority: Priority,
    pub call_id: Option<String>,
}

/// List filter for the operator API; all fields optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrievanceFilter {
    pub department: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub area: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Status-check audit record (append-only)
#[derive(Debug, Clone, Serialize)]
pub struct StatusCheck {
    pub id: i64,
    pub ticket_id: String,
    pub phone_number: Option<String>,
    pub checked_at: DateTime<Utc>,
    pub call_id: Option<String>,
}

/// Escalation audit record (append-only)
#[derive(Debug, Clone, Serialize)]
pub struct Escalation {
    pub id: i64,
    pub ticket_id: String,
    pub reason: String,
    pub escalated_by: Option<String>,
    pub escalated_at: DateTime<Utc>,
    pub call_id: Option<String>,
}

/// Citizen feedback record (append-only; ticket linkage optional)
#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub id: i64,
    pub ticket_id: Option<String>,
    pub rating: i64,
    pub feedback_text: String,
    pub phone_number: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub call_id: Option<String>,
}

/// Emergency record, standalone with no ticket linkage
#[derive(Debug, Clone, Serialize)]
pub struct Emergency {
    pub id: i64,
    pub emergency_type: String,
    pub location: String,
    pub phone_number: String,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub call_id: Option<String>,
}

/// Per-area complaint density row
#[derive(Debug, Clone, Serialize)]
pub struct AreaHotspot {
    pub area_name: String,
    pub normalized_name: String,
    pub total_complaints: i64,
    pub open_complaints: i64,
    pub resolved_complaints: i64,
    pub critical_complaints: i64,
    pub high_complaints: i64,
    pub medium_complaints: i64,
    pub low_complaints: i64,
    pub is_hotspot: bool,
    pub hotspot_level: Option<HotspotLevel>,
    pub flagged_at: Option<DateTime<Utc>>,
    pub first_complaint_at: Option<DateTime<Utc>>,
    pub last_complaint_at: Option<DateTime<Utc>>,
    pub alert_sent: bool,
}
