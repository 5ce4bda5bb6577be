// Action dispatcher
//
// Executes exactly one grievance-store write per action request and
// produces the spoken confirmation. On the voice path store errors
// degrade to spoken guidance; raw errors never reach the citizen.

use std::sync::Arc;

use crate::router::{ActionRequest, CheckStatus, Emergency, Escalate, RecordFeedback, RegisterGrievance};
use crate::store::{GrievanceStore, NewGrievance, Status, StoreError};

const TECHNICAL_DIFFICULTY: &str =
    "I apologize, I'm having technical difficulties. Please try again in a moment.";

/// Result of executing one action on the voice path
#[derive(Debug, Clone)]
pub struct Outcome {
    /// What the assistant says back to the citizen
    pub utterance: String,
    /// Ticket the action touched or created, when applicable
    pub ticket_id: Option<String>,
}

pub struct Dispatcher {
    store: Arc<GrievanceStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<GrievanceStore>) -> Self {
        Self { store }
    }

    /// Execute an action request from the router. Matches exhaustively
    /// over the intent sum type; each arm performs a single store
    /// operation.
    pub async fn execute(&self, action: &ActionRequest, call_id: Option<&str>) -> Outcome {
        match action {
            ActionRequest::RegisterGrievance(register) => self.register(register, call_id).await,
            ActionRequest::CheckStatus(check) => self.check_status(check, call_id).await,
            ActionRequest::Escalate(escalate) => self.escalate(escalate, call_id).await,
            ActionRequest::GeneralInfo(_) => Outcome {
                // Read-only: the router's own utterance answers the query
                utterance: String::new(),
                ticket_id: None,
            },
            ActionRequest::RecordFeedback(feedback) => self.feedback(feedback, call_id).await,
            ActionRequest::Emergency(emergency) => self.emergency(emergency, call_id).await,
        }
    }

    async fn register(&self, register: &RegisterGrievance, call_id: Option<&str>) -> Outcome {
        let new = NewGrievance {
            citizen_name: Some(register.name.clone()),
            contact: Some(register.contact.clone()),
            description: register.issue.clone(),
            location: Some(register.location.clone()),
            department: register.department.clone(),
            category: register.category.clone(),
            priority: register.priority,
            call_id: call_id.map(str::to_string),
        };

        match self.store.create_grievance(new).await {
            Ok(grievance) => Outcome {
                utterance: format!(
                    "Your complaint has been registered successfully. Your ticket number is {}. \
                     This has been marked as {} priority and sent to {}. \
                     You will receive SMS updates on {}.",
                    grievance.ticket_id, grievance.priority, grievance.department, register.contact
                ),
                ticket_id: Some(grievance.ticket_id),
            },
            Err(e) => {
                tracing::error!("Failed to register grievance: {e}");
                Outcome {
                    utterance: TECHNICAL_DIFFICULTY.to_string(),
                    ticket_id: None,
                }
            }
        }
    }

    async fn check_status(&self, check: &CheckStatus, call_id: Option<&str>) -> Outcome {
        // The audit row is written whether or not the ticket exists
        if let Err(e) = self
            .store
            .record_status_check(&check.ticket_id, check.phone_number.as_deref(), call_id)
            .await
        {
            tracing::warn!("Failed to log status check: {e}");
        }

        match self.store.get(&check.ticket_id).await {
            Ok(grievance) => Outcome {
                utterance: format!(
                    "Your complaint with ticket number {} {} {}. This is a {} priority issue.",
                    grievance.ticket_id,
                    status_phrase(grievance.status),
                    grievance.department,
                    grievance.priority
                ),
                ticket_id: Some(check.ticket_id.clone()),
            },
            Err(StoreError::NotFound(_)) => Outcome {
                utterance: format!(
                    "I could not find a complaint with ticket number {}. \
                     Please check the ticket number and try again.",
                    check.ticket_id
                ),
                ticket_id: None,
            },
            Err(e) => {
                tracing::error!("Status lookup failed: {e}");
                Outcome {
                    utterance: TECHNICAL_DIFFICULTY.to_string(),
                    ticket_id: None,
                }
            }
        }
    }

    async fn escalate(&self, escalate: &Escalate, call_id: Option<&str>) -> Outcome {
        match self
            .store
            .escalate(
                &escalate.ticket_id,
                &escalate.reason,
                escalate.phone_number.as_deref(),
                call_id,
            )
            .await
        {
            Ok(grievance) => Outcome {
                utterance: format!(
                    "Your complaint {} has been escalated to senior authorities. \
                     You will receive a call from a senior officer within twenty four hours.",
                    grievance.ticket_id
                ),
                ticket_id: Some(grievance.ticket_id),
            },
            Err(StoreError::NotFound(_)) => Outcome {
                utterance: format!(
                    "I could not find a complaint with ticket number {}. \
                     Please check the ticket number and try again.",
                    escalate.ticket_id
                ),
                ticket_id: None,
            },
            Err(StoreError::AlreadyResolved(_)) => Outcome {
                utterance: format!(
                    "Complaint {} has already been resolved. If the issue has come back, \
                     I can register a new complaint for you.",
                    escalate.ticket_id
                ),
                ticket_id: Some(escalate.ticket_id.clone()),
            },
            Err(e) => {
                tracing::error!("Escalation failed: {e}");
                Outcome {
                    utterance: TECHNICAL_DIFFICULTY.to_string(),
                    ticket_id: None,
                }
            }
        }
    }

    async fn feedback(&self, feedback: &RecordFeedback, call_id: Option<&str>) -> Outcome {
        match self
            .store
            .record_feedback(
                feedback.ticket_id.as_deref(),
                feedback.rating,
                &feedback.feedback_text,
                feedback.phone_number.as_deref(),
                call_id,
            )
            .await
        {
            Ok(_) => Outcome {
                utterance: format!(
                    "Thank you for your feedback. Your {}-star rating has been recorded. \
                     We appreciate your input in helping us improve our services.",
                    feedback.rating
                ),
                ticket_id: feedback.ticket_id.clone(),
            },
            Err(e) => {
                tracing::error!("Failed to record feedback: {e}");
                Outcome {
                    utterance: TECHNICAL_DIFFICULTY.to_string(),
                    ticket_id: None,
                }
            }
        }
    }

    async fn emergency(&self, emergency: &Emergency, call_id: Option<&str>) -> Outcome {
        match self
            .store
            .record_emergency(
                &emergency.emergency_type,
                &emergency.location,
                emergency.phone_number.as_deref().unwrap_or(""),
                &emergency.description,
                call_id,
            )
            .await
        {
            Ok(_) => Outcome {
                utterance: format!(
                    "I have immediately notified emergency services about the {} at {}. \
                     Help is on the way. Please stay on the line.",
                    emergency.emergency_type, emergency.location
                ),
                ticket_id: None,
            },
            Err(e) => {
                tracing::error!("Failed to record emergency: {e}");
                Outcome {
                    utterance: TECHNICAL_DIFFICULTY.to_string(),
                    ticket_id: None,
                }
            }
        }
    }
}

fn status_phrase(status: Status) -> &'static str {
    match status {
        Status::Open => "is currently open and being reviewed by",
        Status::InProgress => "is in progress and being handled by",
        Status::Resolved => "has been resolved by",
        Status::Closed => "has been closed by",
        Status::Escalated => "has been escalated to higher authorities in",
        Status::PendingInfo => "is awaiting further information with",
    }
}
