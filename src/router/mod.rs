// Intent router
//
// Public interface for turning a conversation transcript into a spoken
// utterance plus at most one structured action request.

mod decision;
mod intent;
mod prompt;
mod schemas;

pub use decision::{Decision, IntentRouter, FALLBACK_UTTERANCE};
pub use intent::{
    ActionRequest, CheckStatus, Emergency, Escalate, GeneralInfo, IntentError, RecordFeedback,
    RegisterGrievance, EMERGENCY_TYPES, INFO_QUERY_TYPES,
};
pub use schemas::all_tools;
