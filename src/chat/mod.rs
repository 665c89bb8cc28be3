pub mod orchestrator;
pub mod prompt;

use serde::{Deserialize, Serialize};

/// Role of a prior conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One prior turn in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

/// Immutable per-request conversation state handed in by the caller.
///
/// The collaborator that authenticated the user and loaded their data builds
/// one of these per request; the pipeline only reads it.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub user_text: String,
    /// Opaque domain payload rendered into the instruction text.
    pub domain_data: serde_json::Map<String, serde_json::Value>,
    pub language: String,
    pub history: Vec<ChatTurn>,
    pub wants_report: bool,
}

/// How many history entries still count as the first real exchange.
///
/// One full exchange is two entries (user + model), so anything at or under
/// this is the opening of the conversation.
pub const FIRST_EXCHANGE_MAX_TURNS: usize = 2;

/// Prompt-construction strategy, chosen once per request and never
/// re-evaluated mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    ReportGeneration,
    FirstTurnQa,
    FollowUpQa,
}

impl PromptMode {
    /// Select the prompt mode for a request.
    ///
    /// Pure over its two inputs. An established conversation is never
    /// retroactively turned into a report request, whatever the flag says.
    #[must_use]
    pub fn select(history_len: usize, wants_report: bool) -> Self {
        if history_len <= FIRST_EXCHANGE_MAX_TURNS {
            if wants_report {
                PromptMode::ReportGeneration
            } else {
                PromptMode::FirstTurnQa
            }
        } else {
            PromptMode::FollowUpQa
        }
    }
}
