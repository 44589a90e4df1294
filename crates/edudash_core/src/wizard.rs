//! crates/edudash_core/src/wizard.rs
//!
//! The three-phase document chat wizard: pick materials and a creativity
//! level, ask an initial question, then keep a follow-up conversation
//! going against the backend's retrieval-augmented Q&A endpoint.

use chrono::Utc;

use crate::domain::{ChatMessage, Material};
use crate::ports::{DocumentQaService, PortError};

/// How many retrieved passages the backend should ground each answer on.
const NUM_RESULTS: u32 = 3;

const DEFAULT_CREATIVITY: f64 = 0.5;

const NO_SELECTION_MSG: &str =
    "⚠️ Please select at least one document from the knowledge base before asking a question.";
const EMPTY_ANSWER_MSG: &str = "Sorry, I couldn't generate an answer at this time.";
const GENERIC_ERROR_MSG: &str = "Sorry, I encountered an error while processing your question.";
const NOT_VECTORIZED_MSG: &str = "❌ The selected documents haven't been uploaded or vectorized \
     yet. Teachers need to upload and vectorize study materials first.";
const SERVER_ERROR_MSG: &str = "⚠️ Internal server error. The documents may not be properly \
     vectorized. Please contact your teacher.";
const FOLLOW_UP_NOT_VECTORIZED_MSG: &str = "The selected documents haven't been uploaded or \
     vectorized yet. Please ask a teacher to upload study materials first.";

/// Which step of the document-chat flow is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    /// Selecting documents and tuning creativity.
    Config,
    /// Entering the initial question.
    Query,
    /// Multi-turn follow-up conversation.
    Chat,
}

/// The transient state of one open wizard instance. Nothing here is
/// persisted; closing the wizard discards the whole session.
pub struct ChatWizard {
    phase: WizardPhase,
    selected_documents: Vec<String>,
    creativity: f64,
    messages: Vec<ChatMessage>,
    sending: bool,
}

impl Default for ChatWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatWizard {
    pub fn new() -> Self {
        Self {
            phase: WizardPhase::Config,
            selected_documents: Vec::new(),
            creativity: DEFAULT_CREATIVITY,
            messages: Vec::new(),
            sending: false,
        }
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    pub fn selected_documents(&self) -> &[String] {
        &self.selected_documents
    }

    pub fn creativity(&self) -> f64 {
        self.creativity
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a request is currently outstanding. Mirrors the submit
    /// control's disabled state; it is not a hard serialization guard.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    //=====================================================================================
    // Config Phase
    //=====================================================================================

    /// Case-insensitive title filter for the searchable checklist.
    pub fn filter_materials<'a>(materials: &'a [Material], query: &str) -> Vec<&'a Material> {
        let needle = query.to_lowercase();
        materials
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Toggles one material in or out of the selection.
    pub fn toggle_document(&mut self, material_id: &str) {
        if let Some(pos) = self.selected_documents.iter().position(|id| id == material_id) {
            self.selected_documents.remove(pos);
        } else {
            self.selected_documents.push(material_id.to_string());
        }
    }

    /// Selects every currently visible material, or clears the selection
    /// when all of them are already selected.
    pub fn toggle_select_all(&mut self, visible: &[&Material]) {
        if self.selected_documents.len() == visible.len() {
            self.selected_documents.clear();
        } else {
            self.selected_documents = visible.iter().map(|m| m.id.clone()).collect();
        }
    }

    /// Clamped to [0, 1] before being forwarded as a temperature.
    pub fn set_creativity(&mut self, value: f64) {
        self.creativity = value.clamp(0.0, 1.0);
    }

    /// The "Done" action is available only with a non-empty selection.
    pub fn can_finish_config(&self) -> bool {
        !self.selected_documents.is_empty()
    }

    /// Moves from Config to Query. A hard precondition, not advisory:
    /// with nothing selected this is a no-op and returns false.
    pub fn finish_config(&mut self) -> bool {
        if self.phase != WizardPhase::Config || !self.can_finish_config() {
            return false;
        }
        self.phase = WizardPhase::Query;
        true
    }

    //=====================================================================================
    // Query and Chat Phases
    //=====================================================================================

    /// Submits the initial question. On success the user message and the
    /// assistant's answer are appended in that order and the wizard moves
    /// to the Chat phase. On failure an error-flavored assistant message
    /// is rendered instead and the wizard stays in Query so the user can
    /// retry; no error here is fatal to the session.
    pub async fn submit_query(&mut self, qa: &dyn DocumentQaService, query: &str) {
        if self.phase != WizardPhase::Query || query.trim().is_empty() {
            return;
        }

        if self.selected_documents.is_empty() {
            self.messages = vec![ChatMessage::assistant(NO_SELECTION_MSG, Utc::now())];
            return;
        }

        self.sending = true;
        self.messages = vec![ChatMessage::user(query, Utc::now())];

        match self.ask(qa, query).await {
            Ok(answer) => {
                self.messages.push(ChatMessage::assistant(answer, Utc::now()));
                self.phase = WizardPhase::Chat;
            }
            Err(e) => {
                self.messages
                    .push(ChatMessage::assistant(initial_error_message(&e), Utc::now()));
            }
        }
        self.sending = false;
    }

    /// Submits a follow-up question. The user message is appended
    /// optimistically before the call; the assistant reply (or an error
    /// message) is appended when the call resolves.
    pub async fn submit_follow_up(&mut self, qa: &dyn DocumentQaService, query: &str) {
        if self.phase != WizardPhase::Chat || query.trim().is_empty() {
            return;
        }

        self.messages.push(ChatMessage::user(query, Utc::now()));
        self.sending = true;

        let content = match self.ask(qa, query).await {
            Ok(answer) => answer,
            Err(e) => follow_up_error_message(&e),
        };
        self.messages.push(ChatMessage::assistant(content, Utc::now()));
        self.sending = false;
    }

    async fn ask(&self, qa: &dyn DocumentQaService, query: &str) -> Result<String, PortError> {
        let answer = qa
            .query_documents(&self.selected_documents, query, NUM_RESULTS, self.creativity)
            .await?;
        if answer.is_empty() {
            Ok(EMPTY_ANSWER_MSG.to_string())
        } else {
            Ok(answer)
        }
    }

    /// Closing the wizard from any phase resets every session field;
    /// nothing is retained across opens.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Error taxonomy for the initial query, surfaced as assistant-authored
/// chat text rather than exceptions.
fn initial_error_message(error: &PortError) -> String {
    match error {
        PortError::Api { status: 404, .. } | PortError::NotFound(_) => {
            NOT_VECTORIZED_MSG.to_string()
        }
        PortError::Api { status: 500, .. } => SERVER_ERROR_MSG.to_string(),
        PortError::Api {
            detail: Some(detail),
            ..
        } => format!("❌ {detail}"),
        PortError::Network(msg) | PortError::Unexpected(msg) => format!("⚠️ Error: {msg}"),
        _ => GENERIC_ERROR_MSG.to_string(),
    }
}

/// Follow-up failures read a little softer than the initial-query ones.
fn follow_up_error_message(error: &PortError) -> String {
    match error {
        PortError::Api { status: 404, .. } | PortError::NotFound(_) => {
            FOLLOW_UP_NOT_VECTORIZED_MSG.to_string()
        }
        PortError::Api {
            detail: Some(detail),
            ..
        } => detail.clone(),
        _ => GENERIC_ERROR_MSG.to_string(),
    }
}
