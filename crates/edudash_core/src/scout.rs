//! crates/edudash_core/src/scout.rs
//!
//! The Scout navigation assistant: a flat, append-only conversation with
//! the backend's chat endpoint. Unlike the document wizard there is no
//! configuration step; the whole prior transcript rides along with each
//! message.

use chrono::Utc;

use crate::domain::ChatMessage;
use crate::ports::ScoutChatService;

const EMPTY_REPLY_MSG: &str = "Sorry, I couldn't process that request.";
const CONNECT_ERROR_MSG: &str = "Sorry, I'm having trouble connecting. Please try again.";

/// One open Scout panel. Discarded when the panel closes.
#[derive(Default)]
pub struct ScoutConversation {
    messages: Vec<ChatMessage>,
    sending: bool,
}

impl ScoutConversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Sends one user message. The history forwarded to the backend is the
    /// transcript as it stood before this message. Failures surface as an
    /// assistant-authored apology and never tear the panel down.
    pub async fn send(&mut self, scout: &dyn ScoutChatService, text: &str) {
        if text.trim().is_empty() {
            return;
        }

        let history = self.messages.clone();
        self.messages.push(ChatMessage::user(text, Utc::now()));
        self.sending = true;

        let reply = match scout.chat(text, &history).await {
            Ok(reply) if !reply.is_empty() => reply,
            Ok(_) => EMPTY_REPLY_MSG.to_string(),
            Err(_) => CONNECT_ERROR_MSG.to_string(),
        };
        self.messages.push(ChatMessage::assistant(reply, Utc::now()));
        self.sending = false;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.sending = false;
    }
}
