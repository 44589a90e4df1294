//! crates/edudash_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Everything here mirrors what the backend serves over its REST API;
//! this layer only reads these records and derives presentation state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A gradable task with a due date, authored by a teacher, visible to students.
///
/// Owned entirely by the backend. Identifiers are opaque strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
}

impl Assignment {
    /// The course label shown in the UI; assignments without one fall
    /// into the "General" bucket.
    pub fn course_label(&self) -> &str {
        self.course_name.as_deref().unwrap_or("General")
    }
}

/// An uploaded study document (PDF) optionally indexed for AI
/// question-answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default, rename = "type")]
    pub material_type: Option<String>,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub download_count: u64,
}

/// The role the backend assigned to the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
}

/// The authenticated user's profile, as returned by `/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: UserRole,
}

/// The access/refresh token pair issued by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Which side of a chat exchange authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single entry in a chat transcript (document Q&A or Scout).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::User,
            content: content.into(),
            timestamp,
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp,
        }
    }
}

/// Payload for creating and broadcasting a new assignment to all students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignment {
    pub title: String,
    pub description: String,
    pub due_date: String,
    #[serde(default)]
    pub course_name: Option<String>,
    pub points: i64,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Payload for uploading a new study material.
#[derive(Debug, Clone)]
pub struct MaterialUpload {
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    pub title: String,
    pub description: String,
    pub course_id: String,
    /// Sent to the backend as a comma-separated string.
    pub tags: Vec<String>,
    pub is_public: bool,
    /// Whether the backend should index the document for Q&A.
    pub vectorize: bool,
}
