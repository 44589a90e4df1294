//! crates/edudash_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete HTTP client and browser-style local storage.

use async_trait::async_trait;
use bytes::Bytes;
use crate::domain::{
    Assignment, AuthTokens, ChatMessage, Material, MaterialUpload, NewAssignment, UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (network, storage).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// A non-success HTTP response from the backend, with the structured
    /// `detail` message when the body carried one.
    #[error("API error (status {status})")]
    Api { status: u16, detail: Option<String> },
    #[error("Network error: {0}")]
    Network(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AssignmentService: Send + Sync {
    /// Fetches every assignment visible to the current user.
    async fn list_assignments(&self) -> PortResult<Vec<Assignment>>;

    /// Creates and broadcasts an assignment to all students (teacher-only).
    async fn create_assignment(&self, assignment: &NewAssignment) -> PortResult<()>;
}

#[async_trait]
pub trait MaterialService: Send + Sync {
    /// Fetches every study material visible to the current user.
    async fn list_materials(&self) -> PortResult<Vec<Material>>;

    /// Downloads the raw bytes of a material. Used for both the "view"
    /// and "download" actions.
    async fn download_material(&self, material_id: &str) -> PortResult<Bytes>;

    /// Deletes a material (teacher-only).
    async fn delete_material(&self, material_id: &str) -> PortResult<()>;

    /// Uploads a new material as a multipart form.
    async fn upload_material(&self, upload: &MaterialUpload) -> PortResult<()>;
}

#[async_trait]
pub trait DocumentQaService: Send + Sync {
    /// Asks a natural-language question against a set of indexed materials.
    /// `temperature` is the user-tunable creativity scalar in [0, 1].
    async fn query_documents(
        &self,
        material_ids: &[String],
        query: &str,
        num_results: u32,
        temperature: f64,
    ) -> PortResult<String>;
}

#[async_trait]
pub trait ScoutChatService: Send + Sync {
    /// Sends one message plus the prior conversation to the navigation
    /// assistant and returns its reply.
    async fn chat(&self, message: &str, history: &[ChatMessage]) -> PortResult<String>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchanges an externally obtained Firebase id token for backend tokens.
    async fn login_firebase(&self, id_token: &str) -> PortResult<UserProfile>;

    /// Registers a new account.
    async fn register(&self, email: &str, password: &str, full_name: &str)
        -> PortResult<UserProfile>;

    /// Trades a refresh token for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> PortResult<AuthTokens>;

    /// Invalidates the server-side session.
    async fn logout(&self) -> PortResult<()>;

    /// Fetches the current user's profile.
    async fn me(&self) -> PortResult<UserProfile>;
}

/// The local persistent storage abstraction, modeled after browser
/// localStorage. Implementations must tolerate concurrent readers;
/// writers are expected to be a single UI thread.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> PortResult<()>;
    fn remove(&self, key: &str);
}
