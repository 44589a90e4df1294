//! services/app/src/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use edudash_core::ports::{
    AssignmentService, AuthService, DocumentQaService, KeyValueStore, MaterialService,
    ScoutChatService,
};

use crate::config::Config;
use crate::session::SessionManager;

/// The shared application state, created once at startup and passed to
/// every view and flow. All backend access goes through the port trait
/// objects so tests can substitute fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub assignments: Arc<dyn AssignmentService>,
    pub materials: Arc<dyn MaterialService>,
    pub qa: Arc<dyn DocumentQaService>,
    pub scout: Arc<dyn ScoutChatService>,
    pub auth: Arc<dyn AuthService>,
    pub store: Arc<dyn KeyValueStore>,
    pub session: SessionManager,
}
