pub mod domain;
pub mod notifications;
pub mod ports;
pub mod scout;
pub mod validation;
pub mod wizard;

pub use domain::{
    Assignment, AuthTokens, ChatMessage, ChatRole, Material, MaterialUpload, NewAssignment,
    UserProfile, UserRole,
};
pub use ports::{
    AssignmentService, AuthService, DocumentQaService, KeyValueStore, MaterialService, PortError,
    PortResult, ScoutChatService,
};
pub use scout::ScoutConversation;
pub use wizard::{ChatWizard, WizardPhase};
