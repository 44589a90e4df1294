pub mod adapters;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod views;

pub use config::Config;
pub use error::AppError;
pub use session::SessionManager;
pub use state::AppState;
