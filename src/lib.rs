pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod feedback;
pub mod freshness;
pub mod models;
pub mod pages;
pub mod recipe;
pub mod serde_helper;
pub mod state;
pub mod stats;
pub mod storage;

pub use api::{ApiClient, TokenSource};
pub use auth::{AuthManager, AuthProvider, AuthSession, StaticTokenProvider};
pub use config::Config;
pub use errors::{ApiError, PageError, ValidationError};
pub use state::AppServices;
pub use storage::{load_preferences, persist_preferences};
