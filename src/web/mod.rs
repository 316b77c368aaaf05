//! # HTTP Surface
//!
//! axum router exposing the task lifecycle service over JSON.

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use errors::{ApiError, ApiResult};
pub use routes::create_app;
pub use state::AppState;
