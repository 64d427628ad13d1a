//! # alertmate-ingestor
//!
//! HTTP endpoint that accepts notifications relayed by alertmate devices.
//!
//! ## Routes
//!
//! - `GET /health` - Health check
//! - `POST /ingest` - Accept one notification (`202`), reject invalid ones (`422`)

pub mod error;
pub mod notification;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use notification::Notification;
pub use routes::router;
pub use state::AppState;
