//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, metrics)
//!     → security::access_control (403 for unlisted clients)
//!     → handlers.rs (/data, /instabook) or ServeFile (/)
//!     → provider (demo or Outlook)
//!     → JSON response
//! ```

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer, ServerMode};
