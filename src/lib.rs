//! Meeting room display with InstaBook.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod security;

pub use config::AppConfig;
pub use http::{HttpServer, ServerMode};
pub use lifecycle::Shutdown;
pub use provider::{build_provider, RoomDataProvider};
