//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → loader.rs (read variables, apply defaults, parse)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to the HTTP layer and the provider factory
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Every option has a default so an empty environment runs in demo mode
//! - A missing OUTLOOK_DOMAIN degrades to demo mode instead of failing

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from, load_from_env, ConfigError};
pub use schema::{
    AppConfig, FrontendConfig, InstabookConfig, ObservabilityConfig, OutlookConfig,
    PollingConfig, SecurityConfig, ServerConfig,
};
pub use validation::ValidationError;
