//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins; otherwise the default filter follows the server mode
//! - `try_init` so tests and repeated calls never panic

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::http::ServerMode;

/// Default filter directives for a server mode.
pub fn default_filter(mode: ServerMode) -> &'static str {
    match mode {
        ServerMode::Debug => "room_display=debug,tower_http=debug",
        ServerMode::Production => "room_display=info,tower_http=info",
    }
}

/// Initialize the global tracing subscriber.
pub fn init(mode: ServerMode) {
    let result = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(mode).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();

    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_parse() {
        for mode in [ServerMode::Debug, ServerMode::Production] {
            assert!(default_filter(mode).parse::<EnvFilter>().is_ok());
        }
    }
}
