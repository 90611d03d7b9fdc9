//! Room data providers.
//!
//! # Data Flow
//! ```text
//! AppConfig
//!     → build_provider (demo or Outlook, decided once at startup)
//!     → Arc<dyn RoomDataProvider> injected into the HTTP layer
//!
//! GET /data       → get_room_data() → Vec<RoomRecord>
//! POST /instabook → add_booking()   → BookingOutcome
//! ```
//!
//! # Design Decisions
//! - The HTTP layer never inspects provider output; records pass through
//! - Booking conflicts are a provider concern, reported as `success: false`
//! - Transport and decode failures are `ProviderError`s and surface as 500

pub mod demo;
pub mod model;
pub mod outlook;

use std::sync::Arc;

use chrono_tz::Tz;
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::AppConfig;

pub use demo::DemoProvider;
pub use model::{Booking, BookingOutcome, RoomRecord};
pub use outlook::{OutlookProvider, RoomDirectory};

/// Errors raised by a provider while talking to its backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("calendar request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("calendar returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode calendar response: {0}")]
    Decode(String),

    #[error("provider misconfigured: {0}")]
    Config(String),
}

/// A backend that knows which rooms exist and how they are booked.
pub trait RoomDataProvider: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Current room and booking state.
    fn get_room_data(&self) -> BoxFuture<'_, Result<Vec<RoomRecord>, ProviderError>>;

    /// Book `room_id` from now for `length_minutes`.
    fn add_booking<'a>(
        &'a self,
        room_id: &'a str,
        length_minutes: u32,
    ) -> BoxFuture<'a, Result<BookingOutcome, ProviderError>>;
}

/// Select and construct the provider for this process.
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn RoomDataProvider>, ProviderError> {
    let tz: Tz = config.outlook.timezone_name.parse().map_err(|_| {
        ProviderError::Config(format!(
            "unknown timezone {:?}",
            config.outlook.timezone_name
        ))
    })?;

    if config.demo_mode {
        tracing::debug!("Using demo backend...");
        Ok(Arc::new(DemoProvider::new(tz)))
    } else {
        tracing::debug!("Using Outlook backend...");
        Ok(Arc::new(OutlookProvider::from_config(&config.outlook, tz)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_mode_builds_demo_provider() {
        let mut config = AppConfig::default();
        config.demo_mode = true;
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "demo");
    }

    #[test]
    fn test_live_mode_builds_outlook_provider() {
        let mut config = AppConfig::default();
        config.demo_mode = false;
        config.outlook.domain = Some("CORP".to_string());
        config.outlook.ews_url = Some("https://outlook.example.com/api/v2.0".to_string());
        config.outlook.username = Some("svc".to_string());
        config.outlook.password = Some("secret".to_string());
        config.outlook.room_search_term = Some("Room".to_string());
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "outlook");
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let mut config = AppConfig::default();
        config.demo_mode = true;
        config.outlook.timezone_name = "Nowhere/Special".to_string();
        assert!(matches!(build_provider(&config), Err(ProviderError::Config(_))));
    }
}
