//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the room
//! display service. Every recognized option lives here with its default;
//! `loader.rs` fills it from the process environment.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Root configuration for the room display service.
#[derive(Debug, Clone, Serialize, Default)]
pub struct AppConfig {
    /// Listener configuration (host, port).
    pub server: ServerConfig,

    /// Resolved demo-mode flag. `true` means no live calendar is contacted.
    pub demo_mode: bool,

    /// Outlook calendar backend settings.
    pub outlook: OutlookConfig,

    /// Source address allow-list.
    pub security: SecurityConfig,

    /// Frontend polling parameters, passed through to `/data`.
    pub polling: PollingConfig,

    /// InstaBook settings.
    pub instabook: InstabookConfig,

    /// Static frontend settings.
    pub frontend: FrontendConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` form accepted by `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Outlook calendar backend configuration.
#[derive(Clone, Serialize)]
pub struct OutlookConfig {
    /// Windows domain. Absent means demo mode.
    pub domain: Option<String>,

    /// Base URL of the calendar REST endpoint.
    pub ews_url: Option<String>,

    pub username: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Room address -> display name.
    pub room_dict: Option<BTreeMap<String, String>>,

    /// Substring used to discover rooms when no room dict is configured.
    pub room_search_term: Option<String>,

    /// Seconds a fetched room list stays fresh.
    pub refresh_time_seconds: u64,

    /// IANA timezone used for the day window and booking times.
    pub timezone_name: String,
}

impl fmt::Debug for OutlookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlookConfig")
            .field("domain", &self.domain)
            .field("ews_url", &self.ews_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("room_dict", &self.room_dict)
            .field("room_search_term", &self.room_search_term)
            .field("refresh_time_seconds", &self.refresh_time_seconds)
            .field("timezone_name", &self.timezone_name)
            .finish()
    }
}

impl Default for OutlookConfig {
    fn default() -> Self {
        Self {
            domain: None,
            ews_url: None,
            username: None,
            password: None,
            room_dict: None,
            room_search_term: None,
            refresh_time_seconds: 60,
            timezone_name: "Europe/London".to_string(),
        }
    }
}

/// Access control configuration.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityConfig {
    /// Allowed source addresses. Empty allows everyone.
    pub allowed_ips: Vec<String>,

    /// Prefer `X-Forwarded-For` over the socket address.
    pub trust_forwarded_for: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_ips: Vec::new(),
            trust_forwarded_for: true,
        }
    }
}

/// Frontend polling parameters. Serialized as-is into the `/data` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollingConfig {
    /// Minutes between frontend refreshes.
    pub interval: i64,

    /// Minute of day polling starts.
    pub start_minute: i64,

    /// Minute of day polling stops.
    pub end_minute: i64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: 1,
            start_minute: 420,
            end_minute: 1140,
        }
    }
}

/// InstaBook configuration.
#[derive(Debug, Clone, Serialize)]
pub struct InstabookConfig {
    /// Offered booking lengths in minutes, in display order.
    pub times: Vec<u32>,

    /// Reject booking lengths that are not in `times`.
    pub enforce_times: bool,
}

impl Default for InstabookConfig {
    fn default() -> Self {
        Self {
            times: vec![15, 30],
            enforce_times: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrontendConfig {
    /// Page served verbatim at `/`.
    pub index_path: PathBuf,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("templates/index.html"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ObservabilityConfig {
    /// Prometheus listener address. `None` disables the exporter.
    pub metrics_address: Option<String>,
}
