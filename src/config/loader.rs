//! Configuration loading from the process environment.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("OUTLOOK_ROOM_DICT is not a JSON object of strings: {0}")]
    RoomDirectory(#[from] serde_json::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from the process environment.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    load_from(|key| std::env::var(key).ok())
}

/// Load and validate configuration using `lookup` to resolve variables.
pub fn load_from<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = Env { lookup };
    let mut config = AppConfig::default();

    if let Some(host) = env.scalar("HOST") {
        config.server.host = host;
    }
    if let Some(port) = env.parsed("PORT")? {
        config.server.port = port;
    }

    let outlook = &mut config.outlook;
    outlook.domain = env.scalar("OUTLOOK_DOMAIN");
    outlook.ews_url = env.scalar("OUTLOOK_EWS_URL");
    outlook.username = env.scalar("OUTLOOK_USERNAME");
    outlook.password = env.scalar("OUTLOOK_PASSWORD");
    outlook.room_search_term = env.scalar("OUTLOOK_ROOM_SEARCH_TERM");
    if let Some(tz) = env.scalar("OUTLOOK_TIMEZONE_NAME") {
        outlook.timezone_name = tz;
    }

    let demo_flag = env
        .scalar("DEMO_MODE")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    config.demo_mode = demo_flag || config.outlook.domain.is_none();

    // Settings only the Outlook backend reads; demo mode never rejects them.
    if !config.demo_mode {
        let outlook = &mut config.outlook;
        outlook.room_dict = env
            .scalar("OUTLOOK_ROOM_DICT")
            .map(|raw| serde_json::from_str::<BTreeMap<String, String>>(&raw))
            .transpose()?;
        if let Some(refresh) = env.parsed("OUTLOOK_REFRESH_TIME")? {
            outlook.refresh_time_seconds = refresh;
        }
    }

    if let Some(ips) = env.list("ALLOWED_IPS") {
        config.security.allowed_ips = ips;
    }
    if let Some(trust) = env.flag("TRUST_FORWARDED_FOR")? {
        config.security.trust_forwarded_for = trust;
    }

    if let Some(interval) = env.parsed("POLL_INTERVAL")? {
        config.polling.interval = interval;
    }
    if let Some(start) = env.parsed("POLL_START_MINUTE")? {
        config.polling.start_minute = start;
    }
    if let Some(end) = env.parsed("POLL_END_MINUTE")? {
        config.polling.end_minute = end;
    }

    if let Some(times) = env.list("INSTABOOK_TIMES") {
        config.instabook.times = times
            .iter()
            .map(|t| parse_value("INSTABOOK_TIMES", t))
            .collect::<Result<_, _>>()?;
    }
    if let Some(enforce) = env.flag("INSTABOOK_ENFORCE_TIMES")? {
        config.instabook.enforce_times = enforce;
    }

    if let Some(path) = env.scalar("INDEX_PATH") {
        config.frontend.index_path = PathBuf::from(path);
    }
    config.observability.metrics_address = env.scalar("METRICS_ADDRESS");

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// A set-but-empty scalar counts as unset.
    fn scalar(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.scalar(key)
            .map(|raw| parse_value(key, &raw))
            .transpose()
    }

    fn flag(&self, key: &'static str) -> Result<Option<bool>, ConfigError> {
        let Some(raw) = self.scalar(key) else {
            return Ok(None);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key,
                value: raw,
                reason: "expected true or false".to_string(),
            }),
        }
    }

    /// Comma separated list. Set-but-empty yields an empty list.
    fn list(&self, key: &str) -> Option<Vec<String>> {
        (self.lookup)(key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
