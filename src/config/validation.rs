//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (the loader handles parsing)
//! - Live mode must carry the credentials the Outlook provider needs
//! - Validate value ranges (refresh > 0, booking lengths > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Polling values are frontend hints and are not checked

use std::net::SocketAddr;

use chrono_tz::Tz;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),

    #[error("instabook length must be positive, got {0}")]
    NonPositiveInstabookTime(u32),

    #[error("OUTLOOK_REFRESH_TIME must be positive")]
    ZeroRefreshTime,

    #[error("{0} is required when OUTLOOK_DOMAIN is set")]
    MissingLiveSetting(&'static str),

    #[error("OUTLOOK_ROOM_DICT or OUTLOOK_ROOM_SEARCH_TERM is required when OUTLOOK_DOMAIN is set")]
    MissingRoomDirectory,

    #[error("invalid METRICS_ADDRESS {0:?}")]
    InvalidMetricsAddress(String),
}

/// Check a loaded configuration, collecting every error found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.outlook.timezone_name.parse::<Tz>().is_err() {
        errors.push(ValidationError::UnknownTimezone(
            config.outlook.timezone_name.clone(),
        ));
    }

    for &time in &config.instabook.times {
        if time == 0 {
            errors.push(ValidationError::NonPositiveInstabookTime(time));
        }
    }

    if !config.demo_mode {
        let outlook = &config.outlook;
        if outlook.refresh_time_seconds == 0 {
            errors.push(ValidationError::ZeroRefreshTime);
        }
        let required = [
            ("OUTLOOK_EWS_URL", &outlook.ews_url),
            ("OUTLOOK_USERNAME", &outlook.username),
            ("OUTLOOK_PASSWORD", &outlook.password),
        ];
        for (key, value) in required {
            if value.is_none() {
                errors.push(ValidationError::MissingLiveSetting(key));
            }
        }
        if outlook.room_dict.is_none() && outlook.room_search_term.is_none() {
            errors.push(ValidationError::MissingRoomDirectory);
        }
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let mut config = AppConfig::default();
        config.demo_mode = true;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.demo_mode = true;
        config.outlook.timezone_name = "Mars/Olympus_Mons".to_string();
        config.instabook.times = vec![15, 0];
        config.observability.metrics_address = Some("nowhere".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::NonPositiveInstabookTime(0)));
    }

    #[test]
    fn test_live_mode_requires_credentials() {
        let mut config = AppConfig::default();
        config.demo_mode = false;
        config.outlook.domain = Some("CORP".to_string());
        config.outlook.refresh_time_seconds = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroRefreshTime));
        assert!(errors.contains(&ValidationError::MissingLiveSetting("OUTLOOK_EWS_URL")));
        assert!(errors.contains(&ValidationError::MissingLiveSetting("OUTLOOK_PASSWORD")));
        assert!(errors.contains(&ValidationError::MissingRoomDirectory));
    }

    #[test]
    fn test_demo_mode_ignores_missing_credentials() {
        let mut config = AppConfig::default();
        config.demo_mode = true;
        config.outlook.domain = Some("CORP".to_string());
        config.outlook.refresh_time_seconds = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_must_parse() {
        let mut config = AppConfig::default();
        config.demo_mode = true;
        config.observability.metrics_address = Some("localhost".to_string());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidMetricsAddress("localhost".to_string())])
        );
    }
}
