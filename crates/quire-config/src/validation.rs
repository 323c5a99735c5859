// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as bind addresses, non-empty paths, the reminder time and the link base URL.

use crate::diagnostic::ConfigError;
use crate::model::QuireConfig;

/// Parses an `HH:MM` wall-clock time.
pub fn parse_time_of_day(value: &str) -> Option<chrono::NaiveTime> {
    chrono::NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &QuireConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.server.identity_header.trim().is_empty() {
        fail("server.identity_header must not be empty".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.index.database_path.trim().is_empty() {
        fail("index.database_path must not be empty".to_string());
    } else if config.index.database_path.trim() == config.storage.database_path.trim() {
        fail("index.database_path must differ from storage.database_path".to_string());
    }

    if parse_time_of_day(&config.reminders.time_of_day).is_none() {
        fail(format!(
            "reminders.time_of_day `{}` is not a valid HH:MM time",
            config.reminders.time_of_day
        ));
    }

    match url::Url::parse(&config.notifications.base_url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {}
        _ => fail(format!(
            "notifications.base_url `{}` must be an absolute http(s) URL",
            config.notifications.base_url
        )),
    }

    if let Some(slack) = &config.notifications.slack
        && url::Url::parse(&slack.webhook_url).is_err()
    {
        fail(format!(
            "notifications.slack.webhook_url `{}` is not a valid URL",
            slack.webhook_url
        ));
    }

    if let Some(email) = &config.notifications.email {
        if email.host.trim().is_empty() {
            fail("notifications.email.host must not be empty".to_string());
        }
        if config.notifications.enabled
            && config
                .notifications
                .from_address
                .as_deref()
                .is_none_or(|a| a.trim().is_empty())
        {
            fail(
                "notifications.from_address is required when the email channel is enabled"
                    .to_string(),
            );
        }
    }

    if config.outbox.max_attempts < 1 {
        fail("outbox.max_attempts must be at least 1, got 0".to_string());
    }

    if config.outbox.poll_interval_secs == 0 {
        fail("outbox.poll_interval_secs must be at least 1, got 0".to_string());
    }

    if config.outbox.base_backoff_secs > config.outbox.max_backoff_secs {
        fail(format!(
            "outbox.base_backoff_secs ({}) must not exceed outbox.max_backoff_secs ({})",
            config.outbox.base_backoff_secs, config.outbox.max_backoff_secs
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
