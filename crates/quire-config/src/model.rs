// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Quire review service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Quire configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuireConfig {
    /// HTTP listener and request identity settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Relational store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Index store settings.
    #[serde(default)]
    pub index: IndexConfig,

    /// Notification transports and link construction.
    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// Daily review reminder settings.
    #[serde(default)]
    pub reminders: RemindersConfig,

    /// Notification outbox delivery settings.
    #[serde(default)]
    pub outbox: OutboxConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request header carrying the caller identity set by the fronting proxy.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,

    /// Shared secret the fronting proxy presents as a bearer token.
    /// `None` disables the check.
    #[serde(default)]
    pub proxy_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            identity_header: default_identity_header(),
            proxy_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_identity_header() -> String {
    "x-authenticated-user".to_string()
}

/// Relational store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn data_file(name: &str) -> String {
    dirs::data_dir()
        .map(|p| p.join("quire").join(name))
        .unwrap_or_else(|| std::path::PathBuf::from(name))
        .to_string_lossy()
        .into_owned()
}

fn default_database_path() -> String {
    data_file("quire.db")
}

fn default_wal_mode() -> bool {
    true
}

/// Index store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Path to the index SQLite file. Kept separate from the relational store.
    #[serde(default = "default_index_path")]
    pub database_path: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            database_path: default_index_path(),
        }
    }
}

fn default_index_path() -> String {
    data_file("index.db")
}

/// Notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Master switch. When false nothing is enqueued.
    #[serde(default)]
    pub enabled: bool,

    /// Base URL used to build canonical document links.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sender address for email notifications.
    #[serde(default)]
    pub from_address: Option<String>,

    /// SMTP transport. `None` disables the email channel.
    #[serde(default)]
    pub email: Option<EmailConfig>,

    /// Slack incoming webhook. `None` disables the chat channel.
    #[serde(default)]
    pub slack: Option<SlackConfig>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            from_address: None,
            email: None,
            slack: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// SMTP relay settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Upgrade the connection with STARTTLS instead of implicit TLS.
    #[serde(default = "default_starttls")]
    pub starttls: bool,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_starttls() -> bool {
    true
}

/// Slack webhook settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SlackConfig {
    pub webhook_url: String,
}

/// Review reminder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemindersConfig {
    #[serde(default = "default_reminders_enabled")]
    pub enabled: bool,

    /// Local wall-clock time of the daily scan, `HH:MM`.
    #[serde(default = "default_time_of_day")]
    pub time_of_day: String,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: default_reminders_enabled(),
            time_of_day: default_time_of_day(),
        }
    }
}

fn default_reminders_enabled() -> bool {
    true
}

fn default_time_of_day() -> String {
    "10:00".to_string()
}

/// Outbox delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutboxConfig {
    /// Seconds between polls when the outbox is empty.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Delivery attempts before an entry is parked as failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_backoff_secs")]
    pub base_backoff_secs: u64,

    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_attempts: default_max_attempts(),
            base_backoff_secs: default_base_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_backoff_secs() -> u64 {
    30
}

fn default_max_backoff_secs() -> u64 {
    3600
}
