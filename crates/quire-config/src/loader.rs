// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./quire.toml` > `~/.config/quire/quire.toml` > `/etc/quire/quire.toml`
//! with environment variable overrides via `QUIRE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::QuireConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/quire/quire.toml";
pub(crate) const LOCAL_CONFIG: &str = "quire.toml";

pub(crate) fn user_config_path() -> std::path::PathBuf {
    dirs::config_dir()
        .map(|d| d.join("quire/quire.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/quire/quire.toml` (system-wide)
/// 3. `~/.config/quire/quire.toml` (user XDG config)
/// 4. `./quire.toml` (local directory)
/// 5. `QUIRE_*` environment variables
pub fn load_config() -> Result<QuireConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<QuireConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QuireConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<QuireConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QuireConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(QuireConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config path.
///
/// Uses explicit section prefixes rather than `Env::split("_")`, so
/// `QUIRE_SERVER_LOG_LEVEL` becomes `server.log_level`, not
/// `server.log.level`. Nested tables come first so `notifications_email_host`
/// is not taken for `notifications.email_host`.
pub fn map_env_key(key: &str) -> String {
    const SECTIONS: &[(&str, &str)] = &[
        ("notifications_email_", "notifications.email."),
        ("notifications_slack_", "notifications.slack."),
        ("notifications_", "notifications."),
        ("server_", "server."),
        ("storage_", "storage."),
        ("index_", "index."),
        ("reminders_", "reminders."),
        ("outbox_", "outbox."),
    ];

    for (prefix, section) in SECTIONS {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{section}{rest}");
        }
    }
    key.to_string()
}

/// Create the environment variable provider.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("QUIRE_").map(|key| map_env_key(key.as_str()).into())
}
