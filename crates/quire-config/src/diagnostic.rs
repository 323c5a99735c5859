// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment errors into miette diagnostics for `quire.toml`.
//!
//! Unknown keys are matched against the keys of their own section, and a
//! key that exists in another quire section (`webhook_url` written under
//! `[notifications]` instead of `[notifications.slack]`) is pointed there.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Every table of `quire.toml` with its keys, in model order.
pub const SECTIONS: &[(&str, &[&str])] = &[
    (
        "",
        &[
            "server",
            "storage",
            "index",
            "notifications",
            "reminders",
            "outbox",
        ],
    ),
    (
        "server",
        &["host", "port", "log_level", "identity_header", "proxy_token"],
    ),
    ("storage", &["database_path", "wal_mode"]),
    ("index", &["database_path"]),
    (
        "notifications",
        &["enabled", "base_url", "from_address", "email", "slack"],
    ),
    (
        "notifications.email",
        &["host", "port", "username", "password", "starttls"],
    ),
    ("notifications.slack", &["webhook_url"]),
    ("reminders", &["enabled", "time_of_day"]),
    (
        "outbox",
        &[
            "poll_interval_secs",
            "max_attempts",
            "base_backoff_secs",
            "max_backoff_secs",
        ],
    ),
];

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(
        code(quire::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), home.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// `[name]` of the table the key appeared in, or `the top level`.
        section: String,
        /// A key of the same table that is spelt similarly.
        suggestion: Option<String>,
        /// Another table that has a key of exactly this name.
        home: Option<String>,
        valid_keys: String,
        #[label("not a key of {section}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid value for `{key}`: {detail}")]
    #[diagnostic(
        code(quire::config::invalid_type),
        help("check `{key}` in quire.toml and the `{env_var}` environment override")
    )]
    InvalidType {
        /// Dotted path of the key.
        key: String,
        detail: String,
        env_var: String,
    },

    #[error("missing required key `{key}` in {section}")]
    #[diagnostic(
        code(quire::config::missing_key),
        help("add `{key} = <value>` under {section}")
    )]
    MissingKey { key: String, section: String },

    /// A value that parsed but is not usable.
    #[error("validation error: {message}")]
    #[diagnostic(code(quire::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(quire::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, home: Option<&str>, valid_keys: &str) -> String {
    match (suggestion, home) {
        (Some(s), _) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        (None, Some(home)) => format!("this key belongs under {home}. Valid keys here: {valid_keys}"),
        (None, None) => format!("valid keys: {valid_keys}"),
    }
}

/// Renders a dotted table path the way it is written in `quire.toml`.
fn section_label(path: &str) -> String {
    if path.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{path}]")
    }
}

/// The environment variable that overrides a dotted key.
pub fn env_var_for(key: &str) -> String {
    format!("QUIRE_{}", key.replace('.', "_").to_uppercase())
}

/// Keys of the quire table at `path`, if it is one.
pub fn section_keys(path: &str) -> Option<&'static [&'static str]> {
    SECTIONS
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(_, keys)| *keys)
}

/// The other table that has a key named exactly `key`, when there is one.
///
/// Keys that several tables share (`enabled`, `port`) are not placed.
pub fn home_section(key: &str, current: &str) -> Option<String> {
    let mut homes = SECTIONS
        .iter()
        .filter(|(name, keys)| *name != current && keys.contains(&key));
    match (homes.next(), homes.next()) {
        (Some((name, _)), None) => Some(section_label(name)),
        _ => None,
    }
}

/// Converts every error inside a figment error into a diagnostic.
///
/// `toml_sources` pairs file paths with their contents so unknown keys can
/// be labelled in place.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path = error
                .path
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(".");
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let valid: Vec<&str> = match section_keys(&path) {
                        Some(keys) => keys.to_vec(),
                        None => expected.to_vec(),
                    };
                    let (span, src) = locate_key(&error, &path, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section: section_label(&path),
                        suggestion: suggest_key(field, &valid),
                        home: home_section(field, &path),
                        valid_keys: valid.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: field.clone().into_owned(),
                    section: section_label(&path),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    env_var: env_var_for(&path),
                    key: path,
                    detail: format!("found {actual}, expected {expected}"),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn locate_key(
    error: &figment::error::Error,
    path: &str,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(figment::Source::File(file)) = error.metadata.as_ref().and_then(|m| m.source.as_ref())
    else {
        return (None, None);
    };
    let file = file.display().to_string();
    toml_sources
        .iter()
        .find(|(p, _)| *p == file)
        .and_then(|(p, content)| {
            let offset = find_key_offset(content, path, field)?;
            Some((
                Some(SourceSpan::new(offset.into(), field.len())),
                Some(NamedSource::new(p, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Byte offset of `field` inside the table `path` (dotted, empty for the
/// top level).
///
/// Lines are read in order while tracking the current `[table]` header, so
/// `[notifications]` and `[notifications.email]` are told apart.
pub fn find_key_offset(content: &str, path: &str, field: &str) -> Option<usize> {
    let mut table = "";
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            table = header.split(']').next().unwrap_or_default().trim();
        } else if table == path
            && let Some((key, _)) = trimmed.split_once('=')
            && key.trim() == field
        {
            return Some(offset + line.len() - trimmed.len());
        }
        offset += line.len();
    }
    None
}

/// The valid key closest to `unknown` by Jaro-Winkler, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Renders diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}
