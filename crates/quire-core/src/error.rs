// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Quire review service.

use thiserror::Error;

/// The primary error type used across all Quire adapter traits and core operations.
#[derive(Debug, Error)]
pub enum QuireError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Relational store errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Index store errors (read, durable save, filter query).
    #[error("index error: {message}")]
    Index {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Notification channel errors (transport failure, rejected recipient).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The document or user could not be resolved.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller is not allowed to mutate the document.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is known but lacks the role the operation needs.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The document is flagged as non-editable.
    #[error("locked: {0}")]
    Locked(String),

    /// A patch carried a disallowed or malformed field.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The index store rejected a write because the document moved on since it was read.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Caller-facing classification of a [`QuireError`].
///
/// Everything that is not one of the terminal caller conditions collapses
/// into [`ErrorKind::Internal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Forbidden,
    Locked,
    BadRequest,
    Conflict,
    Internal,
}

impl QuireError {
    /// Classifies the error for the caller-visible taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuireError::NotFound(_) => ErrorKind::NotFound,
            QuireError::Unauthorized(_) => ErrorKind::Unauthorized,
            QuireError::Forbidden(_) => ErrorKind::Forbidden,
            QuireError::Locked(_) => ErrorKind::Locked,
            QuireError::BadRequest(_) => ErrorKind::BadRequest,
            QuireError::Conflict(_) => ErrorKind::Conflict,
            QuireError::Config(_)
            | QuireError::Storage { .. }
            | QuireError::Index { .. }
            | QuireError::Channel { .. }
            | QuireError::Timeout { .. }
            | QuireError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for an index error without an underlying source.
    pub fn index(message: impl Into<String>) -> Self {
        QuireError::Index {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a channel error without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        QuireError::Channel {
            message: message.into(),
            source: None,
        }
    }
}
