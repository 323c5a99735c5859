// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`QuireError`] to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quire_core::{ErrorKind, QuireError};
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Short human-readable reason.
    pub error: String,
}

pub(crate) fn error_response(status: StatusCode, reason: impl Into<String>) -> impl IntoResponse {
    (
        status,
        Json(ErrorResponse {
            error: reason.into(),
        }),
    )
}

/// Status code for each caller-facing error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Locked => StatusCode::LOCKED,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A handler failure. Internal errors are reported to the caller without
/// their source; the handler logs the full error.
#[derive(Debug)]
pub struct ApiError(pub QuireError);

impl From<QuireError> for ApiError {
    fn from(e: QuireError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let reason = match kind {
            ErrorKind::Internal => "internal error".to_string(),
            _ => self.0.to_string(),
        };
        error_response(status_for(kind), reason).into_response()
    }
}
