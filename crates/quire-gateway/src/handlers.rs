// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the document API.
//!
//! Handles GET and PATCH /api/v1/documents/{id}, POST /api/v1/make-admin
//! and GET /health.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use quire_core::{CallerIdentity, ContentId, ErrorKind, QuireError};
use quire_review::DocumentView;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Request header marking a read as a user viewing the document.
pub const TRACK_VIEW_HEADER: &str = "add-to-recently-viewed";

fn rejected(op: &'static str, id: &ContentId, caller: &CallerIdentity, e: QuireError) -> ApiError {
    match e.kind() {
        ErrorKind::Internal => error!(op, doc_id = %id, caller = %caller, error = %e, "request failed"),
        ErrorKind::NotFound | ErrorKind::BadRequest => {
            debug!(op, doc_id = %id, caller = %caller, error = %e, "request rejected")
        }
        _ => warn!(op, doc_id = %id, caller = %caller, error = %e, "request rejected"),
    }
    ApiError(e)
}

/// GET /api/v1/documents/{id}
///
/// Returns the document with its lock flag. A non-empty
/// `Add-To-Recently-Viewed` header records the read in the caller's
/// recently viewed list.
pub async fn get_document(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DocumentView>, ApiError> {
    let id = ContentId(id);
    let track_view = headers
        .get(TRACK_VIEW_HEADER)
        .is_some_and(|v| !v.is_empty());

    match state.service.get_document(&caller, &id, track_view).await {
        Ok(view) => {
            debug!(doc_id = %id, caller = %caller, track_view, "document read");
            Ok(Json(view))
        }
        Err(e) => Err(rejected("get", &id, &caller, e)),
    }
}

/// PATCH /api/v1/documents/{id}
///
/// Applies a partial update. Responds 200 with no body once both stores
/// have committed.
pub async fn patch_document(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let id = ContentId(id);
    match state.service.patch_document(&caller, &id, &body).await {
        Ok(()) => {
            debug!(doc_id = %id, caller = %caller, "patch request served");
            Ok(StatusCode::OK)
        }
        Err(e) => Err(rejected("patch", &id, &caller, e)),
    }
}

/// Body of a make-admin request.
#[derive(Debug, Deserialize)]
pub struct MakeAdminRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/v1/make-admin
///
/// Gives an existing user the admin role. The caller's own role is checked
/// by the admin middleware.
pub async fn make_admin(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let request: MakeAdminRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(caller = %caller, error = %e, "make-admin request rejected");
        ApiError(QuireError::BadRequest(format!("malformed request body: {e}")))
    })?;

    match state.service.roles().grant_admin(&request.email).await {
        Ok(()) => {
            info!(caller = %caller, user = %request.email, "admin role granted");
            Ok(Json(MessageResponse {
                message: "User is now an admin".to_string(),
            }))
        }
        Err(e) => {
            match e.kind() {
                ErrorKind::Internal => {
                    error!(caller = %caller, user = %request.email, error = %e, "make-admin failed")
                }
                _ => debug!(caller = %caller, user = %request.email, error = %e, "make-admin rejected"),
            }
            Err(ApiError(e))
        }
    }
}

/// GET /health
pub async fn get_health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use quire_test_utils::{TestHarness, document};
    use tower::ServiceExt;

    use crate::auth::AuthConfig;
    use crate::server::router;

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn internal_failures_are_logged_with_context() {
        let h = TestHarness::builder().build().await.unwrap();
        h.seed(&document("d1", "RFC", "Draft")).await.unwrap();
        h.relational.fail_upserts(true);

        let app = router(
            GatewayState {
                service: h.service.clone(),
            },
            AuthConfig::from_config(&Default::default()).unwrap(),
        );
        let req = Request::builder()
            .method(Method::PATCH)
            .uri("/api/v1/documents/d1")
            .header("x-authenticated-user", "o@x")
            .body(Body::from(r#"{"title":"x"}"#))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(logs_contain("request failed"));
        assert!(logs_contain("doc_id=d1"));
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(get_health().await, "OK");
    }
}
