// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller identity and proxy authentication middleware.
//!
//! Quire sits behind an authenticating proxy. The proxy forwards the
//! caller's email in a configurable header and, optionally, proves itself
//! with a shared bearer token. Requests that fail either check never reach
//! a handler. Admin routes additionally require the caller to hold the
//! admin role for anything but reads.

use axum::{
    extract::{Request, State},
    http::{HeaderName, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use quire_config::model::ServerConfig;
use quire_core::{CallerIdentity, ErrorKind, QuireError};

use crate::error::{ApiError, error_response};
use crate::server::GatewayState;

/// Authentication configuration for the gateway.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. `None` disables the proxy check.
    pub proxy_token: Option<String>,
    /// Header carrying the authenticated caller's email.
    pub identity_header: HeaderName,
}

impl AuthConfig {
    pub fn from_config(config: &ServerConfig) -> Result<Self, QuireError> {
        let identity_header = HeaderName::try_from(config.identity_header.as_str())
            .map_err(|e| {
                QuireError::Config(format!(
                    "server.identity_header {:?} is not a valid header name: {e}",
                    config.identity_header
                ))
            })?;
        Ok(Self {
            proxy_token: config.proxy_token.clone(),
            identity_header,
        })
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "proxy_token",
                &self.proxy_token.as_ref().map(|_| "[redacted]"),
            )
            .field("identity_header", &self.identity_header)
            .finish()
    }
}

/// Rejects requests that do not carry the proxy's bearer token.
pub async fn proxy_auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = auth.proxy_token.as_deref() else {
        return next.run(request).await;
    };

    let presented = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if presented == Some(expected) {
        next.run(request).await
    } else {
        tracing::debug!(path = %request.uri().path(), "proxy token missing or wrong");
        error_response(StatusCode::UNAUTHORIZED, "unauthenticated request").into_response()
    }
}

/// Resolves the caller identity header into a [`CallerIdentity`] extension.
pub async fn identity_middleware(
    State(auth): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = request
        .headers()
        .get(&auth.identity_header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| CallerIdentity(v.to_string()));

    match caller {
        Some(caller) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        None => {
            tracing::debug!(
                header = %auth.identity_header,
                path = %request.uri().path(),
                "request without caller identity"
            );
            error_response(StatusCode::UNAUTHORIZED, "missing caller identity").into_response()
        }
    }
}

/// Lets reads through and requires an admin caller for every other method.
///
/// Must run after [`identity_middleware`].
pub async fn admin_middleware(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::GET {
        return next.run(request).await;
    }
    let Some(caller) = request.extensions().get::<CallerIdentity>().cloned() else {
        tracing::error!(
            method = %request.method(),
            path = %request.uri().path(),
            "caller identity not resolved before the admin check"
        );
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response();
    };

    match state.service.roles().require_admin(&caller).await {
        Ok(()) => next.run(request).await,
        Err(e) => {
            if e.kind() == ErrorKind::Internal {
                tracing::error!(caller = %caller, error = %e, "admin check failed");
            } else {
                tracing::warn!(caller = %caller, path = %request.uri().path(), "admin access denied");
            }
            ApiError(e).into_response()
        }
    }
}
