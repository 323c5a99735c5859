// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use quire_config::model::ServerConfig;
use quire_core::QuireError;
use quire_review::DocumentService;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, admin_middleware, identity_middleware, proxy_auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<DocumentService>,
}

/// Builds the application router.
///
/// - GET /health (public)
/// - GET, PATCH /api/v1/documents/{id} (proxy token, then caller identity)
/// - POST /api/v1/make-admin (as above, then the admin role)
pub fn router(state: GatewayState, auth: AuthConfig) -> Router {
    let public_routes = Router::new().route("/health", get(handlers::get_health));

    let admin_routes = Router::new()
        .route("/api/v1/make-admin", post(handlers::make_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ));

    let api_routes = Router::new()
        .route(
            "/api/v1/documents/{id}",
            get(handlers::get_document).patch(handlers::patch_document),
        )
        .merge(admin_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            auth.clone(),
            identity_middleware,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            auth,
            proxy_auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}

/// Serves the gateway until `cancel` fires, then drains in-flight requests.
pub async fn serve(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), QuireError> {
    let app = router(state, AuthConfig::from_config(config)?);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| QuireError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!(%addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| QuireError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
