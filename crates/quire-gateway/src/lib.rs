// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Quire review service.
//!
//! Exposes the document read and patch endpoints behind the fronting
//! proxy's identity header, an admin-only role grant, plus an
//! unauthenticated health check.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use error::{ApiError, ErrorResponse};
pub use server::{GatewayState, router, serve};
