// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all store and channel adapters implement.

use async_trait::async_trait;

use crate::error::QuireError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Quire adapters.
///
/// Every adapter (index store, relational store, notification channel) must
/// implement this trait, which provides identity, lifecycle, and health
/// check capabilities.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the type of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, QuireError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), QuireError>;
}
