// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Quire document review service.
//!
//! This crate provides the error type, domain types and adapter traits
//! shared by the stores, the review handler, the notifier and the
//! reminder scheduler.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, QuireError};
pub use types::{AdapterType, CallerIdentity, ContentId, DocumentStatus, HealthStatus};

// Re-export all adapter traits at crate root.
pub use traits::{
    Clock, IndexStore, NotificationChannel, OutboxStore, PluginAdapter, RelationalStore,
    SystemClock,
};
