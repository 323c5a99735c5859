// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the stores and channels Quire talks to.
//!
//! Store and channel adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod clock;
pub mod index;
pub mod outbox;
pub mod relational;

pub use adapter::PluginAdapter;
pub use channel::NotificationChannel;
pub use clock::{Clock, SystemClock};
pub use index::IndexStore;
pub use outbox::OutboxStore;
pub use relational::RelationalStore;
