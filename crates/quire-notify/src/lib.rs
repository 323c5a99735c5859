// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification delivery for the Quire review service.
//!
//! Review requests and reminders are enqueued on the relational store's
//! outbox; the [`OutboxDispatcher`] drains it into email, Slack or the log,
//! rescheduling failed deliveries with exponential backoff.

pub mod channels;
pub mod dispatcher;
pub mod retry;
pub mod templates;

pub use channels::{EmailChannel, LogChannel, SlackWebhookChannel, build_channels};
pub use dispatcher::{DrainReport, OutboxDispatcher};
pub use retry::RetryPolicy;
