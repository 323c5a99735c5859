// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable notification outbox.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::QuireError;
use crate::types::{NewOutboxEntry, OutboxEntry, OutboxFate};

/// Persistent queue of notifications awaiting delivery.
#[async_trait]
pub trait OutboxStore: Send + Sync + 'static {
    /// Adds an entry addressed to the named channel. Returns its id.
    async fn enqueue(
        &self,
        channel: &str,
        payload: &str,
        max_attempts: u32,
    ) -> Result<i64, QuireError>;

    /// Adds every entry in one transaction, or none of them. Returns their
    /// ids in order.
    async fn enqueue_batch(
        &self,
        entries: &[NewOutboxEntry],
        max_attempts: u32,
    ) -> Result<Vec<i64>, QuireError>;

    /// Claims the oldest entry that is due, if any.
    async fn dequeue(&self) -> Result<Option<OutboxEntry>, QuireError>;

    /// Marks an entry delivered.
    async fn ack(&self, id: i64) -> Result<(), QuireError>;

    /// Records a failed delivery, rescheduling the entry `retry_after` from
    /// now unless its attempts are exhausted.
    async fn fail(
        &self,
        id: i64,
        error: &str,
        retry_after: Duration,
    ) -> Result<OutboxFate, QuireError>;
}
