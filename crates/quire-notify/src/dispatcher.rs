// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drains the notification outbox into the configured channels.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use quire_core::types::{OutboxEntry, OutboxFate, OutboxMessage};
use quire_core::{NotificationChannel, OutboxStore, QuireError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::retry::RetryPolicy;

/// Counts from one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub retried: usize,
    pub failed: usize,
}

pub struct OutboxDispatcher {
    outbox: Arc<dyn OutboxStore>,
    channels: HashMap<String, Arc<dyn NotificationChannel>>,
    policy: RetryPolicy,
    poll_interval: Duration,
}

impl OutboxDispatcher {
    pub fn new(
        outbox: Arc<dyn OutboxStore>,
        channels: Vec<Arc<dyn NotificationChannel>>,
        policy: RetryPolicy,
        poll_interval: Duration,
    ) -> Self {
        let channels = channels
            .into_iter()
            .map(|c| (c.name().to_string(), c))
            .collect();
        Self {
            outbox,
            channels,
            policy,
            poll_interval,
        }
    }

    async fn deliver(&self, entry: &OutboxEntry) -> Result<(), QuireError> {
        let channel = self
            .channels
            .get(&entry.channel)
            .ok_or_else(|| QuireError::channel(format!("no channel named {}", entry.channel)))?;
        let message: OutboxMessage = serde_json::from_str(&entry.payload).map_err(|e| {
            QuireError::Channel {
                message: format!("malformed outbox payload {}", entry.id),
                source: Some(Box::new(e)),
            }
        })?;
        channel
            .send(&message.recipients, &message.notification)
            .await
    }

    /// Delivers every entry that is due right now, one at a time.
    ///
    /// Stops early, between entries, when `cancel` fires.
    pub async fn drain_once(&self, cancel: &CancellationToken) -> Result<DrainReport, QuireError> {
        let mut report = DrainReport::default();
        while !cancel.is_cancelled() {
            let Some(entry) = self.outbox.dequeue().await? else {
                break;
            };
            match self.deliver(&entry).await {
                Ok(()) => {
                    self.outbox.ack(entry.id).await?;
                    debug!(entry_id = entry.id, channel = %entry.channel, "outbox entry delivered");
                    report.delivered += 1;
                }
                Err(e) => {
                    let attempts = entry.attempts + 1;
                    let retry_after = self.policy.backoff(attempts);
                    let message = e.to_string();
                    match self.outbox.fail(entry.id, &message, retry_after).await? {
                        OutboxFate::Retry => {
                            warn!(entry_id = entry.id, channel = %entry.channel, attempts, retry_in = ?retry_after, error = %e, "delivery failed, will retry");
                            report.retried += 1;
                        }
                        OutboxFate::Failed => {
                            error!(entry_id = entry.id, channel = %entry.channel, attempts, error = %e, "delivery failed, giving up");
                            report.failed += 1;
                        }
                    }
                }
            }
        }
        Ok(report)
    }

    /// Polls the outbox until `cancel` fires.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(poll_interval = ?self.poll_interval, channels = self.channels.len(), "outbox dispatcher started");
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.drain_once(&cancel).await {
                        error!(error = %e, "outbox drain failed");
                    }
                }
            }
        }
        info!("outbox dispatcher stopped");
    }
}
