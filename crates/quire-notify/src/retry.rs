// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff for failed outbox deliveries.

use std::time::Duration;

use quire_config::model::OutboxConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &OutboxConfig) -> Self {
        Self {
            base: Duration::from_secs(config.base_backoff_secs),
            max: Duration::from_secs(config.max_backoff_secs),
        }
    }

    /// Delay before the next try, given how many attempts have now failed.
    ///
    /// `min(base * 2^(attempts - 1), max)`; saturates instead of overflowing.
    pub fn backoff(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |d| d.min(self.max))
    }
}
