// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification channel trait (email, chat webhook, log).

use async_trait::async_trait;

use crate::error::QuireError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelKind, ReviewNotification};

/// Delivers a typed review notification to one or more recipients.
#[async_trait]
pub trait NotificationChannel: PluginAdapter {
    /// Whether the channel takes one recipient per send or all at once.
    fn kind(&self) -> ChannelKind;

    async fn send(
        &self,
        recipients: &[String],
        notification: &ReviewNotification,
    ) -> Result<(), QuireError>;
}
