// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification transports.

pub mod email;
pub mod log;
pub mod slack;

use std::sync::Arc;

use quire_config::model::NotificationsConfig;
use quire_core::{NotificationChannel, QuireError};
use tracing::info;

pub use email::EmailChannel;
pub use log::LogChannel;
pub use slack::SlackWebhookChannel;

/// Builds the channels named in `[notifications]`.
///
/// Falls back to the log channel when neither email nor Slack is configured.
pub fn build_channels(
    config: &NotificationsConfig,
) -> Result<Vec<Arc<dyn NotificationChannel>>, QuireError> {
    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();

    if let Some(email) = &config.email {
        let from = config.from_address.as_deref().ok_or_else(|| {
            QuireError::Config("notifications.from_address is required for email".into())
        })?;
        channels.push(Arc::new(EmailChannel::new(email, from)?));
    }
    if let Some(slack) = &config.slack {
        channels.push(Arc::new(SlackWebhookChannel::new(slack)?));
    }
    if channels.is_empty() {
        channels.push(Arc::new(LogChannel));
    }

    for channel in &channels {
        info!(channel = channel.name(), kind = %channel.kind(), "notification channel ready");
    }
    Ok(channels)
}
