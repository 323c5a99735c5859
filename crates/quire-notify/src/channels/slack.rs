// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack incoming-webhook channel.

use std::time::Duration;

use async_trait::async_trait;
use quire_config::model::SlackConfig;
use quire_core::types::{ChannelKind, ReviewNotification};
use quire_core::{AdapterType, HealthStatus, NotificationChannel, PluginAdapter, QuireError};
use serde::Serialize;
use tracing::debug;

use crate::templates::render_chat;

#[derive(Serialize)]
struct WebhookBody<'a> {
    text: &'a str,
}

/// Posts one message per notification, mentioning every recipient.
pub struct SlackWebhookChannel {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackWebhookChannel {
    pub fn new(config: &SlackConfig) -> Result<Self, QuireError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| QuireError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SlackWebhookChannel {
    fn name(&self) -> &str {
        "slack"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, QuireError> {
        // Webhooks have no side-effect free probe.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QuireError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for SlackWebhookChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Broadcast
    }

    async fn send(
        &self,
        recipients: &[String],
        notification: &ReviewNotification,
    ) -> Result<(), QuireError> {
        let text = render_chat(notification, recipients);
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookBody { text: &text })
            .send()
            .await
            .map_err(|e| QuireError::Channel {
                message: format!("webhook request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuireError::channel(format!(
                "webhook returned {status}: {body}"
            )));
        }
        debug!(recipients = recipients.len(), "slack message posted");
        Ok(())
    }
}
