// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel that records notifications in the log instead of delivering them.

use async_trait::async_trait;
use quire_core::types::{ChannelKind, ReviewNotification};
use quire_core::{AdapterType, HealthStatus, NotificationChannel, PluginAdapter, QuireError};
use tracing::info;

use crate::templates::render_email;

/// Used when no transport is configured, so outbox entries still drain.
#[derive(Debug, Default)]
pub struct LogChannel;

#[async_trait]
impl PluginAdapter for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, QuireError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QuireError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for LogChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Direct
    }

    async fn send(
        &self,
        recipients: &[String],
        notification: &ReviewNotification,
    ) -> Result<(), QuireError> {
        let rendered = render_email(notification);
        for recipient in recipients {
            info!(
                recipient = %recipient,
                template = %notification.template,
                subject = %rendered.subject,
                url = %notification.document_url,
                "notification (log channel)"
            );
        }
        Ok(())
    }
}
