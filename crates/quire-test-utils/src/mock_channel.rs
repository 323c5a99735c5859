// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification channel that records what it was asked to send.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use quire_core::types::{ChannelKind, NotificationTemplate, ReviewNotification};
use quire_core::{AdapterType, HealthStatus, NotificationChannel, PluginAdapter, QuireError};
use tokio::sync::Mutex;

/// One captured `send` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub recipients: Vec<String>,
    pub notification: ReviewNotification,
}

/// A channel that captures sends and can be switched into a failing mode.
pub struct RecordingChannel {
    name: String,
    kind: ChannelKind,
    sent: Mutex<Vec<SentNotification>>,
    failing: AtomicBool,
}

impl RecordingChannel {
    pub fn new(name: &str, kind: ChannelKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// A per-recipient channel named `email`.
    pub fn direct() -> Self {
        Self::new("email", ChannelKind::Direct)
    }

    /// A mention-everyone channel named `slack`.
    pub fn broadcast() -> Self {
        Self::new("slack", ChannelKind::Broadcast)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().await.clone()
    }

    /// Every recipient of every send using `template`, in send order.
    pub async fn recipients_of(&self, template: NotificationTemplate) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|s| s.notification.template == template)
            .flat_map(|s| s.recipients.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl PluginAdapter for RecordingChannel {
    fn name(&self) -> &str {
        &self.name
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
impl NotificationChannel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(
        &self,
        recipients: &[String],
        notification: &ReviewNotification,
    ) -> Result<(), QuireError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(QuireError::channel(format!("{} is down", self.name)));
        }
        self.sent.lock().await.push(SentNotification {
            recipients: recipients.to_vec(),
            notification: notification.clone(),
        });
        Ok(())
    }
}
