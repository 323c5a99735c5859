// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP email channel.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use quire_config::model::EmailConfig;
use quire_core::types::{ChannelKind, ReviewNotification};
use quire_core::{AdapterType, HealthStatus, NotificationChannel, PluginAdapter, QuireError};
use tracing::debug;

use crate::templates::render_email;

/// Sends one email per recipient through an SMTP relay.
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailChannel {
    pub fn new(config: &EmailConfig, from_address: &str) -> Result<Self, QuireError> {
        let from: Mailbox = from_address
            .parse()
            .map_err(|e| QuireError::Config(format!("invalid from_address {from_address:?}: {e}")))?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(|e| {
                QuireError::Config(format!("invalid SMTP host {:?}: {e}", config.host))
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        let mut builder = builder.port(config.port);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Builds the message for one recipient.
    pub fn build_message(
        &self,
        recipient: &str,
        notification: &ReviewNotification,
    ) -> Result<Message, QuireError> {
        let to: Mailbox = recipient.parse().map_err(|e| QuireError::Channel {
            message: format!("invalid recipient address {recipient:?}"),
            source: Some(Box::new(e)),
        })?;
        let rendered = render_email(notification);
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(rendered.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(rendered.body)
            .map_err(|e| QuireError::Channel {
                message: "cannot build email".to_string(),
                source: Some(Box::new(e)),
            })
    }
}

#[async_trait]
impl PluginAdapter for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, QuireError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(HealthStatus::Healthy),
            Ok(false) => Ok(HealthStatus::Degraded("SMTP relay refused NOOP".into())),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), QuireError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Direct
    }

    async fn send(
        &self,
        recipients: &[String],
        notification: &ReviewNotification,
    ) -> Result<(), QuireError> {
        for recipient in recipients {
            let message = self.build_message(recipient, notification)?;
            self.transport
                .send(message)
                .await
                .map_err(|e| QuireError::Channel {
                    message: format!("SMTP delivery to {recipient} failed"),
                    source: Some(Box::new(e)),
                })?;
            debug!(recipient = %recipient, "review email sent");
        }
        Ok(())
    }
}
