// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds review notifications and enqueues them on the outbox.
//!
//! Nothing is delivered here. The outbox dispatcher picks the entries up
//! later, so a transport failure can never fail the request that caused it.

use std::sync::Arc;

use quire_config::model::QuireConfig;
use quire_core::types::{
    ChannelKind, IndexedDocument, NewOutboxEntry, NotificationTemplate, OutboxMessage,
    ReviewNotification,
};
use quire_core::{OutboxStore, QuireError, RelationalStore};
use tracing::{debug, warn};

/// The notifier's view of the `[notifications]` and `[outbox]` settings.
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub enabled: bool,
    pub base_url: String,
    pub max_attempts: u32,
}

impl NotifierSettings {
    pub fn from_config(config: &QuireConfig) -> Self {
        Self {
            enabled: config.notifications.enabled,
            base_url: config.notifications.base_url.clone(),
            max_attempts: config.outbox.max_attempts,
        }
    }
}

/// A delivery channel as the outbox addresses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRoute {
    pub name: String,
    pub kind: ChannelKind,
}

impl ChannelRoute {
    pub fn new(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Canonical link to a document: `<base>/document/<id>`.
pub fn document_url(base_url: &str, id: &str) -> String {
    if let Ok(mut url) = url::Url::parse(base_url) {
        let pushed = match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().push("document").push(id);
                true
            }
            Err(()) => false,
        };
        if pushed {
            return url.to_string();
        }
    }
    format!("{}/document/{id}", base_url.trim_end_matches('/'))
}

/// Fans a notification out over every configured route.
pub struct ReviewNotifier {
    settings: NotifierSettings,
    routes: Vec<ChannelRoute>,
    outbox: Arc<dyn OutboxStore>,
    relational: Arc<dyn RelationalStore>,
}

impl ReviewNotifier {
    pub fn new(
        settings: NotifierSettings,
        routes: Vec<ChannelRoute>,
        outbox: Arc<dyn OutboxStore>,
        relational: Arc<dyn RelationalStore>,
    ) -> Self {
        Self {
            settings,
            routes,
            outbox,
            relational,
        }
    }

    pub fn enabled(&self) -> bool {
        self.settings.enabled
    }

    pub fn routes(&self) -> &[ChannelRoute] {
        &self.routes
    }

    /// Builds the payload shared by every route for one document.
    pub async fn build(
        &self,
        template: NotificationTemplate,
        doc: &IndexedDocument,
    ) -> ReviewNotification {
        let owner = match self.relational.get_user(&doc.owner).await {
            Ok(Some(user)) => user.display().to_string(),
            Ok(None) => doc.owner.clone(),
            Err(e) => {
                warn!(doc_id = %doc.object_id, error = %e, "owner lookup failed, using email");
                doc.owner.clone()
            }
        };
        ReviewNotification {
            template,
            base_url: self.settings.base_url.clone(),
            document_owner: owner,
            document_owner_email: doc.owner.clone(),
            document_type: doc.doc_type.clone(),
            document_short_name: doc.doc_number.clone(),
            document_title: doc.title.clone(),
            document_url: document_url(&self.settings.base_url, &doc.object_id),
            document_product: doc.product.clone(),
            document_team: doc.team.clone(),
        }
    }

    /// Enqueues `template` about `doc` for `recipients`.
    ///
    /// Direct routes get one entry per recipient, broadcast routes one entry
    /// naming everybody. The entries are enqueued all together or not at
    /// all. Returns how many were enqueued; zero when notifications are
    /// disabled or there is nobody to tell.
    pub async fn notify(
        &self,
        template: NotificationTemplate,
        doc: &IndexedDocument,
        recipients: &[String],
    ) -> Result<usize, QuireError> {
        if !self.settings.enabled || recipients.is_empty() {
            return Ok(0);
        }

        let notification = self.build(template, doc).await;
        let mut entries = Vec::new();
        for route in &self.routes {
            let batches: Vec<Vec<String>> = match route.kind {
                ChannelKind::Direct => recipients.iter().map(|r| vec![r.clone()]).collect(),
                ChannelKind::Broadcast => vec![recipients.to_vec()],
            };
            for batch in batches {
                let message = OutboxMessage {
                    recipients: batch,
                    notification: notification.clone(),
                };
                let payload = serde_json::to_string(&message)
                    .map_err(|e| QuireError::Internal(format!("cannot encode notification: {e}")))?;
                entries.push(NewOutboxEntry {
                    channel: route.name.clone(),
                    payload,
                });
            }
        }

        let ids = self
            .outbox
            .enqueue_batch(&entries, self.settings.max_attempts)
            .await?;
        debug!(doc_id = %doc.object_id, entry_ids = ?ids, recipients = recipients.len(), "notifications enqueued");
        Ok(ids.len())
    }
}
