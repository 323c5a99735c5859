// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user bounded list of recently viewed documents.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use quire_core::{ContentId, QuireError, RelationalStore};
use tracing::debug;

/// Maximum length of a user's recency list.
pub const RECENTLY_VIEWED_LIMIT: usize = 5;

pub struct RecentlyViewedTracker {
    relational: Arc<dyn RelationalStore>,
}

impl RecentlyViewedTracker {
    pub fn new(relational: Arc<dyn RelationalStore>) -> Self {
        Self { relational }
    }

    /// Records that `email` viewed `id`.
    ///
    /// The new view is prepended to the stored list and the list is cut to
    /// [`RECENTLY_VIEWED_LIMIT`]. Repeat views are not deduplicated before
    /// the cut, so re-viewing a listed document can shorten the list.
    pub async fn record_view(&self, email: &str, id: &ContentId) -> Result<(), QuireError> {
        let user = self.relational.find_or_create_user(email).await?;
        let document = self
            .relational
            .get_document(id)
            .await?
            .ok_or_else(|| QuireError::NotFound(format!("document {id}")))?;

        let current = self.relational.recently_viewed(user.id).await?;
        let candidates =
            std::iter::once(document.id).chain(current.iter().map(|entry| entry.document_id));

        let mut kept = Vec::with_capacity(RECENTLY_VIEWED_LIMIT);
        for doc_id in candidates {
            if kept.len() == RECENTLY_VIEWED_LIMIT {
                break;
            }
            if self.relational.get_document_by_id(doc_id).await?.is_some() {
                kept.push(doc_id);
            } else {
                debug!(user = %email, doc_id, "recently viewed entry dropped, document no longer exists");
            }
        }

        self.relational
            .replace_recently_viewed(user.id, &kept)
            .await?;
        let viewed_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.relational
            .touch_recently_viewed(user.id, document.id, &viewed_at)
            .await?;

        debug!(user = %email, doc_id = %id, entries = kept.len(), "recently viewed updated");
        Ok(())
    }
}
