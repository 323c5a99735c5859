// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read and mutation entry points used by the HTTP gateway.

use std::sync::Arc;

use quire_core::types::{IndexedDocument, NotificationTemplate};
use quire_core::{CallerIdentity, ContentId, IndexStore, QuireError, RelationalStore};
use serde::Serialize;
use tracing::{error, warn};

use crate::lock::LockGate;
use crate::notifier::ReviewNotifier;
use crate::patch::PatchApplier;
use crate::recency::RecentlyViewedTracker;
use crate::roles::RoleGate;

/// A document as returned by the read endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: IndexedDocument,
    /// Taken from the relational store only.
    pub locked: bool,
}

pub struct DocumentService {
    index: Arc<dyn IndexStore>,
    relational: Arc<dyn RelationalStore>,
    applier: PatchApplier,
    notifier: Arc<ReviewNotifier>,
    tracker: RecentlyViewedTracker,
    roles: RoleGate,
}

impl DocumentService {
    pub fn new(
        index: Arc<dyn IndexStore>,
        relational: Arc<dyn RelationalStore>,
        lock_gate: LockGate,
        notifier: Arc<ReviewNotifier>,
    ) -> Self {
        Self {
            applier: PatchApplier::new(index.clone(), relational.clone(), lock_gate),
            tracker: RecentlyViewedTracker::new(relational.clone()),
            roles: RoleGate::new(relational.clone()),
            index,
            relational,
            notifier,
        }
    }

    pub fn roles(&self) -> &RoleGate {
        &self.roles
    }

    /// Loads a document for display.
    ///
    /// With `track_view` set the view is added to the caller's recency list.
    /// Tracking failures are logged and never affect the response.
    pub async fn get_document(
        &self,
        caller: &CallerIdentity,
        id: &ContentId,
        track_view: bool,
    ) -> Result<DocumentView, QuireError> {
        let loaded = self
            .index
            .get(id)
            .await?
            .ok_or_else(|| QuireError::NotFound(format!("document {id}")))?;
        let locked = self.relational.is_locked(id).await?.unwrap_or(false);

        if track_view
            && let Err(e) = self.tracker.record_view(caller.as_str(), id).await
        {
            warn!(doc_id = %id, caller = %caller, error = %e, "recently viewed tracking failed");
        }

        Ok(DocumentView {
            document: loaded.document,
            locked,
        })
    }

    /// Applies a patch and enqueues review requests for added reviewers.
    ///
    /// Once both stores have committed the call succeeds, even if the
    /// notifications cannot be enqueued.
    pub async fn patch_document(
        &self,
        caller: &CallerIdentity,
        id: &ContentId,
        body: &[u8],
    ) -> Result<(), QuireError> {
        let outcome = self.applier.apply(caller, id, body).await?;
        if outcome.notify.is_empty() {
            return Ok(());
        }
        if let Err(e) = self
            .notifier
            .notify(
                NotificationTemplate::ReviewRequested,
                &outcome.document,
                &outcome.notify,
            )
            .await
        {
            error!(doc_id = %id, error = %e, "review request notifications not enqueued");
        }
        Ok(())
    }
}
