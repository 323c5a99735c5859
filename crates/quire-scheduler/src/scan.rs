// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One pass over the documents that are in review.

use std::sync::Arc;

use quire_core::types::{IndexQuery, NotificationTemplate};
use quire_core::{IndexStore, QuireError};
use quire_review::{ReviewNotifier, pending_reviewers};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Index status string of documents awaiting review.
pub const IN_REVIEW: &str = "In-Review";

/// What one reminder scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Documents returned by the in-review query.
    pub documents: usize,
    /// Documents with at least one reviewer still to respond.
    pub reminded: usize,
    /// Outbox entries enqueued.
    pub enqueued: usize,
    /// Documents skipped because of an error.
    pub failed: usize,
    /// Set when cancellation cut the scan short.
    pub cancelled: bool,
}

pub struct ReminderScan {
    index: Arc<dyn IndexStore>,
    notifier: Arc<ReviewNotifier>,
}

impl ReminderScan {
    pub fn new(index: Arc<dyn IndexStore>, notifier: Arc<ReviewNotifier>) -> Self {
        Self { index, notifier }
    }

    /// Reminds every pending reviewer of every in-review document.
    ///
    /// A document that fails is logged and skipped. Only the initial query
    /// failing fails the scan.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<ScanReport, QuireError> {
        let hits = self.index.search(&IndexQuery::status(IN_REVIEW)).await?;
        let mut report = ScanReport {
            documents: hits.len(),
            ..ScanReport::default()
        };

        for (done, hit) in hits.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                info!(remaining = hits.len() - done, "reminder scan cancelled");
                break;
            }
            let doc = match hit.decode() {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(doc_id = %hit.object_id, error = %e, "skipping malformed document");
                    report.failed += 1;
                    continue;
                }
            };
            let pending = pending_reviewers(&doc.reviewers, &doc.reviewed_by);
            if pending.is_empty() {
                debug!(doc_id = %doc.object_id, "all reviewers have responded");
                continue;
            }
            match self
                .notifier
                .notify(NotificationTemplate::ReviewReminder, &doc, &pending)
                .await
            {
                Ok(n) => {
                    debug!(doc_id = %doc.object_id, reviewers = pending.len(), entries = n, "reminders enqueued");
                    report.reminded += 1;
                    report.enqueued += n;
                }
                Err(e) => {
                    warn!(doc_id = %doc.object_id, error = %e, "reminder enqueue failed");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::types::OutboxMessage;
    use quire_core::OutboxStore;
    use quire_test_utils::{TestHarness, document};

    fn scan(h: &TestHarness) -> ReminderScan {
        ReminderScan::new(h.index.clone(), h.notifier.clone())
    }

    async fn reminded(h: &TestHarness) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(entry) = h.storage.dequeue().await.unwrap() {
            if entry.channel == "email" {
                let m: OutboxMessage = serde_json::from_str(&entry.payload).unwrap();
                assert_eq!(m.notification.template, NotificationTemplate::ReviewReminder);
                out.extend(m.recipients);
            }
            h.storage.ack(entry.id).await.unwrap();
        }
        out
    }

    #[tokio::test]
    async fn reminds_reviewers_who_have_not_reviewed() {
        let h = TestHarness::builder().build().await.unwrap();
        let mut doc = document("d1", "RFC", "In-Review");
        doc.reviewers = vec!["a@x".into(), "b@x".into(), "c@x".into()];
        doc.reviewed_by = vec!["a@x".into()];
        h.seed(&doc).await.unwrap();

        let mut draft = document("d2", "RFC", "Draft");
        draft.reviewers = vec!["z@x".into()];
        h.seed(&draft).await.unwrap();

        let report = scan(&h).run(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.reminded, 1);
        assert_eq!(report.enqueued, 3);
        assert_eq!(reminded(&h).await, vec!["b@x", "c@x"]);
    }

    #[tokio::test]
    async fn fully_reviewed_documents_are_left_alone() {
        let h = TestHarness::builder().build().await.unwrap();
        let mut doc = document("d1", "RFC", "In-Review");
        doc.reviewers = vec!["a@x".into()];
        doc.reviewed_by = vec!["a@x".into()];
        h.seed(&doc).await.unwrap();

        let report = scan(&h).run(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.reminded, 0);
        assert!(reminded(&h).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_document_does_not_stop_the_scan() {
        let index = Arc::new(quire_test_utils::MemoryIndex::new());
        index.insert_raw("a-bad", IN_REVIEW, "{not json");
        let mut good = document("b-good", "RFC", IN_REVIEW);
        good.reviewers = vec!["r@x".into()];
        index.save(&good, 0).await.unwrap();

        let h = TestHarness::builder().build().await.unwrap();
        let scan = ReminderScan::new(index, h.notifier.clone());
        let report = scan.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.reminded, 1);
        assert_eq!(reminded(&h).await, vec!["r@x"]);
    }

    #[tokio::test]
    async fn enqueue_failure_skips_only_that_document() {
        let h = TestHarness::builder().build().await.unwrap();
        for (id, reviewer) in [("d1", "a@x"), ("d2", "b@x")] {
            let mut doc = document(id, "RFC", IN_REVIEW);
            doc.reviewers = vec![reviewer.into()];
            h.seed(&doc).await.unwrap();
        }
        h.outbox.fail_next_enqueues(1);

        let report = scan(&h).run(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.reminded, 1);
        assert_eq!(report.enqueued, 2);
        assert_eq!(reminded(&h).await.len(), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_between_documents() {
        let h = TestHarness::builder().build().await.unwrap();
        let mut doc = document("d1", "RFC", "In-Review");
        doc.reviewers = vec!["a@x".into()];
        h.seed(&doc).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = scan(&h).run(&cancel).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.reminded, 0);
    }
}
