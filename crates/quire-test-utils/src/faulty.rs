// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store wrappers with switchable failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quire_core::types::{
    DocumentProjection, DocumentRecord, NewOutboxEntry, OutboxEntry, OutboxFate, PatchIntent,
    RecentlyViewedDoc, Role, UserRecord,
};
use quire_core::{
    AdapterType, ContentId, HealthStatus, OutboxStore, PluginAdapter, QuireError, RelationalStore,
};

/// Delegates to `inner`, except that `upsert_document` fails while armed.
pub struct FaultyRelational {
    inner: Arc<dyn RelationalStore>,
    fail_upserts: AtomicBool,
}

impl FaultyRelational {
    pub fn new(inner: Arc<dyn RelationalStore>) -> Self {
        Self {
            inner,
            fail_upserts: AtomicBool::new(false),
        }
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for FaultyRelational {
    fn name(&self) -> &str {
        "faulty-relational"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Relational
    }

    async fn health_check(&self) -> Result<HealthStatus, QuireError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), QuireError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl RelationalStore for FaultyRelational {
    async fn get_document(&self, id: &ContentId) -> Result<Option<DocumentRecord>, QuireError> {
        self.inner.get_document(id).await
    }

    async fn get_document_by_id(&self, id: i64) -> Result<Option<DocumentRecord>, QuireError> {
        self.inner.get_document_by_id(id).await
    }

    async fn is_locked(&self, id: &ContentId) -> Result<Option<bool>, QuireError> {
        self.inner.is_locked(id).await
    }

    async fn upsert_document(&self, projection: &DocumentProjection) -> Result<i64, QuireError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(QuireError::Storage {
                source: "relational store unavailable".into(),
            });
        }
        self.inner.upsert_document(projection).await
    }

    async fn write_intent(&self, intent: &PatchIntent) -> Result<i64, QuireError> {
        self.inner.write_intent(intent).await
    }

    async fn delete_intent(&self, intent_id: i64) -> Result<(), QuireError> {
        self.inner.delete_intent(intent_id).await
    }

    async fn list_intents(&self) -> Result<Vec<PatchIntent>, QuireError> {
        self.inner.list_intents().await
    }

    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>, QuireError> {
        self.inner.get_user(email).await
    }

    async fn find_or_create_user(&self, email: &str) -> Result<UserRecord, QuireError> {
        self.inner.find_or_create_user(email).await
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<bool, QuireError> {
        self.inner.set_role(email, role).await
    }

    async fn recently_viewed(&self, user_id: i64) -> Result<Vec<RecentlyViewedDoc>, QuireError> {
        self.inner.recently_viewed(user_id).await
    }

    async fn replace_recently_viewed(
        &self,
        user_id: i64,
        document_ids: &[i64],
    ) -> Result<(), QuireError> {
        self.inner.replace_recently_viewed(user_id, document_ids).await
    }

    async fn touch_recently_viewed(
        &self,
        user_id: i64,
        document_id: i64,
        viewed_at: &str,
    ) -> Result<(), QuireError> {
        self.inner
            .touch_recently_viewed(user_id, document_id, viewed_at)
            .await
    }
}

/// Delegates to `inner`, except that the next `n` enqueue calls fail
/// without writing anything.
pub struct FaultyOutbox {
    inner: Arc<dyn OutboxStore>,
    failures_left: AtomicUsize,
}

impl FaultyOutbox {
    pub fn new(inner: Arc<dyn OutboxStore>) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(0),
        }
    }

    pub fn fail_next_enqueues(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    fn take_failure(&self) -> Result<(), QuireError> {
        let armed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            return Err(QuireError::Storage {
                source: "outbox unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for FaultyOutbox {
    async fn enqueue(
        &self,
        channel: &str,
        payload: &str,
        max_attempts: u32,
    ) -> Result<i64, QuireError> {
        self.take_failure()?;
        self.inner.enqueue(channel, payload, max_attempts).await
    }

    async fn enqueue_batch(
        &self,
        entries: &[NewOutboxEntry],
        max_attempts: u32,
    ) -> Result<Vec<i64>, QuireError> {
        self.take_failure()?;
        self.inner.enqueue_batch(entries, max_attempts).await
    }

    async fn dequeue(&self) -> Result<Option<OutboxEntry>, QuireError> {
        self.inner.dequeue().await
    }

    async fn ack(&self, id: i64) -> Result<(), QuireError> {
        self.inner.ack(id).await
    }

    async fn fail(
        &self,
        id: i64,
        error: &str,
        retry_after: Duration,
    ) -> Result<OutboxFate, QuireError> {
        self.inner.fail(id, error, retry_after).await
    }
}
