// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the review stack over temp SQLite files, with
//! recording notification channels in place of SMTP and Slack.

use std::sync::Arc;
use std::time::Duration;

use quire_config::model::{IndexConfig, QuireConfig, StorageConfig};
use quire_core::types::{ChannelKind, IndexedDocument};
use quire_core::{CallerIdentity, ContentId, IndexStore, NotificationChannel, QuireError, RelationalStore};
use quire_index::SqliteIndex;
use quire_notify::{DrainReport, OutboxDispatcher, RetryPolicy};
use quire_review::{
    ChannelRoute, DocumentService, LockGate, NotifierSettings, Reconciler, ReviewNotifier, project,
};
use quire_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;

use crate::faulty::{FaultyOutbox, FaultyRelational};
use crate::mock_channel::RecordingChannel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    notifications_enabled: bool,
    max_attempts: u32,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            notifications_enabled: true,
            max_attempts: 3,
        }
    }

    pub fn notifications_enabled(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, QuireError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| QuireError::Storage { source: e.into() })?;
        let path = |name: &str| temp_dir.path().join(name).to_string_lossy().into_owned();

        let mut config = QuireConfig::default();
        config.storage = StorageConfig {
            database_path: path("quire.db"),
            wal_mode: true,
        };
        config.index = IndexConfig {
            database_path: path("index.db"),
        };
        config.notifications.enabled = self.notifications_enabled;
        config.notifications.base_url = "https://quire.test".to_string();
        config.outbox.max_attempts = self.max_attempts;

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage = Arc::new(storage);
        let relational = Arc::new(FaultyRelational::new(storage.clone()));
        let outbox = Arc::new(FaultyOutbox::new(storage.clone()));
        let index = Arc::new(SqliteIndex::open(&config.index).await?);

        let email = Arc::new(RecordingChannel::new("email", ChannelKind::Direct));
        let slack = Arc::new(RecordingChannel::new("slack", ChannelKind::Broadcast));
        let channels: Vec<Arc<dyn NotificationChannel>> = vec![email.clone(), slack.clone()];
        let routes = channels
            .iter()
            .map(|c| ChannelRoute::new(c.name(), c.kind()))
            .collect();

        let notifier = Arc::new(ReviewNotifier::new(
            NotifierSettings::from_config(&config),
            routes,
            outbox.clone(),
            relational.clone(),
        ));
        let service = Arc::new(DocumentService::new(
            index.clone(),
            relational.clone(),
            LockGate::new(relational.clone()),
            notifier.clone(),
        ));
        let reconciler = Arc::new(Reconciler::new(index.clone(), relational.clone()));
        let dispatcher = OutboxDispatcher::new(
            storage.clone(),
            channels,
            RetryPolicy::from_config(&config.outbox),
            Duration::from_millis(10),
        );

        Ok(TestHarness {
            config,
            storage,
            relational,
            outbox,
            index,
            email,
            slack,
            notifier,
            service,
            reconciler,
            dispatcher,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment over temp storage.
pub struct TestHarness {
    pub config: QuireConfig,
    /// SQLite relational store (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// The relational store as the service sees it.
    pub relational: Arc<FaultyRelational>,
    /// The outbox as the notifier sees it. The dispatcher reads `storage`.
    pub outbox: Arc<FaultyOutbox>,
    pub index: Arc<SqliteIndex>,
    /// Direct channel named `email`.
    pub email: Arc<RecordingChannel>,
    /// Broadcast channel named `slack`.
    pub slack: Arc<RecordingChannel>,
    pub notifier: Arc<ReviewNotifier>,
    pub service: Arc<DocumentService>,
    pub reconciler: Arc<Reconciler>,
    pub dispatcher: OutboxDispatcher,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Creates a document in the index and projects it, as an import would.
    pub async fn seed(&self, doc: &IndexedDocument) -> Result<u64, QuireError> {
        let version = self.index.save(doc, 0).await?;
        self.storage.upsert_document(&project(doc, version)).await?;
        Ok(version)
    }

    pub async fn patch(&self, caller: &str, id: &str, body: &str) -> Result<(), QuireError> {
        self.service
            .patch_document(
                &CallerIdentity(caller.to_string()),
                &ContentId::from(id),
                body.as_bytes(),
            )
            .await
    }

    /// Delivers everything currently due on the outbox.
    pub async fn deliver(&self) -> Result<DrainReport, QuireError> {
        self.dispatcher.drain_once(&CancellationToken::new()).await
    }
}

/// A document owned by `o@x` with the given id, type and status.
pub fn document(id: &str, doc_type: &str, status: &str) -> IndexedDocument {
    IndexedDocument {
        object_id: id.to_string(),
        doc_type: doc_type.to_string(),
        doc_number: format!("QR-{id}"),
        title: format!("Document {id}"),
        status: status.to_string(),
        owner: "o@x".to_string(),
        product: "Quire".to_string(),
        team: "Docs".to_string(),
        ..Default::default()
    }
}
