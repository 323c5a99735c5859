// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the relational store and notification outbox.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use quire_config::model::StorageConfig;
use quire_core::types::{
    DocumentProjection, DocumentRecord, NewOutboxEntry, OutboxEntry, OutboxFate, PatchIntent,
    RecentlyViewedDoc, Role, UserRecord,
};
use quire_core::{
    AdapterType, ContentId, HealthStatus, OutboxStore, PluginAdapter, QuireError, RelationalStore,
};

use crate::database::{self, Database};
use crate::queries;

/// SQLite-backed relational store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened by [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The database connection is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Opens the database and runs migrations.
    pub async fn initialize(&self) -> Result<(), QuireError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| QuireError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, QuireError> {
        self.db.get().ok_or_else(|| QuireError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Sets the lock flag held for a document by the authoring platform.
    pub async fn set_locked(&self, id: &ContentId, locked: bool) -> Result<bool, QuireError> {
        queries::documents::set_locked(self.db()?, &id.0, locked).await
    }

    pub async fn set_display_name(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<(), QuireError> {
        queries::users::set_display_name(self.db()?, email, display_name).await
    }

    /// Number of outbox entries in the given status.
    pub async fn outbox_count(&self, status: &str) -> Result<i64, QuireError> {
        queries::outbox::count_by_status(self.db()?, status).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Relational
    }

    async fn health_check(&self) -> Result<HealthStatus, QuireError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QuireError> {
        if let Some(db) = self.db.get() {
            database::checkpoint(db).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RelationalStore for SqliteStorage {
    async fn get_document(&self, id: &ContentId) -> Result<Option<DocumentRecord>, QuireError> {
        queries::documents::get_document(self.db()?, &id.0).await
    }

    async fn get_document_by_id(&self, id: i64) -> Result<Option<DocumentRecord>, QuireError> {
        queries::documents::get_document_by_id(self.db()?, id).await
    }

    async fn is_locked(&self, id: &ContentId) -> Result<Option<bool>, QuireError> {
        queries::documents::is_locked(self.db()?, &id.0).await
    }

    async fn upsert_document(&self, projection: &DocumentProjection) -> Result<i64, QuireError> {
        queries::documents::upsert_document(self.db()?, projection).await
    }

    async fn write_intent(&self, intent: &PatchIntent) -> Result<i64, QuireError> {
        queries::intents::write_intent(self.db()?, intent).await
    }

    async fn delete_intent(&self, intent_id: i64) -> Result<(), QuireError> {
        queries::intents::delete_intent(self.db()?, intent_id).await
    }

    async fn list_intents(&self) -> Result<Vec<PatchIntent>, QuireError> {
        queries::intents::list_intents(self.db()?).await
    }

    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>, QuireError> {
        queries::users::get_user(self.db()?, email).await
    }

    async fn find_or_create_user(&self, email: &str) -> Result<UserRecord, QuireError> {
        queries::users::find_or_create_user(self.db()?, email).await
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<bool, QuireError> {
        queries::users::set_role(self.db()?, email, role).await
    }

    async fn recently_viewed(&self, user_id: i64) -> Result<Vec<RecentlyViewedDoc>, QuireError> {
        queries::recently_viewed::list(self.db()?, user_id).await
    }

    async fn replace_recently_viewed(
        &self,
        user_id: i64,
        document_ids: &[i64],
    ) -> Result<(), QuireError> {
        queries::recently_viewed::replace(self.db()?, user_id, document_ids).await
    }

    async fn touch_recently_viewed(
        &self,
        user_id: i64,
        document_id: i64,
        viewed_at: &str,
    ) -> Result<(), QuireError> {
        queries::recently_viewed::touch(self.db()?, user_id, document_id, viewed_at).await
    }
}

#[async_trait]
impl OutboxStore for SqliteStorage {
    async fn enqueue(
        &self,
        channel: &str,
        payload: &str,
        max_attempts: u32,
    ) -> Result<i64, QuireError> {
        queries::outbox::enqueue(self.db()?, channel, payload, max_attempts).await
    }

    async fn enqueue_batch(
        &self,
        entries: &[NewOutboxEntry],
        max_attempts: u32,
    ) -> Result<Vec<i64>, QuireError> {
        queries::outbox::enqueue_batch(self.db()?, entries, max_attempts).await
    }

    async fn dequeue(&self) -> Result<Option<OutboxEntry>, QuireError> {
        queries::outbox::dequeue(self.db()?).await
    }

    async fn ack(&self, id: i64) -> Result<(), QuireError> {
        queries::outbox::ack(self.db()?, id).await
    }

    async fn fail(
        &self,
        id: i64,
        error: &str,
        retry_after: Duration,
    ) -> Result<OutboxFate, QuireError> {
        queries::outbox::fail(self.db()?, id, error, retry_after).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::DocumentStatus;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Relational);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists());
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_fails_when_not_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn document_and_lock_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("adapter.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let id = ContentId::from("doc-9");
        assert_eq!(storage.is_locked(&id).await.unwrap(), None);

        storage
            .upsert_document(&DocumentProjection {
                content_id: "doc-9".into(),
                doc_type: "FRD".into(),
                doc_number: "FRD-9".into(),
                title: "t".into(),
                summary: String::new(),
                status: DocumentStatus::InReview,
                owner: "o@x".into(),
                contributors: vec![],
                reviewers: vec!["r@x".into()],
                reviewed_by: vec![],
                changes_requested_by: vec![],
                due_date: Some("2026-12-01".into()),
                product: String::new(),
                team: String::new(),
                project: String::new(),
                index_version: 3,
                custom_fields: Default::default(),
            })
            .await
            .unwrap();

        assert_eq!(storage.is_locked(&id).await.unwrap(), Some(false));
        assert!(storage.set_locked(&id, true).await.unwrap());
        assert_eq!(storage.is_locked(&id).await.unwrap(), Some(true));

        let doc = storage.get_document(&id).await.unwrap().unwrap();
        assert_eq!(doc.status, DocumentStatus::InReview);
        assert_eq!(doc.due_date.as_deref(), Some("2026-12-01"));

        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn outbox_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("outbox.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let id = storage.enqueue("log", "{}", 2).await.unwrap();
        let entry = storage.dequeue().await.unwrap().unwrap();
        assert_eq!(entry.id, id);
        storage.ack(entry.id).await.unwrap();
        assert_eq!(storage.outbox_count("delivered").await.unwrap(), 1);
        assert_eq!(storage.outbox_count("pending").await.unwrap(), 0);
    }
}
