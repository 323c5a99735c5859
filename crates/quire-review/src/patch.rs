// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applies an authorized partial update to both stores.
//!
//! Order of checks: load (not found), authorize (unauthorized), decode
//! against the field table (bad request), lock (locked). Only then does
//! anything get written: the patch intent, the index save guarded by the
//! version read at load time, and finally the relational projection, which
//! clears the intent in the same transaction. An empty patch passes the
//! checks and writes nothing.

use std::sync::Arc;

use chrono::Utc;
use quire_core::types::{IndexedDocument, PatchIntent};
use quire_core::{CallerIdentity, ContentId, IndexStore, QuireError, RelationalStore};
use tracing::{debug, error, info, warn};

use crate::authz::authorize;
use crate::diff::reviewer_notification_set;
use crate::fields::FieldTable;
use crate::lock::LockGate;
use crate::projection::project;

/// What a successful patch committed.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub content_id: ContentId,
    /// Index version the merged document was saved as.
    pub version: u64,
    /// Reviewers newly asked to review by this patch.
    pub notify: Vec<String>,
    /// The merged document as stored.
    pub document: IndexedDocument,
}

pub struct PatchApplier {
    index: Arc<dyn IndexStore>,
    relational: Arc<dyn RelationalStore>,
    lock_gate: LockGate,
}

impl PatchApplier {
    pub fn new(
        index: Arc<dyn IndexStore>,
        relational: Arc<dyn RelationalStore>,
        lock_gate: LockGate,
    ) -> Self {
        Self {
            index,
            relational,
            lock_gate,
        }
    }

    pub async fn apply(
        &self,
        caller: &CallerIdentity,
        id: &ContentId,
        body: &[u8],
    ) -> Result<PatchOutcome, QuireError> {
        let loaded = self
            .index
            .get(id)
            .await?
            .ok_or_else(|| QuireError::NotFound(format!("document {id}")))?;

        authorize(caller, &loaded.document)?;
        let patch = FieldTable::for_doc_type(&loaded.document.doc_type).decode(body)?;
        self.lock_gate.check(id).await?;

        if patch.is_empty() {
            debug!(doc_id = %id, version = loaded.version, "empty patch, nothing written");
            return Ok(PatchOutcome {
                content_id: id.clone(),
                version: loaded.version,
                notify: Vec::new(),
                document: loaded.document,
            });
        }

        let notify =
            reviewer_notification_set(&loaded.document.reviewers, &patch.requested_reviewers());

        let mut merged = loaded.document;
        patch.apply(&mut merged);
        merged.modified_time = Utc::now().timestamp();

        let payload = serde_json::to_string(&merged)
            .map_err(|e| QuireError::Internal(format!("cannot encode document {id}: {e}")))?;
        let intent_id = self
            .relational
            .write_intent(&PatchIntent {
                id: 0,
                content_id: id.0.clone(),
                target_version: loaded.version + 1,
                payload,
                created_at: Utc::now().to_rfc3339(),
            })
            .await?;

        let version = match self.index.save(&merged, loaded.version).await {
            Ok(version) => version,
            Err(e) => {
                // Only our own intent: a racing writer's may still need repair.
                if let Err(cleanup) = self.relational.delete_intent(intent_id).await {
                    warn!(doc_id = %id, intent_id, error = %cleanup, "could not clear patch intent");
                }
                return Err(e);
            }
        };
        debug!(doc_id = %id, version, "index store updated");

        if let Err(e) = self
            .relational
            .upsert_document(&project(&merged, version))
            .await
        {
            error!(doc_id = %id, version, error = %e, "relational projection failed, intent left for reconciliation");
            return Err(QuireError::Internal(format!(
                "document {id} saved but its projection failed"
            )));
        }

        info!(doc_id = %id, caller = %caller, version, fields = ?patch.field_names(), "document patched");
        Ok(PatchOutcome {
            content_id: id.clone(),
            version,
            notify,
            document: merged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::types::DocumentStatus;
    use quire_index::SqliteIndex;
    use quire_storage::SqliteStorage;

    struct Fixture {
        index: Arc<SqliteIndex>,
        storage: Arc<SqliteStorage>,
        applier: PatchApplier,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(quire_config::model::StorageConfig {
            database_path: dir.path().join("q.db").to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        let storage = Arc::new(storage);
        let index = Arc::new(
            SqliteIndex::open(&quire_config::model::IndexConfig {
                database_path: dir.path().join("index.db").to_string_lossy().into_owned(),
            })
            .await
            .unwrap(),
        );
        let applier = PatchApplier::new(
            index.clone(),
            storage.clone(),
            LockGate::new(storage.clone()),
        );
        Fixture {
            index,
            storage,
            applier,
            _dir: dir,
        }
    }

    async fn seed(f: &Fixture, reviewers: &[&str]) {
        let doc = IndexedDocument {
            object_id: "d1".into(),
            doc_type: "RFC".into(),
            title: "Caching".into(),
            status: "Draft".into(),
            owner: "o@x".into(),
            contributors: vec!["c@x".into()],
            reviewers: reviewers.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        };
        let version = f.index.save(&doc, 0).await.unwrap();
        f.storage.upsert_document(&project(&doc, version)).await.unwrap();
    }

    fn owner() -> CallerIdentity {
        CallerIdentity("o@x".into())
    }

    fn id() -> ContentId {
        ContentId::from("d1")
    }

    #[tokio::test]
    async fn owner_patch_updates_both_stores() {
        let f = fixture().await;
        seed(&f, &[]).await;

        let outcome = f
            .applier
            .apply(&owner(), &id(), br#"{"reviewers":["r1@x","r2@x"]}"#)
            .await
            .unwrap();
        assert_eq!(outcome.version, 2);
        assert_eq!(outcome.notify, vec!["r1@x", "r2@x"]);

        let stored = f.index.get(&id()).await.unwrap().unwrap();
        assert_eq!(stored.document.reviewers, vec!["r1@x", "r2@x"]);
        assert_eq!(stored.document.status, "Draft");

        let record = f.storage.get_document(&id()).await.unwrap().unwrap();
        assert_eq!(record.reviewers, vec!["r1@x", "r2@x"]);
        assert_eq!(record.status, DocumentStatus::Draft);
        assert_eq!(record.index_version, 2);
        assert!(f.storage.list_intents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_added_reviewers_are_notified() {
        let f = fixture().await;
        seed(&f, &["a@x", "b@x"]).await;
        let outcome = f
            .applier
            .apply(&owner(), &id(), br#"{"reviewers":["a@x","c@x"]}"#)
            .await
            .unwrap();
        assert_eq!(outcome.notify, vec!["c@x"]);
        let record = f.storage.get_document(&id()).await.unwrap().unwrap();
        assert_eq!(record.reviewers, vec!["a@x", "c@x"]);
    }

    #[tokio::test]
    async fn empty_reviewers_leave_the_set_alone() {
        let f = fixture().await;
        seed(&f, &["a@x", "b@x"]).await;
        let outcome = f
            .applier
            .apply(&owner(), &id(), br#"{"reviewers":[]}"#)
            .await
            .unwrap();
        assert!(outcome.notify.is_empty());
        let record = f.storage.get_document(&id()).await.unwrap().unwrap();
        assert_eq!(record.reviewers, vec!["a@x", "b@x"]);
    }

    #[tokio::test]
    async fn empty_object_writes_nothing() {
        let f = fixture().await;
        seed(&f, &["a@x"]).await;
        let before = f.index.get(&id()).await.unwrap().unwrap();

        let outcome = f.applier.apply(&owner(), &id(), b"{}").await.unwrap();
        assert_eq!(outcome.version, 1);
        assert!(outcome.notify.is_empty());

        let after = f.index.get(&id()).await.unwrap().unwrap();
        assert_eq!(after.version, 1);
        assert_eq!(after.document.modified_time, before.document.modified_time);
        let record = f.storage.get_document(&id()).await.unwrap().unwrap();
        assert_eq!(record.index_version, 1);
        assert!(f.storage.list_intents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn outsider_is_unauthorized_and_nothing_is_written() {
        let f = fixture().await;
        seed(&f, &[]).await;
        let err = f
            .applier
            .apply(&CallerIdentity("eve@x".into()), &id(), br#"{"title":"Mine"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, QuireError::Unauthorized(_)));
        assert_eq!(f.index.get(&id()).await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn locked_document_rejects_even_the_owner() {
        let f = fixture().await;
        seed(&f, &[]).await;
        f.storage.set_locked(&id(), true).await.unwrap();
        let err = f
            .applier
            .apply(&owner(), &id(), br#"{"title":"New"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, QuireError::Locked(_)));
        let stored = f.index.get(&id()).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.document.title, "Caching");
    }

    #[tokio::test]
    async fn unknown_document_is_not_found() {
        let f = fixture().await;
        let err = f
            .applier
            .apply(&owner(), &ContentId::from("ghost"), br#"{"title":"x"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, QuireError::NotFound(_)));
    }

    #[tokio::test]
    async fn disallowed_field_is_a_bad_request() {
        let f = fixture().await;
        seed(&f, &[]).await;
        let err = f
            .applier
            .apply(&owner(), &id(), br#"{"owner":"eve@x"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, QuireError::BadRequest(_)));
        assert!(f.storage.list_intents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unrecognized_status_projects_as_unspecified() {
        let f = fixture().await;
        seed(&f, &[]).await;
        f.applier
            .apply(&owner(), &id(), br#"{"status":"Approved"}"#)
            .await
            .unwrap();
        let stored = f.index.get(&id()).await.unwrap().unwrap();
        assert_eq!(stored.document.status, "Approved");
        let record = f.storage.get_document(&id()).await.unwrap().unwrap();
        assert_eq!(record.status, DocumentStatus::Unspecified);
    }

    /// Index wrapper that lets another writer commit between our load and save.
    struct Racing {
        inner: Arc<SqliteIndex>,
        /// When set, the other writer also leaves its intent here and its
        /// projection never lands.
        winner_intents: Option<Arc<SqliteStorage>>,
    }

    #[async_trait::async_trait]
    impl quire_core::PluginAdapter for Racing {
        fn name(&self) -> &str {
            "racing"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> quire_core::AdapterType {
            quire_core::AdapterType::Index
        }
        async fn health_check(&self) -> Result<quire_core::HealthStatus, QuireError> {
            Ok(quire_core::HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), QuireError> {
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl IndexStore for Racing {
        async fn get(
            &self,
            id: &ContentId,
        ) -> Result<Option<quire_core::types::Versioned<IndexedDocument>>, QuireError> {
            let loaded = self.inner.get(id).await?;
            if let Some(v) = &loaded {
                let mut winner = v.document.clone();
                winner.title = "Winner".into();
                if let Some(storage) = &self.winner_intents {
                    storage
                        .write_intent(&PatchIntent {
                            id: 0,
                            content_id: id.0.clone(),
                            target_version: v.version + 1,
                            payload: serde_json::to_string(&winner).unwrap(),
                            created_at: String::new(),
                        })
                        .await?;
                }
                self.inner.save(&winner, v.version).await?;
            }
            Ok(loaded)
        }
        async fn save(&self, doc: &IndexedDocument, expected: u64) -> Result<u64, QuireError> {
            self.inner.save(doc, expected).await
        }
        async fn search(
            &self,
            query: &quire_core::types::IndexQuery,
        ) -> Result<Vec<quire_core::types::IndexHit>, QuireError> {
            self.inner.search(query).await
        }
    }

    fn racing_applier(f: &Fixture, winner_intents: bool) -> PatchApplier {
        PatchApplier::new(
            Arc::new(Racing {
                inner: f.index.clone(),
                winner_intents: winner_intents.then(|| f.storage.clone()),
            }),
            f.storage.clone(),
            LockGate::new(f.storage.clone()),
        )
    }

    #[tokio::test]
    async fn concurrent_writer_causes_conflict_and_clears_intent() {
        let f = fixture().await;
        seed(&f, &[]).await;

        let err = racing_applier(&f, false)
            .apply(&owner(), &id(), br#"{"title":"Lost"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, QuireError::Conflict(_)));
        assert!(f.storage.list_intents().await.unwrap().is_empty());
        assert_eq!(
            f.index.get(&id()).await.unwrap().unwrap().document.title,
            "Winner"
        );
    }

    #[tokio::test]
    async fn losing_writer_leaves_the_winners_intent_for_repair() {
        let f = fixture().await;
        seed(&f, &[]).await;

        let err = racing_applier(&f, true)
            .apply(&owner(), &id(), br#"{"title":"Lost"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, QuireError::Conflict(_)));

        let left = f.storage.list_intents().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].target_version, 2);

        let report = crate::Reconciler::new(f.index.clone(), f.storage.clone())
            .run_once()
            .await
            .unwrap();
        assert_eq!(report.repaired, 1);
        let record = f.storage.get_document(&id()).await.unwrap().unwrap();
        assert_eq!(record.title, "Winner");
        assert_eq!(record.index_version, 2);
        assert!(f.storage.list_intents().await.unwrap().is_empty());
    }
}
