// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory index store.
//!
//! Behaves like the SQLite index (versioned compare-and-swap saves, status
//! filtered search) without touching the filesystem, so it is safe to use
//! under a paused tokio clock.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quire_core::types::{IndexHit, IndexQuery, IndexedDocument, Versioned};
use quire_core::{AdapterType, ContentId, HealthStatus, IndexStore, PluginAdapter, QuireError};

#[derive(Clone)]
struct Row {
    version: u64,
    doc_type: String,
    status: String,
    body: String,
}

#[derive(Default)]
pub struct MemoryIndex {
    rows: Mutex<BTreeMap<String, Row>>,
    searches: AtomicUsize,
    search_delay_ms: AtomicU64,
    fail_saves: AtomicBool,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `body` verbatim, for simulating malformed records.
    pub fn insert_raw(&self, object_id: &str, status: &str, body: &str) {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let version = rows.get(object_id).map_or(1, |r| r.version + 1);
        rows.insert(
            object_id.to_string(),
            Row {
                version,
                doc_type: String::new(),
                status: status.to_string(),
                body: body.to_string(),
            },
        );
    }

    /// Number of `search` calls so far.
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    /// Makes every search take `delay` (tokio time) before answering.
    pub fn set_search_delay(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.search_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Makes every subsequent save fail with an index error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for MemoryIndex {
    fn name(&self) -> &str {
        "memory-index"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Index
    }

    async fn health_check(&self) -> Result<HealthStatus, QuireError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QuireError> {
        Ok(())
    }
}

#[async_trait]
impl IndexStore for MemoryIndex {
    async fn get(&self, id: &ContentId) -> Result<Option<Versioned<IndexedDocument>>, QuireError> {
        let row = self
            .rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id.0)
            .cloned();
        let Some(row) = row else {
            return Ok(None);
        };
        let hit = IndexHit {
            object_id: id.0.clone(),
            version: row.version,
            body: row.body,
        };
        Ok(Some(Versioned {
            version: hit.version,
            document: hit.decode()?,
        }))
    }

    async fn save(&self, doc: &IndexedDocument, expected_version: u64) -> Result<u64, QuireError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(QuireError::index("index unavailable"));
        }
        let body = serde_json::to_string(doc)
            .map_err(|e| QuireError::index(format!("cannot serialize document: {e}")))?;
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let stored = rows.get(&doc.object_id).map(|r| r.version);
        let next = match stored {
            None if expected_version == 0 => 1,
            Some(current) if current == expected_version => current + 1,
            _ => {
                return Err(QuireError::Conflict(format!(
                    "document {} changed concurrently",
                    doc.object_id
                )));
            }
        };
        rows.insert(
            doc.object_id.clone(),
            Row {
                version: next,
                doc_type: doc.doc_type.clone(),
                status: doc.status.clone(),
                body,
            },
        );
        Ok(next)
    }

    async fn search(&self, query: &IndexQuery) -> Result<Vec<IndexHit>, QuireError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let delay = self.search_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rows
            .iter()
            .filter(|(_, r)| query.status.as_ref().is_none_or(|s| *s == r.status))
            .filter(|(_, r)| query.doc_type.as_ref().is_none_or(|t| *t == r.doc_type))
            .map(|(id, r)| IndexHit {
                object_id: id.clone(),
                version: r.version,
                body: r.body.clone(),
            })
            .collect())
    }
}
