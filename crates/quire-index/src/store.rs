// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed index store with compare-and-swap saves.

use async_trait::async_trait;
use quire_config::model::IndexConfig;
use quire_core::types::{IndexHit, IndexQuery, IndexedDocument, Versioned};
use quire_core::{AdapterType, ContentId, HealthStatus, IndexStore, PluginAdapter, QuireError};
use rusqlite::{OptionalExtension, params};
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Helper to convert tokio_rusqlite errors into QuireError::Index.
fn index_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> QuireError {
    QuireError::Index {
        message: "index store query failed".to_string(),
        source: Some(Box::new(e)),
    }
}

/// Outcome of the CAS step, decided inside the connection thread.
enum SaveOutcome {
    Saved(u64),
    Stale { stored: Option<u64> },
}

/// Document index stored as JSON rows in a dedicated SQLite file.
///
/// Saves run with `synchronous = FULL`, so a returned version is durable.
pub struct SqliteIndex {
    conn: Connection,
}

impl SqliteIndex {
    pub async fn open(config: &IndexConfig) -> Result<Self, QuireError> {
        let path = config.database_path.clone();
        if let Some(parent) = std::path::Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| QuireError::Index {
                message: format!("cannot create index directory {}", parent.display()),
                source: Some(Box::new(e)),
            })?;
        }

        let conn = Connection::open(&path)
            .await
            .map_err(|e| index_err(tokio_rusqlite::Error::Error(e)))?;
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = FULL;
                 PRAGMA busy_timeout = 5000;",
            )
        })
        .await
        .map_err(index_err)?;
        conn.call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e| QuireError::Index {
                message: format!("index migration failed: {e}"),
                source: None,
            })?;

        debug!(path = %path, "index store opened");
        Ok(Self { conn })
    }
}

#[async_trait]
impl PluginAdapter for SqliteIndex {
    fn name(&self) -> &str {
        "sqlite-index"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Index
    }

    async fn health_check(&self) -> Result<HealthStatus, QuireError> {
        self.conn
            .call(|conn| conn.execute_batch("SELECT 1;"))
            .await
            .map_err(index_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QuireError> {
        self.conn
            .call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
            .map_err(index_err)
    }
}

#[async_trait]
impl IndexStore for SqliteIndex {
    async fn get(&self, id: &ContentId) -> Result<Option<Versioned<IndexedDocument>>, QuireError> {
        let object_id = id.0.clone();
        let row: Option<(i64, String)> = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT version, body FROM index_documents WHERE object_id = ?1",
                    params![object_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
            })
            .await
            .map_err(index_err)?;

        let Some((version, body)) = row else {
            return Ok(None);
        };
        let hit = IndexHit {
            object_id: id.0.clone(),
            version: u64::try_from(version).unwrap_or_default(),
            body,
        };
        let document = hit.decode()?;
        Ok(Some(Versioned {
            version: hit.version,
            document,
        }))
    }

    async fn save(&self, doc: &IndexedDocument, expected_version: u64) -> Result<u64, QuireError> {
        if doc.object_id.is_empty() {
            return Err(QuireError::index("document has no objectID"));
        }
        let body = serde_json::to_string(doc).map_err(|e| QuireError::Index {
            message: format!("cannot serialize document {}", doc.object_id),
            source: Some(Box::new(e)),
        })?;
        let object_id = doc.object_id.clone();
        let doc_type = doc.doc_type.clone();
        let status = doc.status.clone();
        let expected = i64::try_from(expected_version).unwrap_or(i64::MAX);

        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let stored: Option<i64> = tx
                    .query_row(
                        "SELECT version FROM index_documents WHERE object_id = ?1",
                        params![object_id],
                        |row| row.get(0),
                    )
                    .optional()?;

                let outcome = match stored {
                    None if expected == 0 => {
                        tx.execute(
                            "INSERT INTO index_documents (object_id, doc_type, status, version, body)
                             VALUES (?1, ?2, ?3, 1, ?4)",
                            params![object_id, doc_type, status, body],
                        )?;
                        SaveOutcome::Saved(1)
                    }
                    Some(current) if current == expected => {
                        tx.execute(
                            "UPDATE index_documents SET doc_type = ?1, status = ?2,
                             version = version + 1, body = ?3,
                             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                             WHERE object_id = ?4",
                            params![doc_type, status, body, object_id],
                        )?;
                        SaveOutcome::Saved(u64::try_from(current + 1).unwrap_or_default())
                    }
                    other => SaveOutcome::Stale {
                        stored: other.and_then(|v| u64::try_from(v).ok()),
                    },
                };
                tx.commit()?;
                Ok(outcome)
            })
            .await
            .map_err(index_err)?;

        match outcome {
            SaveOutcome::Saved(version) => {
                debug!(doc_id = %doc.object_id, version, "index document saved");
                Ok(version)
            }
            SaveOutcome::Stale { stored } => Err(QuireError::Conflict(format!(
                "document {} changed concurrently (expected version {expected_version}, found {})",
                doc.object_id,
                stored.map_or_else(|| "none".to_string(), |v| v.to_string()),
            ))),
        }
    }

    async fn search(&self, query: &IndexQuery) -> Result<Vec<IndexHit>, QuireError> {
        let status = query.status.clone();
        let doc_type = query.doc_type.clone();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT object_id, version, body FROM index_documents
                     WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR doc_type = ?2)
                     ORDER BY object_id ASC",
                )?;
                let hits = stmt
                    .query_map(params![status, doc_type], |row| {
                        let version: i64 = row.get(1)?;
                        Ok(IndexHit {
                            object_id: row.get(0)?,
                            version: u64::try_from(version).unwrap_or_default(),
                            body: row.get(2)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(hits)
            })
            .await
            .map_err(index_err)
    }
}
