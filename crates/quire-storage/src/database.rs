// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use quire_core::QuireError;
use tracing::debug;

use crate::migrations;

/// Convert a tokio-rusqlite error into QuireError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> QuireError {
    QuireError::Storage {
        source: Box::new(e),
    }
}

/// The relational store's single connection.
///
/// Query modules accept `&Database` and go through [`Database::connection`].
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` in WAL mode and runs
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, QuireError> {
        Self::open_with(path, true).await
    }

    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, QuireError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| QuireError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| QuireError::Storage {
                source: Box::new(e),
            })?;

        let journal = if wal_mode { "WAL" } else { "DELETE" };
        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;"
            ))
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e| QuireError::Storage {
                source: format!("migration failed: {e}").into(),
            })?;

        debug!(path, wal_mode, "relational store opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(self) -> Result<(), QuireError> {
        checkpoint(&self).await?;
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Folds the WAL back into the main database file.
pub async fn checkpoint(db: &Database) -> Result<(), QuireError> {
    db.connection()
        .call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    debug!("WAL checkpoint complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/quire.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        for table in [
            "users",
            "documents",
            "document_people",
            "document_custom_fields",
            "recently_viewed_docs",
            "patch_intents",
            "notification_outbox",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quire.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("fk.db").to_str().unwrap())
            .await
            .unwrap();
        let result = db
            .connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO recently_viewed_docs (user_id, document_id) VALUES (99, 99)",
                    [],
                )
            })
            .await;
        assert!(result.is_err());
        db.close().await.unwrap();
    }
}
