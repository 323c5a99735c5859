// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write-ahead patch intents.
//!
//! Every patch writes its own row. A writer only ever deletes the row it
//! wrote; projections clear the rows their index version covers (see
//! `documents::upsert_document`).

use quire_core::QuireError;
use quire_core::types::PatchIntent;
use rusqlite::params;

use crate::database::Database;

/// Record an intent. Returns the id that identifies it from now on.
pub async fn write_intent(db: &Database, intent: &PatchIntent) -> Result<i64, QuireError> {
    let content_id = intent.content_id.clone();
    let target_version = i64::try_from(intent.target_version).unwrap_or(i64::MAX);
    let payload = intent.payload.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO patch_intents (content_id, target_version, payload)
                 VALUES (?1, ?2, ?3)",
                params![content_id, target_version, payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete one intent by id. Deleting an intent that is already gone is not an error.
pub async fn delete_intent(db: &Database, id: i64) -> Result<(), QuireError> {
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM patch_intents WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All dangling intents, oldest first.
pub async fn list_intents(db: &Database) -> Result<Vec<PatchIntent>, QuireError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, content_id, target_version, payload, created_at
                 FROM patch_intents ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                let target: i64 = row.get(2)?;
                Ok(PatchIntent {
                    id: row.get(0)?,
                    content_id: row.get(1)?,
                    target_version: u64::try_from(target).unwrap_or_default(),
                    payload: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn intent(id: &str, version: u64) -> PatchIntent {
        PatchIntent {
            id: 0,
            content_id: id.into(),
            target_version: version,
            payload: format!(r#"{{"objectID":"{id}"}}"#),
            created_at: String::new(),
        }
    }

    #[tokio::test]
    async fn write_list_delete_lifecycle() {
        let (db, _dir) = setup_db().await;

        let a = write_intent(&db, &intent("a", 2)).await.unwrap();
        let b = write_intent(&db, &intent("b", 5)).await.unwrap();
        assert_ne!(a, b);

        let listed = list_intents(&db).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, a);
        assert_eq!(listed[0].content_id, "a");
        assert_eq!(listed[0].target_version, 2);
        assert!(!listed[0].created_at.is_empty());

        delete_intent(&db, a).await.unwrap();
        delete_intent(&db, a).await.unwrap();
        let listed = list_intents(&db).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content_id, "b");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn racing_writers_keep_separate_intents() {
        let (db, _dir) = setup_db().await;
        let first = write_intent(&db, &intent("a", 2)).await.unwrap();
        let second = write_intent(&db, &intent("a", 2)).await.unwrap();

        delete_intent(&db, second).await.unwrap();
        let listed = list_intents(&db).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, first);
        db.close().await.unwrap();
    }
}
