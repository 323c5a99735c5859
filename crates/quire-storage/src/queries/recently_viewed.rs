// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user recency records.

use quire_core::QuireError;
use quire_core::types::RecentlyViewedDoc;
use rusqlite::params;

use crate::database::Database;

/// The user's recency list, most recent first.
///
/// Rows sharing a timestamp fall back to insertion order, newest first.
pub async fn list(db: &Database, user_id: i64) -> Result<Vec<RecentlyViewedDoc>, QuireError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT r.document_id, d.content_id, r.viewed_at
                 FROM recently_viewed_docs r JOIN documents d ON d.id = r.document_id
                 WHERE r.user_id = ?1
                 ORDER BY r.viewed_at DESC, r.rowid DESC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(RecentlyViewedDoc {
                    document_id: row.get(0)?,
                    content_id: row.get(1)?,
                    viewed_at: row.get(2)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Replace the user's association set with exactly `document_ids`.
///
/// Rows for documents that stay keep their timestamp; rows for new documents
/// are stamped now. Duplicate ids collapse onto the `(user_id, document_id)` key.
pub async fn replace(db: &Database, user_id: i64, document_ids: &[i64]) -> Result<(), QuireError> {
    let document_ids = document_ids.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut existing = tx.prepare(
                    "SELECT document_id FROM recently_viewed_docs WHERE user_id = ?1",
                )?;
                let stale: Vec<i64> = existing
                    .query_map(params![user_id], |row| row.get(0))?
                    .collect::<Result<Vec<i64>, _>>()?
                    .into_iter()
                    .filter(|id| !document_ids.contains(id))
                    .collect();
                for id in stale {
                    tx.execute(
                        "DELETE FROM recently_viewed_docs WHERE user_id = ?1 AND document_id = ?2",
                        params![user_id, id],
                    )?;
                }
            }
            for id in &document_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO recently_viewed_docs (user_id, document_id)
                     VALUES (?1, ?2)",
                    params![user_id, id],
                )?;
            }
            tx.commit()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set `viewed_at` for one (user, document) pair, creating the row if needed.
pub async fn touch(
    db: &Database,
    user_id: i64,
    document_id: i64,
    viewed_at: &str,
) -> Result<(), QuireError> {
    let viewed_at = viewed_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO recently_viewed_docs (user_id, document_id, viewed_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, document_id) DO UPDATE SET viewed_at = excluded.viewed_at",
                params![user_id, document_id, viewed_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
