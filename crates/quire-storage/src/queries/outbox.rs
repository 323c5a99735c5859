// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification outbox with retry scheduling.
//!
//! Entries move `pending -> processing -> delivered`, or back to `pending`
//! with a later `next_attempt_at` on failure, until `max_attempts` parks
//! them as `failed`. A `processing` entry whose lock has expired is
//! claimable again.

use std::time::Duration;

use quire_core::QuireError;
use quire_core::types::{NewOutboxEntry, OutboxEntry, OutboxFate};
use rusqlite::{OptionalExtension, params};

use crate::database::Database;

/// Enqueue a new entry for the named channel. Returns its id.
pub async fn enqueue(
    db: &Database,
    channel: &str,
    payload: &str,
    max_attempts: u32,
) -> Result<i64, QuireError> {
    let channel = channel.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO notification_outbox (channel, payload, max_attempts)
                 VALUES (?1, ?2, ?3)",
                params![channel, payload, max_attempts],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Enqueue several entries atomically. Returns their ids in order.
pub async fn enqueue_batch(
    db: &Database,
    entries: &[NewOutboxEntry],
    max_attempts: u32,
) -> Result<Vec<i64>, QuireError> {
    let entries = entries.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(entries.len());
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO notification_outbox (channel, payload, max_attempts)
                     VALUES (?1, ?2, ?3)",
                )?;
                for entry in &entries {
                    stmt.execute(params![entry.channel, entry.payload, max_attempts])?;
                    ids.push(tx.last_insert_rowid());
                }
            }
            tx.commit()?;
            Ok(ids)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim the oldest due entry.
///
/// Atomically selects it and marks it "processing" with a 5-minute lock.
pub async fn dequeue(db: &Database) -> Result<Option<OutboxEntry>, QuireError> {
    db.connection()
        .call(|conn| {
            let tx = conn.transaction()?;

            let entry = tx
                .query_row(
                    "SELECT id, channel, payload, attempts, max_attempts
                     FROM notification_outbox
                     WHERE (status = 'pending'
                            AND next_attempt_at <= strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                        OR (status = 'processing'
                            AND locked_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     ORDER BY id ASC
                     LIMIT 1",
                    [],
                    |row| {
                        Ok(OutboxEntry {
                            id: row.get(0)?,
                            channel: row.get(1)?,
                            payload: row.get(2)?,
                            attempts: row.get(3)?,
                            max_attempts: row.get(4)?,
                        })
                    },
                )
                .optional()?;

            if let Some(entry) = &entry {
                tx.execute(
                    "UPDATE notification_outbox SET status = 'processing',
                     locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+5 minutes'),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1",
                    params![entry.id],
                )?;
            }
            tx.commit()?;
            Ok(entry)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark an entry delivered.
pub async fn ack(db: &Database, id: i64) -> Result<(), QuireError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE notification_outbox SET status = 'delivered',
                 locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record a failed delivery.
///
/// Increments attempts. At `max_attempts` the entry is parked as "failed";
/// otherwise it returns to "pending", due `retry_after` from now.
pub async fn fail(
    db: &Database,
    id: i64,
    error: &str,
    retry_after: Duration,
) -> Result<OutboxFate, QuireError> {
    let error = error.to_string();
    let modifier = format!("+{} seconds", retry_after.as_secs());
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let (attempts, max_attempts): (u32, u32) = tx.query_row(
                "SELECT attempts, max_attempts FROM notification_outbox WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let new_attempts = attempts + 1;
            let fate = if new_attempts >= max_attempts {
                tx.execute(
                    "UPDATE notification_outbox SET status = 'failed', attempts = ?1,
                     last_error = ?2, locked_until = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?3",
                    params![new_attempts, error, id],
                )?;
                OutboxFate::Failed
            } else {
                tx.execute(
                    "UPDATE notification_outbox SET status = 'pending', attempts = ?1,
                     last_error = ?2, locked_until = NULL,
                     next_attempt_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?3),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?4",
                    params![new_attempts, error, modifier, id],
                )?;
                OutboxFate::Retry
            };
            tx.commit()?;
            Ok(fate)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count entries in the given status.
pub async fn count_by_status(db: &Database, status: &str) -> Result<i64, QuireError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM notification_outbox WHERE status = ?1",
                params![status],
                |row| row.get(0),
            )
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

    async fn status_of(db: &Database, id: i64) -> (String, u32) {
        db.connection()
            .call(move |conn| -> Result<(String, u32), rusqlite::Error> {
                conn.query_row(
                    "SELECT status, attempts FROM notification_outbox WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn enqueue_and_dequeue_lifecycle() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "email", r#"{"n":1}"#, 5).await.unwrap();
        assert!(id > 0);

        let entry = dequeue(&db).await.unwrap().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.channel, "email");
        assert_eq!(entry.payload, r#"{"n":1}"#);
        assert_eq!(entry.attempts, 0);
        assert_eq!(entry.max_attempts, 5);
        assert_eq!(status_of(&db, id).await.0, "processing");

        // Claimed entries are not handed out twice.
        assert!(dequeue(&db).await.unwrap().is_none());

        ack(&db, id).await.unwrap();
        assert_eq!(status_of(&db, id).await.0, "delivered");
        assert_eq!(count_by_status(&db, "delivered").await.unwrap(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn batch_enqueue_keeps_order() {
        let (db, _dir) = setup_db().await;
        let entries: Vec<NewOutboxEntry> = ["email", "email", "slack"]
            .iter()
            .enumerate()
            .map(|(n, channel)| NewOutboxEntry {
                channel: channel.to_string(),
                payload: format!("p{n}"),
            })
            .collect();

        let ids = enqueue_batch(&db, &entries, 4).await.unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(count_by_status(&db, "pending").await.unwrap(), 3);

        let first = dequeue(&db).await.unwrap().unwrap();
        assert_eq!(first.id, ids[0]);
        assert_eq!(first.payload, "p0");
        assert_eq!(first.max_attempts, 4);

        assert!(enqueue_batch(&db, &[], 4).await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn batch_enqueue_is_all_or_nothing() {
        let (db, _dir) = setup_db().await;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "CREATE TRIGGER reject_boom BEFORE INSERT ON notification_outbox
                     WHEN NEW.payload = 'boom'
                     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
                )
            })
            .await
            .unwrap();

        let entries = vec![
            NewOutboxEntry {
                channel: "email".into(),
                payload: "fine".into(),
            },
            NewOutboxEntry {
                channel: "email".into(),
                payload: "boom".into(),
            },
        ];
        assert!(enqueue_batch(&db, &entries, 3).await.is_err());
        assert_eq!(count_by_status(&db, "pending").await.unwrap(), 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fail_with_backoff_hides_entry_until_due() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "slack", "p", 5).await.unwrap();
        dequeue(&db).await.unwrap().unwrap();

        let fate = fail(&db, id, "webhook 500", Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(fate, OutboxFate::Retry);
        assert_eq!(status_of(&db, id).await, ("pending".to_string(), 1));
        assert!(dequeue(&db).await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fail_with_zero_backoff_is_immediately_due() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "slack", "p", 5).await.unwrap();
        dequeue(&db).await.unwrap().unwrap();
        fail(&db, id, "boom", Duration::ZERO).await.unwrap();

        let again = dequeue(&db).await.unwrap().unwrap();
        assert_eq!(again.id, id);
        assert_eq!(again.attempts, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fail_marks_permanently_failed_at_max_attempts() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "email", "p", 3).await.unwrap();
        let mut last = OutboxFate::Retry;
        for _ in 0..3 {
            dequeue(&db).await.unwrap().unwrap();
            last = fail(&db, id, "smtp down", Duration::ZERO).await.unwrap();
        }
        assert_eq!(last, OutboxFate::Failed);
        assert_eq!(status_of(&db, id).await, ("failed".to_string(), 3));
        assert!(dequeue(&db).await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn stale_processing_entry_is_reclaimed() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "email", "p", 5).await.unwrap();
        dequeue(&db).await.unwrap().unwrap();
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE notification_outbox
                     SET locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '-1 minutes')
                     WHERE id = ?1",
                    params![id],
                )
            })
            .await
            .unwrap();

        let reclaimed = dequeue(&db).await.unwrap().unwrap();
        assert_eq!(reclaimed.id, id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn dequeue_empty_outbox_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(dequeue(&db).await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
