// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User lookup, found-or-created resolution by email, and role changes.

use std::str::FromStr;

use quire_core::QuireError;
use quire_core::types::{Role, UserRecord};
use rusqlite::{OptionalExtension, params};

use crate::database::Database;

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    let role: String = row.get(3)?;
    Ok(UserRecord {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        role: Role::from_str(&role).unwrap_or_default(),
    })
}

pub(crate) fn select_user(
    conn: &rusqlite::Connection,
    email: &str,
) -> rusqlite::Result<Option<UserRecord>> {
    conn.query_row(
        "SELECT id, email, display_name, role FROM users WHERE email = ?1",
        params![email],
        row_to_user,
    )
    .optional()
}

/// Returns the id of the user with this email, inserting a Basic user if absent.
///
/// Runs on whatever connection or transaction the caller holds, so document
/// upserts resolve people inside their own transaction.
pub(crate) fn resolve_user_id(conn: &rusqlite::Connection, email: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (email) VALUES (?1) ON CONFLICT(email) DO NOTHING",
        params![email],
    )?;
    conn.query_row(
        "SELECT id FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )
}

/// Get a user by email (case-insensitive).
pub async fn get_user(db: &Database, email: &str) -> Result<Option<UserRecord>, QuireError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| select_user(conn, &email))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find the user with this email, creating a Basic user if none exists.
pub async fn find_or_create_user(db: &Database, email: &str) -> Result<UserRecord, QuireError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            resolve_user_id(&tx, &email)?;
            let user = select_user(&tx, &email)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(user)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set a user's display name, creating the user if needed.
pub async fn set_display_name(
    db: &Database,
    email: &str,
    display_name: Option<&str>,
) -> Result<(), QuireError> {
    let email = email.to_string();
    let display_name = display_name.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let id = resolve_user_id(&tx, &email)?;
            tx.execute(
                "UPDATE users SET display_name = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![display_name, id],
            )?;
            tx.commit()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the role of an existing user. Returns `false` when no user has this email.
pub async fn set_role(db: &Database, email: &str, role: Role) -> Result<bool, QuireError> {
    let email = email.to_string();
    let role = role.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET role = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE email = ?2",
                params![role, email],
            )?;
            Ok(changed > 0)
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

    #[tokio::test]
    async fn missing_user_is_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_user(&db, "nobody@x").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn find_or_create_is_stable_and_case_insensitive() {
        let (db, _dir) = setup_db().await;

        let first = find_or_create_user(&db, "Ann@Example.com").await.unwrap();
        let again = find_or_create_user(&db, "ann@example.com").await.unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(first.role, Role::Basic);
        assert!(first.display_name.is_none());

        let fetched = get_user(&db, "ANN@EXAMPLE.COM").await.unwrap().unwrap();
        assert_eq!(fetched.id, first.id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn display_name_is_recorded() {
        let (db, _dir) = setup_db().await;
        set_display_name(&db, "o@x", Some("Olive")).await.unwrap();
        let user = get_user(&db, "o@x").await.unwrap().unwrap();
        assert_eq!(user.display(), "Olive");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn role_change_needs_an_existing_user() {
        let (db, _dir) = setup_db().await;
        assert!(!set_role(&db, "ghost@x", Role::Admin).await.unwrap());
        assert!(get_user(&db, "ghost@x").await.unwrap().is_none());

        find_or_create_user(&db, "ann@x").await.unwrap();
        assert!(set_role(&db, "ANN@x", Role::Admin).await.unwrap());
        let user = get_user(&db, "ann@x").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);

        // Being referenced by a later document does not demote.
        find_or_create_user(&db, "ann@x").await.unwrap();
        assert_eq!(get_user(&db, "ann@x").await.unwrap().unwrap().role, Role::Admin);
        db.close().await.unwrap();
    }
}
