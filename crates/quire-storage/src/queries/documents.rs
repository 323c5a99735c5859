// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document projection upsert and lookups.
//!
//! Person associations and custom fields are replaced as whole sets on
//! every upsert, so members dropped from a list are actually removed.

use std::collections::BTreeMap;

use quire_core::QuireError;
use quire_core::types::{DocumentProjection, DocumentRecord, DocumentStatus};
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::queries::users::resolve_user_id;

const CONTRIBUTOR: &str = "contributor";
const REVIEWER: &str = "reviewer";
const REVIEWED_BY: &str = "reviewed_by";
const CHANGES_REQUESTED_BY: &str = "changes_requested_by";

const SELECT_DOCUMENT: &str = "SELECT d.id, d.content_id, d.doc_type, d.doc_number, d.title,
        d.summary, d.status, u.email, d.due_date, d.product, d.team, d.project,
        d.locked, d.index_version
     FROM documents d LEFT JOIN users u ON u.id = d.owner_id";

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRecord> {
    let version: i64 = row.get(13)?;
    Ok(DocumentRecord {
        id: row.get(0)?,
        content_id: row.get(1)?,
        doc_type: row.get(2)?,
        doc_number: row.get(3)?,
        title: row.get(4)?,
        summary: row.get(5)?,
        status: DocumentStatus::from_i64(row.get(6)?),
        owner: row.get(7)?,
        contributors: Vec::new(),
        reviewers: Vec::new(),
        reviewed_by: Vec::new(),
        changes_requested_by: Vec::new(),
        due_date: row.get(8)?,
        product: row.get(9)?,
        team: row.get(10)?,
        project: row.get(11)?,
        locked: row.get(12)?,
        index_version: u64::try_from(version).unwrap_or_default(),
        custom_fields: BTreeMap::new(),
    })
}

fn people(
    conn: &rusqlite::Connection,
    document_id: i64,
    relation: &str,
) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT u.email FROM document_people p JOIN users u ON u.id = p.user_id
         WHERE p.document_id = ?1 AND p.relation = ?2
         ORDER BY p.position ASC",
    )?;
    let rows = stmt.query_map(params![document_id, relation], |row| row.get(0))?;
    rows.collect()
}

fn custom_fields(
    conn: &rusqlite::Connection,
    document_id: i64,
) -> rusqlite::Result<BTreeMap<String, serde_json::Value>> {
    let mut stmt = conn.prepare_cached(
        "SELECT name, value FROM document_custom_fields WHERE document_id = ?1",
    )?;
    let rows = stmt.query_map(params![document_id], |row| {
        let name: String = row.get(0)?;
        let raw: String = row.get(1)?;
        let value = serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok((name, value))
    })?;
    rows.collect()
}

fn select_document(
    conn: &rusqlite::Connection,
    filter: &str,
    param: &dyn rusqlite::ToSql,
) -> rusqlite::Result<Option<DocumentRecord>> {
    let sql = format!("{SELECT_DOCUMENT} WHERE {filter}");
    let Some(mut doc) = conn.query_row(&sql, [param], row_to_document).optional()? else {
        return Ok(None);
    };
    doc.contributors = people(conn, doc.id, CONTRIBUTOR)?;
    doc.reviewers = people(conn, doc.id, REVIEWER)?;
    doc.reviewed_by = people(conn, doc.id, REVIEWED_BY)?;
    doc.changes_requested_by = people(conn, doc.id, CHANGES_REQUESTED_BY)?;
    doc.custom_fields = custom_fields(conn, doc.id)?;
    Ok(Some(doc))
}

fn replace_people(
    tx: &rusqlite::Transaction<'_>,
    document_id: i64,
    relation: &str,
    emails: &[String],
) -> rusqlite::Result<()> {
    tx.execute(
        "DELETE FROM document_people WHERE document_id = ?1 AND relation = ?2",
        params![document_id, relation],
    )?;
    for (position, email) in emails.iter().enumerate() {
        let user_id = resolve_user_id(tx, email)?;
        tx.execute(
            "INSERT OR IGNORE INTO document_people (document_id, user_id, relation, position)
             VALUES (?1, ?2, ?3, ?4)",
            params![document_id, user_id, relation, position as i64],
        )?;
    }
    Ok(())
}

/// Get a document by content-ID, with associations resolved.
pub async fn get_document(
    db: &Database,
    content_id: &str,
) -> Result<Option<DocumentRecord>, QuireError> {
    let content_id = content_id.to_string();
    db.connection()
        .call(move |conn| select_document(conn, "d.content_id = ?1", &content_id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a document by row id, with associations resolved.
pub async fn get_document_by_id(
    db: &Database,
    id: i64,
) -> Result<Option<DocumentRecord>, QuireError> {
    db.connection()
        .call(move |conn| select_document(conn, "d.id = ?1", &id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// The lock flag, or `None` when the document has no record.
pub async fn is_locked(db: &Database, content_id: &str) -> Result<Option<bool>, QuireError> {
    let content_id = content_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT locked FROM documents WHERE content_id = ?1",
                params![content_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the lock flag on an existing document. Returns false if there is no record.
pub async fn set_locked(db: &Database, content_id: &str, locked: bool) -> Result<bool, QuireError> {
    let content_id = content_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE documents SET locked = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE content_id = ?2",
                params![locked, content_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Upsert a document projection in a single transaction.
///
/// Owner and association members are found or created as users. The
/// `locked` flag is never touched here. A projection older than the stored
/// one leaves the record alone. Patch intents whose target version the
/// projection covers are deleted in the same transaction.
pub async fn upsert_document(
    db: &Database,
    projection: &DocumentProjection,
) -> Result<i64, QuireError> {
    let p = projection.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let version = i64::try_from(p.index_version).unwrap_or(i64::MAX);

            tx.execute(
                "DELETE FROM patch_intents WHERE content_id = ?1 AND target_version <= ?2",
                params![p.content_id, version],
            )?;

            let stored: Option<(i64, i64)> = tx
                .query_row(
                    "SELECT id, index_version FROM documents WHERE content_id = ?1",
                    params![p.content_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            if let Some((document_id, stored_version)) = stored
                && stored_version > version
            {
                tx.commit()?;
                return Ok(document_id);
            }

            let owner_id = if p.owner.is_empty() {
                None
            } else {
                Some(resolve_user_id(&tx, &p.owner)?)
            };

            let document_id: i64 = tx.query_row(
                "INSERT INTO documents (content_id, doc_type, doc_number, title, summary,
                     status, owner_id, due_date, product, team, project, index_version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(content_id) DO UPDATE SET
                     doc_type = excluded.doc_type,
                     doc_number = excluded.doc_number,
                     title = excluded.title,
                     summary = excluded.summary,
                     status = excluded.status,
                     owner_id = excluded.owner_id,
                     due_date = excluded.due_date,
                     product = excluded.product,
                     team = excluded.team,
                     project = excluded.project,
                     index_version = excluded.index_version,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 RETURNING id",
                params![
                    p.content_id,
                    p.doc_type,
                    p.doc_number,
                    p.title,
                    p.summary,
                    p.status.as_i64(),
                    owner_id,
                    p.due_date,
                    p.product,
                    p.team,
                    p.project,
                    version,
                ],
                |row| row.get(0),
            )?;

            replace_people(&tx, document_id, CONTRIBUTOR, &p.contributors)?;
            replace_people(&tx, document_id, REVIEWER, &p.reviewers)?;
            replace_people(&tx, document_id, REVIEWED_BY, &p.reviewed_by)?;
            replace_people(&tx, document_id, CHANGES_REQUESTED_BY, &p.changes_requested_by)?;

            tx.execute(
                "DELETE FROM document_custom_fields WHERE document_id = ?1",
                params![document_id],
            )?;
            for (name, value) in &p.custom_fields {
                tx.execute(
                    "INSERT INTO document_custom_fields (document_id, name, value)
                     VALUES (?1, ?2, ?3)",
                    params![document_id, name, value.to_string()],
                )?;
            }

            tx.commit()?;
            Ok(document_id)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
