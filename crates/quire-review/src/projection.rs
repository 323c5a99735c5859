// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Index representation to relational projection.

use quire_core::types::{DocumentProjection, DocumentStatus, IndexedDocument};

/// Projects an indexed document at `version` for the relational upsert.
///
/// The status string goes through the fixed status table; strings it does
/// not know become [`DocumentStatus::Unspecified`].
pub fn project(doc: &IndexedDocument, version: u64) -> DocumentProjection {
    DocumentProjection {
        content_id: doc.object_id.clone(),
        doc_type: doc.doc_type.clone(),
        doc_number: doc.doc_number.clone(),
        title: doc.title.clone(),
        summary: doc.summary.clone(),
        status: DocumentStatus::from_index_status(&doc.status),
        owner: doc.owner.clone(),
        contributors: doc.contributors.clone(),
        reviewers: doc.reviewers.clone(),
        reviewed_by: doc.reviewed_by.clone(),
        changes_requested_by: doc.changes_requested_by.clone(),
        due_date: doc.due_date.clone(),
        product: doc.product.clone(),
        team: doc.team.clone(),
        project: doc.project.clone(),
        index_version: version,
        custom_fields: doc.custom_fields.clone(),
    }
}
