// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relational store trait: users, document associations, lock flags,
//! recency records and patch intents.

use async_trait::async_trait;

use crate::error::QuireError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ContentId, DocumentProjection, DocumentRecord, PatchIntent, RecentlyViewedDoc, Role,
    UserRecord,
};

/// Adapter for the transactional relational store.
#[async_trait]
pub trait RelationalStore: PluginAdapter {
    async fn get_document(&self, id: &ContentId) -> Result<Option<DocumentRecord>, QuireError>;

    async fn get_document_by_id(&self, id: i64) -> Result<Option<DocumentRecord>, QuireError>;

    /// The document's lock flag, or `None` when the document has no record.
    async fn is_locked(&self, id: &ContentId) -> Result<Option<bool>, QuireError>;

    /// Upserts the projection in one transaction.
    ///
    /// Referenced users are found or created and has-many associations are
    /// replaced with the projection's sets. A projection older than the
    /// stored `index_version` is ignored. Intents for the document whose
    /// target version is at or below the projection's are deleted. Returns
    /// the document's row id.
    async fn upsert_document(&self, projection: &DocumentProjection) -> Result<i64, QuireError>;

    /// Records a patch intent and returns its id.
    async fn write_intent(&self, intent: &PatchIntent) -> Result<i64, QuireError>;

    /// Deletes exactly the intent with this id.
    async fn delete_intent(&self, intent_id: i64) -> Result<(), QuireError>;

    /// All dangling intents, oldest first.
    async fn list_intents(&self) -> Result<Vec<PatchIntent>, QuireError>;

    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>, QuireError>;

    async fn find_or_create_user(&self, email: &str) -> Result<UserRecord, QuireError>;

    /// Sets an existing user's role. Returns `false` when the user is unknown.
    async fn set_role(&self, email: &str, role: Role) -> Result<bool, QuireError>;

    /// The user's recency list, most recent first.
    async fn recently_viewed(&self, user_id: i64) -> Result<Vec<RecentlyViewedDoc>, QuireError>;

    /// Replaces the user's recency association with exactly these documents.
    ///
    /// Entries for documents already in the set keep their `viewed_at`.
    async fn replace_recently_viewed(
        &self,
        user_id: i64,
        document_ids: &[i64],
    ) -> Result<(), QuireError>;

    async fn touch_recently_viewed(
        &self,
        user_id: i64,
        document_id: i64,
        viewed_at: &str,
    ) -> Result<(), QuireError>;
}
