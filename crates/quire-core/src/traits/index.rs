// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Index store trait: the service of record for document content fields.

use async_trait::async_trait;

use crate::error::QuireError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ContentId, IndexHit, IndexQuery, IndexedDocument, Versioned};

/// Adapter for the document index.
#[async_trait]
pub trait IndexStore: PluginAdapter {
    /// Loads a document by content-ID. `Ok(None)` means the document does not exist.
    async fn get(&self, id: &ContentId) -> Result<Option<Versioned<IndexedDocument>>, QuireError>;

    /// Saves a document and returns its new version once the write is durable.
    ///
    /// `expected_version` must equal the currently stored version, or `0` for
    /// a document that does not exist yet. Otherwise nothing is written and
    /// [`QuireError::Conflict`] is returned.
    async fn save(&self, doc: &IndexedDocument, expected_version: u64) -> Result<u64, QuireError>;

    /// Returns every document matching the filter, undecoded.
    async fn search(&self, query: &IndexQuery) -> Result<Vec<IndexHit>, QuireError>;
}
