// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Quire service.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::QuireError;

/// Stable external identifier of a document, shared by both stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(pub String);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        ContentId(value.to_string())
    }
}

/// The already-authenticated identity (email) of the caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity(pub String);

impl CallerIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Index,
    Relational,
    Channel,
}

/// Review lifecycle status as held in the relational store.
///
/// The index store keeps the raw status string. Strings that do not match a
/// known status resolve to [`DocumentStatus::Unspecified`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum DocumentStatus {
    #[default]
    Unspecified,
    Draft,
    #[strum(serialize = "In-Review")]
    #[serde(rename = "In-Review")]
    InReview,
    Reviewed,
    Obsolete,
}

impl DocumentStatus {
    /// Resolves an index status string through the fixed status table.
    pub fn from_index_status(status: &str) -> Self {
        match status {
            "Draft" => DocumentStatus::Draft,
            "In-Review" => DocumentStatus::InReview,
            "Reviewed" => DocumentStatus::Reviewed,
            "Obsolete" => DocumentStatus::Obsolete,
            _ => DocumentStatus::Unspecified,
        }
    }

    /// Integer representation stored in the relational `documents.status` column.
    pub fn as_i64(self) -> i64 {
        match self {
            DocumentStatus::Unspecified => 0,
            DocumentStatus::Draft => 1,
            DocumentStatus::InReview => 2,
            DocumentStatus::Reviewed => 3,
            DocumentStatus::Obsolete => 4,
        }
    }

    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => DocumentStatus::Draft,
            2 => DocumentStatus::InReview,
            3 => DocumentStatus::Reviewed,
            4 => DocumentStatus::Obsolete,
            _ => DocumentStatus::Unspecified,
        }
    }
}

/// User role in the relational store.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum Role {
    #[default]
    Basic,
    Admin,
}

/// A document's representation in the index store.
///
/// Keys not modelled as typed fields (the document-type specific custom
/// fields) are kept at the top level of the JSON object, as the index
/// stores them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexedDocument {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub doc_type: String,
    pub doc_number: String,
    pub title: String,
    pub summary: String,
    pub status: String,
    pub owner: String,
    pub contributors: Vec<String>,
    pub reviewers: Vec<String>,
    pub reviewed_by: Vec<String>,
    pub changes_requested_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub product: String,
    pub team: String,
    pub project: String,
    pub created_time: i64,
    pub modified_time: i64,
    #[serde(flatten)]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

impl IndexedDocument {
    pub fn content_id(&self) -> ContentId {
        ContentId(self.object_id.clone())
    }
}

/// A value read from the index store together with its version token.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub document: T,
}

/// Filter for [`IndexStore::search`](crate::traits::IndexStore::search).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexQuery {
    pub status: Option<String>,
    pub doc_type: Option<String>,
}

impl IndexQuery {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            doc_type: None,
        }
    }
}

/// A raw search hit. Decoding is left to the caller so one malformed record
/// does not fail the whole query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHit {
    pub object_id: String,
    pub version: u64,
    pub body: String,
}

impl IndexHit {
    pub fn decode(&self) -> Result<IndexedDocument, QuireError> {
        serde_json::from_str(&self.body).map_err(|e| QuireError::Index {
            message: format!("malformed index record {}", self.object_id),
            source: Some(Box::new(e)),
        })
    }
}

/// A user row from the relational store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
}

impl UserRecord {
    /// Display name, falling back to the email address.
    pub fn display(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }
}

/// A document row from the relational store with its associations resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: i64,
    pub content_id: String,
    pub doc_type: String,
    pub doc_number: String,
    pub title: String,
    pub summary: String,
    pub status: DocumentStatus,
    pub owner: Option<String>,
    pub contributors: Vec<String>,
    pub reviewers: Vec<String>,
    pub reviewed_by: Vec<String>,
    pub changes_requested_by: Vec<String>,
    pub due_date: Option<String>,
    pub product: String,
    pub team: String,
    pub project: String,
    pub locked: bool,
    pub index_version: u64,
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

/// The relational projection of an indexed document.
///
/// Association lists replace the stored sets wholesale on upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentProjection {
    pub content_id: String,
    pub doc_type: String,
    pub doc_number: String,
    pub title: String,
    pub summary: String,
    pub status: DocumentStatus,
    pub owner: String,
    pub contributors: Vec<String>,
    pub reviewers: Vec<String>,
    pub reviewed_by: Vec<String>,
    pub changes_requested_by: Vec<String>,
    pub due_date: Option<String>,
    pub product: String,
    pub team: String,
    pub project: String,
    pub index_version: u64,
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

/// One entry of a user's recency list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentlyViewedDoc {
    pub document_id: i64,
    pub content_id: String,
    pub viewed_at: String,
}

/// A write-ahead record of a patch that has not yet reached the relational store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchIntent {
    /// Row id assigned when the intent is written; zero before that.
    pub id: i64,
    pub content_id: String,
    /// Index version the patch commits as.
    pub target_version: u64,
    /// Merged document JSON.
    pub payload: String,
    pub created_at: String,
}

/// A claimed outbox row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub id: i64,
    pub channel: String,
    pub payload: String,
    pub attempts: u32,
    pub max_attempts: u32,
}

/// What happened to an outbox entry after a failed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxFate {
    /// Scheduled for another attempt.
    Retry,
    /// Attempts exhausted; the entry is parked as failed.
    Failed,
}

/// Which message a notification renders.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum NotificationTemplate {
    ReviewRequested,
    ReviewReminder,
}

/// How a channel addresses recipients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ChannelKind {
    /// One message per recipient (email).
    Direct,
    /// One message mentioning every recipient (chat).
    Broadcast,
}

/// Payload for review-request and review-reminder notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewNotification {
    pub template: NotificationTemplate,
    pub base_url: String,
    pub document_owner: String,
    pub document_owner_email: String,
    pub document_type: String,
    pub document_short_name: String,
    pub document_title: String,
    pub document_url: String,
    pub document_product: String,
    pub document_team: String,
}

/// An outbox row waiting to be enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOutboxEntry {
    pub channel: String,
    pub payload: String,
}

/// The serialized body of an outbox row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub recipients: Vec<String>,
    pub notification: ReviewNotification,
}
