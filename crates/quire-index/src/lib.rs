// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Versioned document index for the Quire review service.
//!
//! The index is the service of record for document content fields. It lives
//! in its own SQLite file, independent of the relational store, and every
//! write is a compare-and-swap on a per-document version token.

mod migrations;
pub mod store;

pub use store::SqliteIndex;
