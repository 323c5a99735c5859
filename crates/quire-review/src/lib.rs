// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document review state-transition handling.
//!
//! Gates (authorization, lock), the per-type patch field table, the
//! two-store patch sequence with its write-ahead intent and reconciler,
//! reviewer diffing, recently-viewed tracking, notification enqueueing and
//! admin role management.

pub mod authz;
pub mod diff;
pub mod fields;
pub mod lock;
pub mod notifier;
pub mod patch;
pub mod projection;
pub mod recency;
pub mod reconcile;
pub mod roles;
pub mod service;

pub use authz::{authorize, may_edit};
pub use diff::{pending_reviewers, reviewer_notification_set};
pub use fields::{DocumentPatch, FieldSpec, FieldTable};
pub use lock::{LockGate, LockSignal};
pub use notifier::{ChannelRoute, NotifierSettings, ReviewNotifier, document_url};
pub use patch::{PatchApplier, PatchOutcome};
pub use projection::project;
pub use recency::{RECENTLY_VIEWED_LIMIT, RecentlyViewedTracker};
pub use reconcile::{ReconcileReport, Reconciler};
pub use roles::RoleGate;
pub use service::{DocumentService, DocumentView};
