// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repairs patches that reached the index store but not the relational store.

use std::sync::Arc;

use quire_core::types::PatchIntent;
use quire_core::{ContentId, IndexStore, QuireError, RelationalStore};
use tracing::{error, info, warn};

use crate::projection::project;

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Intents whose index write landed; the projection was re-applied.
    pub repaired: usize,
    /// Intents whose index write never happened; cleared.
    pub discarded: usize,
    /// Intents that could not be processed and were left in place.
    pub failed: usize,
}

pub struct Reconciler {
    index: Arc<dyn IndexStore>,
    relational: Arc<dyn RelationalStore>,
}

enum Resolution {
    Repaired,
    Discarded,
}

impl Reconciler {
    pub fn new(index: Arc<dyn IndexStore>, relational: Arc<dyn RelationalStore>) -> Self {
        Self { index, relational }
    }

    /// Walks every dangling intent once, oldest first.
    ///
    /// A failing intent is logged and kept for the next pass.
    pub async fn run_once(&self) -> Result<ReconcileReport, QuireError> {
        let intents = self.relational.list_intents().await?;
        let mut report = ReconcileReport::default();
        for intent in &intents {
            match self.resolve(intent).await {
                Ok(Resolution::Repaired) => report.repaired += 1,
                Ok(Resolution::Discarded) => report.discarded += 1,
                Err(e) => {
                    error!(doc_id = %intent.content_id, error = %e, "intent reconciliation failed");
                    report.failed += 1;
                }
            }
        }
        if !intents.is_empty() {
            info!(
                repaired = report.repaired,
                discarded = report.discarded,
                failed = report.failed,
                "reconciliation pass complete"
            );
        }
        Ok(report)
    }

    async fn resolve(&self, intent: &PatchIntent) -> Result<Resolution, QuireError> {
        let id = ContentId(intent.content_id.clone());
        match self.index.get(&id).await? {
            Some(current) if current.version >= intent.target_version => {
                self.relational
                    .upsert_document(&project(&current.document, current.version))
                    .await?;
                Ok(Resolution::Repaired)
            }
            _ => {
                warn!(doc_id = %id, intent_id = intent.id, target_version = intent.target_version, "index write never landed, dropping intent");
                self.relational.delete_intent(intent.id).await?;
                Ok(Resolution::Discarded)
            }
        }
    }
}
