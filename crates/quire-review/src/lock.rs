// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lock gate for document mutations.

use std::sync::Arc;

use async_trait::async_trait;
use quire_core::{ContentId, QuireError, RelationalStore};

/// A lock signal coming from outside the relational store, such as the
/// authoring platform holding the document open.
#[async_trait]
pub trait LockSignal: Send + Sync + 'static {
    async fn is_locked(&self, id: &ContentId) -> Result<bool, QuireError>;
}

/// Refuses mutations of documents whose lock flag is set.
///
/// A document with no relational record counts as unlocked. Read paths do
/// not consult the gate.
#[derive(Clone)]
pub struct LockGate {
    relational: Arc<dyn RelationalStore>,
    external: Option<Arc<dyn LockSignal>>,
}

impl LockGate {
    pub fn new(relational: Arc<dyn RelationalStore>) -> Self {
        Self {
            relational,
            external: None,
        }
    }

    pub fn with_signal(mut self, signal: Arc<dyn LockSignal>) -> Self {
        self.external = Some(signal);
        self
    }

    pub async fn is_locked(&self, id: &ContentId) -> Result<bool, QuireError> {
        if self.relational.is_locked(id).await?.unwrap_or(false) {
            return Ok(true);
        }
        match &self.external {
            Some(signal) => signal.is_locked(id).await,
            None => Ok(false),
        }
    }

    /// Returns [`QuireError::Locked`] if the document may not be mutated.
    pub async fn check(&self, id: &ContentId) -> Result<(), QuireError> {
        if self.is_locked(id).await? {
            Err(QuireError::Locked(format!("document {id} is locked")))
        } else {
            Ok(())
        }
    }
}
