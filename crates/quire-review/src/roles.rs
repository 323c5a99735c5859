// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin role checks and grants.

use std::sync::Arc;

use quire_core::types::Role;
use quire_core::{CallerIdentity, QuireError, RelationalStore};
use tracing::info;

/// Reads and changes user roles in the relational store.
pub struct RoleGate {
    relational: Arc<dyn RelationalStore>,
}

impl RoleGate {
    pub fn new(relational: Arc<dyn RelationalStore>) -> Self {
        Self { relational }
    }

    /// Fails with `Forbidden` unless the caller is a known admin.
    pub async fn require_admin(&self, caller: &CallerIdentity) -> Result<(), QuireError> {
        match self.relational.get_user(caller.as_str()).await? {
            Some(user) if user.role == Role::Admin => Ok(()),
            _ => Err(QuireError::Forbidden(
                "you must be an admin to perform this action".to_string(),
            )),
        }
    }

    /// Makes an existing user an admin. Granting twice is not an error.
    pub async fn grant_admin(&self, email: &str) -> Result<(), QuireError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(QuireError::BadRequest("email must not be empty".to_string()));
        }
        if !self.relational.set_role(email, Role::Admin).await? {
            return Err(QuireError::NotFound(format!("user {email}")));
        }
        info!(user = %email, "user is now an admin");
        Ok(())
    }
}
