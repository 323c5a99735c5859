// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorization gate for document mutations.

use quire_core::types::IndexedDocument;
use quire_core::{CallerIdentity, QuireError};

/// True iff the caller is the owner, a contributor, or a reviewer.
///
/// Identities are compared by exact string equality.
pub fn may_edit(
    caller: &CallerIdentity,
    owner: &str,
    contributors: &[String],
    reviewers: &[String],
) -> bool {
    let who = caller.as_str();
    who == owner
        || contributors.iter().any(|c| c == who)
        || reviewers.iter().any(|r| r == who)
}

/// Rejects callers who may not mutate `doc` with [`QuireError::Unauthorized`].
pub fn authorize(caller: &CallerIdentity, doc: &IndexedDocument) -> Result<(), QuireError> {
    if may_edit(caller, &doc.owner, &doc.contributors, &doc.reviewers) {
        Ok(())
    } else {
        Err(QuireError::Unauthorized(format!(
            "{caller} is not an owner, contributor, or reviewer of document {}",
            doc.object_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn doc() -> IndexedDocument {
        IndexedDocument {
            object_id: "d1".into(),
            owner: "o@x".into(),
            contributors: vec!["c@x".into()],
            reviewers: vec!["r@x".into()],
            ..Default::default()
        }
    }

    #[test]
    fn owner_contributor_and_reviewer_are_allowed() {
        for who in ["o@x", "c@x", "r@x"] {
            assert!(authorize(&CallerIdentity(who.into()), &doc()).is_ok(), "{who}");
        }
    }

    #[test]
    fn outsider_is_unauthorized_not_not_found() {
        let err = authorize(&CallerIdentity("eve@x".into()), &doc()).unwrap_err();
        assert!(matches!(err, QuireError::Unauthorized(_)));
    }

    #[test]
    fn comparison_is_exact() {
        assert!(authorize(&CallerIdentity("O@X".into()), &doc()).is_err());
        assert!(authorize(&CallerIdentity(" o@x".into()), &doc()).is_err());
    }

    #[test]
    fn reviewed_by_membership_alone_is_not_enough() {
        let mut d = doc();
        d.reviewed_by = vec!["past@x".into()];
        assert!(authorize(&CallerIdentity("past@x".into()), &d).is_err());
    }

    proptest! {
        #[test]
        fn strangers_are_always_denied(
            owner in "[a-z]{1,6}@x",
            contributors in proptest::collection::vec("[a-z]{1,6}@x", 0..4),
            reviewers in proptest::collection::vec("[a-z]{1,6}@x", 0..4),
            stranger in "[a-z]{1,6}@y",
        ) {
            let caller = CallerIdentity(stranger);
            prop_assert!(!may_edit(&caller, &owner, &contributors, &reviewers));
        }
    }
}
