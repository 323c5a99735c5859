// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reviewer set arithmetic shared by patches and reminder scans.

use std::collections::HashSet;

/// Order-preserving `wanted - excluded`, dropping repeats inside `wanted`.
fn ordered_difference(wanted: &[String], excluded: &[String]) -> Vec<String> {
    let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    wanted
        .iter()
        .filter(|w| !excluded.contains(w.as_str()) && seen.insert(w.as_str()))
        .cloned()
        .collect()
}

/// Who must be told about a review request.
///
/// An empty request means "no change" and notifies nobody. When nobody was
/// reviewing before, the whole request is notified. Otherwise only the
/// newly added reviewers are, in request order.
pub fn reviewer_notification_set(stored: &[String], requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return Vec::new();
    }
    ordered_difference(requested, stored)
}

/// Reviewers who have not yet reviewed, in reviewer order.
pub fn pending_reviewers(reviewers: &[String], reviewed_by: &[String]) -> Vec<String> {
    ordered_difference(reviewers, reviewed_by)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_request_notifies_everyone() {
        assert_eq!(
            reviewer_notification_set(&[], &v(&["a", "b"])),
            v(&["a", "b"])
        );
    }

    #[test]
    fn later_request_notifies_only_new_reviewers() {
        assert_eq!(
            reviewer_notification_set(&v(&["a", "b"]), &v(&["a", "c"])),
            v(&["c"])
        );
    }

    #[test]
    fn empty_request_notifies_nobody() {
        assert!(reviewer_notification_set(&v(&["a", "b"]), &[]).is_empty());
        assert!(reviewer_notification_set(&[], &[]).is_empty());
    }

    #[test]
    fn duplicate_requests_notify_once() {
        assert_eq!(
            reviewer_notification_set(&[], &v(&["a", "b", "a"])),
            v(&["a", "b"])
        );
    }

    #[test]
    fn pending_keeps_reviewer_order() {
        assert_eq!(
            pending_reviewers(&v(&["a", "b", "c"]), &v(&["a"])),
            v(&["b", "c"])
        );
        assert!(pending_reviewers(&v(&["a"]), &v(&["a", "z"])).is_empty());
    }

    proptest! {
        #[test]
        fn notified_reviewers_are_requested_and_new(
            stored in proptest::collection::vec("[a-e]", 0..5),
            requested in proptest::collection::vec("[a-e]", 0..5),
        ) {
            let notified = reviewer_notification_set(&stored, &requested);
            for who in &notified {
                prop_assert!(requested.contains(who));
                prop_assert!(!stored.contains(who));
            }
            let unique: HashSet<_> = notified.iter().collect();
            prop_assert_eq!(unique.len(), notified.len());
        }

        #[test]
        fn pending_is_an_ordered_subsequence(
            reviewers in proptest::collection::vec("[a-e]", 0..6),
            reviewed in proptest::collection::vec("[a-e]", 0..6),
        ) {
            let pending = pending_reviewers(&reviewers, &reviewed);
            let mut cursor = reviewers.iter();
            for who in &pending {
                prop_assert!(!reviewed.contains(who));
                prop_assert!(cursor.any(|r| r == who));
            }
        }
    }
}
