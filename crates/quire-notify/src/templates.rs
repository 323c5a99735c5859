// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text renderings of review notifications.

use quire_core::types::{NotificationTemplate, ReviewNotification};

/// A rendered message, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub subject: String,
    pub body: String,
}

fn doc_label(n: &ReviewNotification) -> String {
    if n.document_short_name.is_empty() {
        n.document_title.clone()
    } else {
        format!("[{}] {}", n.document_short_name, n.document_title)
    }
}

fn details(n: &ReviewNotification) -> String {
    let mut lines = vec![
        format!("Type: {}", n.document_type),
        format!("Owner: {} <{}>", n.document_owner, n.document_owner_email),
    ];
    if !n.document_product.is_empty() {
        lines.push(format!("Product: {}", n.document_product));
    }
    if !n.document_team.is_empty() {
        lines.push(format!("Team: {}", n.document_team));
    }
    lines.join("\n")
}

/// Email subject and body.
pub fn render_email(n: &ReviewNotification) -> Rendered {
    let label = doc_label(n);
    match n.template {
        NotificationTemplate::ReviewRequested => Rendered {
            subject: format!("Document review requested for {label}"),
            body: format!(
                "{} has requested your review of {label}.\n\n{}\n\nOpen the document: {}\n\n-- \nQuire {}\n",
                n.document_owner,
                details(n),
                n.document_url,
                n.base_url,
            ),
        },
        NotificationTemplate::ReviewReminder => Rendered {
            subject: format!("Reminder: {label} is waiting for your review"),
            body: format!(
                "{label} from {} is still waiting for your review.\n\n{}\n\nOpen the document: {}\n\n-- \nQuire {}\n",
                n.document_owner,
                details(n),
                n.document_url,
                n.base_url,
            ),
        },
    }
}

/// One chat line addressed to every recipient.
pub fn render_chat(n: &ReviewNotification, recipients: &[String]) -> String {
    let mentions = recipients
        .iter()
        .map(|r| format!("@{r}"))
        .collect::<Vec<_>>()
        .join(" ");
    let label = doc_label(n);
    let action = match n.template {
        NotificationTemplate::ReviewRequested => "review requested",
        NotificationTemplate::ReviewReminder => "review reminder",
    };
    format!(
        "{mentions} {action}: <{}|{label}> ({}, owner {})",
        n.document_url, n.document_type, n.document_owner
    )
}
