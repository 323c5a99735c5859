// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands: `reconcile`, `remind`, `config` and `admin`.

use quire_config::model::QuireConfig;
use quire_core::QuireError;
use quire_scheduler::ScanOutcome;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::app::App;
use crate::shutdown;

const REDACTED: &str = "[redacted]";

/// Repairs dangling patch intents once.
pub async fn run_reconcile(config: QuireConfig) -> Result<(), QuireError> {
    let app = App::open(config).await?;
    let result = app.reconciler.run_once().await;
    app.close().await;
    let report = result?;
    println!(
        "reconcile: {} repaired, {} discarded, {} failed",
        report.repaired, report.discarded, report.failed
    );
    Ok(())
}

/// Runs one reminder scan regardless of `reminders.enabled`, then delivers
/// whatever is due on the outbox.
pub async fn run_remind(config: QuireConfig) -> Result<(), QuireError> {
    let app = App::open(config).await?;
    let cancel = shutdown::install_signal_handler();
    let result = remind(&app, &cancel).await;
    cancel.cancel();
    app.close().await;
    result
}

async fn remind(app: &App, cancel: &CancellationToken) -> Result<(), QuireError> {
    let scheduler = app.scheduler()?;
    let report = match scheduler.run_now(cancel).await? {
        ScanOutcome::Completed(report) => report,
        ScanOutcome::Skipped => return Ok(()),
    };
    info!(
        documents = report.documents,
        reminded = report.reminded,
        enqueued = report.enqueued,
        failed = report.failed,
        "reminder scan complete"
    );
    let drained = app.dispatcher().drain_once(cancel).await?;
    println!(
        "remind: {} in review, {} reminded, {} delivered, {} retrying, {} failed",
        report.documents, report.reminded, drained.delivered, drained.retried, drained.failed
    );
    Ok(())
}

/// Gives an existing user the admin role, for bootstrapping the first admin.
pub async fn run_admin_grant(config: QuireConfig, email: &str) -> Result<(), QuireError> {
    let app = App::open(config).await?;
    let result = app.service.roles().grant_admin(email).await;
    app.close().await;
    result?;
    println!("admin: {} is now an admin", email.trim());
    Ok(())
}

/// Prints the effective configuration as TOML with secrets masked.
pub fn run_config(config: &QuireConfig) -> Result<(), QuireError> {
    println!("{}", render_config(config)?);
    Ok(())
}

fn render_config(config: &QuireConfig) -> Result<String, QuireError> {
    let mut shown = config.clone();
    if shown.server.proxy_token.is_some() {
        shown.server.proxy_token = Some(REDACTED.to_string());
    }
    if let Some(email) = shown.notifications.email.as_mut()
        && email.password.is_some()
    {
        email.password = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| QuireError::Internal(format!("cannot render configuration: {e}")))
}
