// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quire serve` command implementation.
//!
//! Opens both stores, repairs any patch left half-applied by a previous
//! run, then runs the HTTP gateway, the outbox dispatcher and the reminder
//! scheduler until SIGINT or SIGTERM.

use std::sync::Arc;

use quire_config::model::QuireConfig;
use quire_core::QuireError;
use quire_gateway::GatewayState;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::app::App;
use crate::shutdown;

/// Runs the `quire serve` command.
pub async fn run_serve(config: QuireConfig) -> Result<(), QuireError> {
    info!("starting quire serve");
    let app = App::open(config).await?;
    let cancel = shutdown::install_signal_handler();
    let result = serve(&app, cancel).await;
    app.close().await;
    info!("quire serve shutdown complete");
    result
}

async fn serve(app: &App, cancel: CancellationToken) -> Result<(), QuireError> {
    match app.reconciler.run_once().await {
        Ok(report) if report.repaired + report.discarded + report.failed > 0 => info!(
            repaired = report.repaired,
            discarded = report.discarded,
            failed = report.failed,
            "startup reconciliation complete"
        ),
        Ok(_) => {}
        Err(e) => error!(error = %e, "startup reconciliation failed"),
    }

    if !app.notifier.enabled() {
        info!("notifications disabled, review requests and reminders will not be enqueued");
    }

    let scheduler = Arc::new(app.scheduler()?);
    let dispatcher = Arc::new(app.dispatcher());
    let dispatcher_task = tokio::spawn(dispatcher.run(cancel.clone()));
    let scheduler_handle = scheduler.start(&cancel);

    let state = GatewayState {
        service: app.service.clone(),
    };
    let served = quire_gateway::serve(&app.config.server, state, cancel.clone()).await;
    if served.is_err() {
        cancel.cancel();
    }

    scheduler_handle.stop().await;
    if let Err(e) = dispatcher_task.await {
        warn!(error = %e, "outbox dispatcher task ended abnormally");
    }
    served
}
