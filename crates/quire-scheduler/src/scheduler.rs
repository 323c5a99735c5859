// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily reminder scheduler with an explicit start/stop lifecycle.
//!
//! On start the scheduler sleeps until the next configured time of day,
//! scans once, then scans every 24 hours. Each scan runs as its own task so
//! the ticks stay on the configured time of day; a tick that arrives while
//! the previous scan is still running is logged and skipped. Restarting
//! re-arms the wait from scratch; nothing about past runs is persisted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::NaiveTime;
use quire_config::model::RemindersConfig;
use quire_config::parse_time_of_day;
use quire_core::{Clock, IndexStore, QuireError};
use quire_review::{Reconciler, ReviewNotifier};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, warn};

use crate::scan::{ReminderScan, ScanReport};
use crate::timing::duration_until_next;

/// Interval between scans once the first one has run.
pub const TICK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(ScanReport),
    /// Another scan was still running.
    Skipped,
}

/// Clears the in-progress flag when a scan ends, however it ends.
struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ReminderScheduler {
    enabled: bool,
    time_of_day: NaiveTime,
    clock: Arc<dyn Clock>,
    scan: ReminderScan,
    reconciler: Option<Arc<Reconciler>>,
    scanning: AtomicBool,
}

impl ReminderScheduler {
    pub fn new(
        config: &RemindersConfig,
        clock: Arc<dyn Clock>,
        index: Arc<dyn IndexStore>,
        notifier: Arc<ReviewNotifier>,
        reconciler: Option<Arc<Reconciler>>,
    ) -> Result<Self, QuireError> {
        let time_of_day = parse_time_of_day(&config.time_of_day).ok_or_else(|| {
            QuireError::Config(format!(
                "reminders.time_of_day {:?} is not HH:MM",
                config.time_of_day
            ))
        })?;
        Ok(Self {
            enabled: config.enabled,
            time_of_day,
            clock,
            scan: ReminderScan::new(index, notifier),
            reconciler,
            scanning: AtomicBool::new(false),
        })
    }

    /// How long a scheduler started now would wait before its first scan.
    pub fn first_wait(&self) -> Duration {
        duration_until_next(self.clock.now_local(), self.time_of_day)
    }

    /// Repairs dangling patch intents, then scans, unless a scan is
    /// already in progress.
    pub async fn run_now(&self, cancel: &CancellationToken) -> Result<ScanOutcome, QuireError> {
        if self.scanning.swap(true, Ordering::AcqRel) {
            warn!("previous reminder scan still running, skipping this one");
            return Ok(ScanOutcome::Skipped);
        }
        let _guard = ScanGuard(&self.scanning);
        if let Some(reconciler) = &self.reconciler
            && let Err(e) = reconciler.run_once().await
        {
            error!(error = %e, "reconciliation before reminder scan failed");
        }
        let report = self.scan.run(cancel).await?;
        Ok(ScanOutcome::Completed(report))
    }

    async fn tick(&self, cancel: &CancellationToken) {
        match self.run_now(cancel).await {
            Ok(ScanOutcome::Completed(report)) => info!(
                documents = report.documents,
                reminded = report.reminded,
                enqueued = report.enqueued,
                failed = report.failed,
                cancelled = report.cancelled,
                "reminder scan complete"
            ),
            Ok(ScanOutcome::Skipped) => {}
            Err(e) => error!(error = %e, "reminder scan failed"),
        }
    }

    /// Spawns the scheduling loop. It stops when `cancel` or the handle does.
    pub fn start(self: Arc<Self>, cancel: &CancellationToken) -> SchedulerHandle {
        let token = cancel.child_token();
        let join = tokio::spawn(self.run(token.clone()).in_current_span());
        SchedulerHandle {
            cancel: token,
            join,
        }
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        if !self.enabled {
            info!("review reminders disabled");
            return;
        }

        let wait = self.first_wait();
        info!(time_of_day = %self.time_of_day, wait_secs = wait.as_secs(), "reminder scheduler armed");
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("reminder scheduler stopped before first scan");
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<()>> = None;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if in_flight.as_ref().is_some_and(|scan| !scan.is_finished()) {
                        warn!(
                            interval_secs = TICK_INTERVAL.as_secs(),
                            "previous reminder scan still running, skipping this tick"
                        );
                        continue;
                    }
                    let this = self.clone();
                    let cancel = cancel.clone();
                    in_flight = Some(tokio::spawn(
                        async move { this.tick(&cancel).await }.in_current_span(),
                    ));
                }
            }
        }
        if let Some(scan) = in_flight
            && let Err(e) = scan.await
        {
            warn!(error = %e, "reminder scan task ended abnormally");
        }
        info!("reminder scheduler stopped");
    }
}

/// Owns the running scheduler task.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Cancels the loop and waits for it to finish its current document.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            warn!(error = %e, "reminder scheduler task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::RelationalStore;
    use quire_test_utils::{FakeClock, MemoryIndex, TestHarness, document};

    fn config(enabled: bool) -> RemindersConfig {
        RemindersConfig {
            enabled,
            time_of_day: "10:00".into(),
        }
    }

    /// A scheduler whose scans only touch memory, so paused time stays exact.
    async fn scheduler(
        enabled: bool,
        clock: FakeClock,
    ) -> (Arc<ReminderScheduler>, Arc<MemoryIndex>, TestHarness) {
        let h = TestHarness::builder()
            .notifications_enabled(false)
            .build()
            .await
            .unwrap();
        let index = Arc::new(MemoryIndex::new());
        let scheduler = ReminderScheduler::new(
            &config(enabled),
            Arc::new(clock),
            index.clone(),
            h.notifier.clone(),
            None,
        )
        .unwrap();
        (Arc::new(scheduler), index, h)
    }

    #[tokio::test(start_paused = true)]
    async fn first_scan_waits_for_time_of_day_then_repeats_daily() {
        let (scheduler, index, _h) = scheduler(true, FakeClock::at_time(9, 0)).await;
        assert_eq!(scheduler.first_wait(), Duration::from_secs(3600));

        let cancel = CancellationToken::new();
        let handle = scheduler.start(&cancel);

        tokio::time::sleep(Duration::from_secs(3599)).await;
        assert_eq!(index.search_count(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(index.search_count(), 1);

        tokio::time::sleep(TICK_INTERVAL).await;
        assert_eq!(index.search_count(), 2);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn started_after_time_of_day_waits_for_tomorrow() {
        let (scheduler, index, _h) = scheduler(true, FakeClock::at_time(11, 0)).await;
        assert_eq!(scheduler.first_wait(), Duration::from_secs(23 * 3600));

        let handle = scheduler.start(&CancellationToken::new());
        tokio::time::sleep(Duration::from_secs(23 * 3600 - 1)).await;
        assert_eq!(index.search_count(), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(index.search_count(), 1);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_first_scan_scans_nothing() {
        let (scheduler, index, _h) = scheduler(true, FakeClock::at_time(9, 0)).await;
        let handle = scheduler.start(&CancellationToken::new());
        tokio::time::sleep(Duration::from_secs(60)).await;
        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(7200)).await;
        assert_eq!(index.search_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_stops_the_loop() {
        let (scheduler, _index, _h) = scheduler(true, FakeClock::at_time(9, 0)).await;
        let cancel = CancellationToken::new();
        let handle = scheduler.start(&cancel);
        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_scheduler_never_scans() {
        let (scheduler, index, _h) = scheduler(false, FakeClock::at_time(9, 0)).await;
        let handle = scheduler.start(&CancellationToken::new());
        tokio::time::sleep(Duration::from_secs(2 * 24 * 3600)).await;
        assert_eq!(index.search_count(), 0);
        assert!(handle.is_finished());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn overlapping_scan_is_skipped() {
        let (scheduler, index, _h) = scheduler(true, FakeClock::at_time(9, 0)).await;
        scheduler.scanning.store(true, Ordering::SeqCst);
        let outcome = scheduler.run_now(&CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, ScanOutcome::Skipped);
        assert_eq!(index.search_count(), 0);
        assert!(logs_contain("previous reminder scan still running"));

        scheduler.scanning.store(false, Ordering::SeqCst);
        let outcome = scheduler.run_now(&CancellationToken::new()).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::Completed(_)));
        assert!(!scheduler.scanning.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    #[tracing_test::traced_test]
    async fn tick_during_a_long_scan_is_skipped_and_schedule_holds() {
        let (scheduler, index, _h) = scheduler(true, FakeClock::at_time(9, 0)).await;
        index.set_search_delay(TICK_INTERVAL + Duration::from_secs(3600));
        let handle = scheduler.start(&CancellationToken::new());

        // Scans start at 10:00 on day one, the 10:00 tick on day two is
        // skipped, and the next scan starts at 10:00 on day three.
        tokio::time::sleep(Duration::from_secs(3601)).await;
        assert_eq!(index.search_count(), 1);
        tokio::time::sleep(Duration::from_secs(36 * 3600)).await;
        assert_eq!(index.search_count(), 1);
        assert!(logs_contain("skipping this tick"));
        tokio::time::sleep(Duration::from_secs(12 * 3600)).await;
        assert_eq!(index.search_count(), 2);

        handle.stop().await;
    }

    #[tokio::test]
    async fn invalid_time_of_day_is_a_config_error() {
        let h = TestHarness::builder().build().await.unwrap();
        let result = ReminderScheduler::new(
            &RemindersConfig {
                enabled: true,
                time_of_day: "25:00".into(),
            },
            Arc::new(FakeClock::at_time(9, 0)),
            h.index.clone(),
            h.notifier.clone(),
            None,
        );
        assert!(matches!(result, Err(QuireError::Config(_))));
    }

    #[tokio::test]
    async fn run_now_reconciles_before_scanning() {
        let h = TestHarness::builder().build().await.unwrap();
        h.seed(&document("d1", "RFC", "Draft")).await.unwrap();

        // Leave a patch stranded between the stores.
        h.relational.fail_upserts(true);
        assert!(
            h.patch("o@x", "d1", r#"{"status":"In-Review","reviewers":["r@x"]}"#)
                .await
                .is_err()
        );
        h.relational.fail_upserts(false);

        let scheduler = ReminderScheduler::new(
            &config(true),
            Arc::new(FakeClock::at_time(10, 0)),
            h.index.clone(),
            h.notifier.clone(),
            Some(h.reconciler.clone()),
        )
        .unwrap();
        let outcome = scheduler.run_now(&CancellationToken::new()).await.unwrap();
        let ScanOutcome::Completed(report) = outcome else {
            panic!("scan skipped");
        };
        assert_eq!(report.reminded, 1);

        let record = h
            .storage
            .get_document(&quire_core::ContentId::from("d1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.reviewers, vec!["r@x"]);
    }
}
