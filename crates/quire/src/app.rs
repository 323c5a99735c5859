// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by every subcommand: stores, channels and services.

use std::sync::Arc;
use std::time::Duration;

use quire_config::model::QuireConfig;
use quire_core::{NotificationChannel, PluginAdapter, QuireError, SystemClock};
use quire_index::SqliteIndex;
use quire_notify::{OutboxDispatcher, RetryPolicy, build_channels};
use quire_review::{
    ChannelRoute, DocumentService, LockGate, NotifierSettings, Reconciler, ReviewNotifier,
};
use quire_scheduler::ReminderScheduler;
use quire_storage::SqliteStorage;
use tracing::{info, warn};

pub struct App {
    pub config: QuireConfig,
    pub storage: Arc<SqliteStorage>,
    pub index: Arc<SqliteIndex>,
    pub channels: Vec<Arc<dyn NotificationChannel>>,
    pub notifier: Arc<ReviewNotifier>,
    pub service: Arc<DocumentService>,
    pub reconciler: Arc<Reconciler>,
}

impl App {
    /// Opens both stores and builds the notification channels.
    pub async fn open(config: QuireConfig) -> Result<Self, QuireError> {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage = Arc::new(storage);
        let index = Arc::new(SqliteIndex::open(&config.index).await?);
        info!(
            relational = %config.storage.database_path,
            index = %config.index.database_path,
            "stores opened"
        );

        let channels = build_channels(&config.notifications)?;
        let routes = channels
            .iter()
            .map(|c| ChannelRoute::new(c.name(), c.kind()))
            .collect();
        let notifier = Arc::new(ReviewNotifier::new(
            NotifierSettings::from_config(&config),
            routes,
            storage.clone(),
            storage.clone(),
        ));
        let service = Arc::new(DocumentService::new(
            index.clone(),
            storage.clone(),
            LockGate::new(storage.clone()),
            notifier.clone(),
        ));
        let reconciler = Arc::new(Reconciler::new(index.clone(), storage.clone()));

        Ok(Self {
            config,
            storage,
            index,
            channels,
            notifier,
            service,
            reconciler,
        })
    }

    pub fn dispatcher(&self) -> OutboxDispatcher {
        OutboxDispatcher::new(
            self.storage.clone(),
            self.channels.clone(),
            RetryPolicy::from_config(&self.config.outbox),
            Duration::from_secs(self.config.outbox.poll_interval_secs),
        )
    }

    pub fn scheduler(&self) -> Result<ReminderScheduler, QuireError> {
        ReminderScheduler::new(
            &self.config.reminders,
            Arc::new(SystemClock),
            self.index.clone(),
            self.notifier.clone(),
            Some(self.reconciler.clone()),
        )
    }

    /// Checkpoints both stores. Failures are logged; the process is exiting.
    pub async fn close(&self) {
        if let Err(e) = self.storage.shutdown().await {
            warn!(error = %e, "relational store checkpoint failed");
        }
        if let Err(e) = self.index.shutdown().await {
            warn!(error = %e, "index store shutdown failed");
        }
    }
}

/// A default configuration with both stores under `dir`.
#[cfg(test)]
pub(crate) fn config_in(dir: &std::path::Path) -> QuireConfig {
    use quire_config::model::{IndexConfig, StorageConfig};

    let mut config = QuireConfig::default();
    config.storage = StorageConfig {
        database_path: dir.join("quire.db").to_string_lossy().into_owned(),
        wal_mode: true,
    };
    config.index = IndexConfig {
        database_path: dir.join("index.db").to_string_lossy().into_owned(),
    };
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_wires_the_log_channel_without_transports() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::open(config_in(dir.path())).await.unwrap();
        let names: Vec<_> = app.channels.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["log"]);
        assert_eq!(app.notifier.routes().len(), 1);
        app.close().await;
    }

    #[tokio::test]
    async fn email_without_sender_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.notifications.email = Some(quire_config::model::EmailConfig {
            host: "localhost".into(),
            port: 2525,
            username: None,
            password: None,
            starttls: false,
        });
        assert!(matches!(
            App::open(config).await,
            Err(QuireError::Config(_))
        ));
    }

    #[tokio::test]
    async fn scheduler_uses_configured_time() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::open(config_in(dir.path())).await.unwrap();
        let wait = app.scheduler().unwrap().first_wait();
        assert!(wait <= Duration::from_secs(24 * 3600));
    }
}
