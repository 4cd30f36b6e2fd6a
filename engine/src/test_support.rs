//! Shared fixtures for the engine tests: an in-memory repository backed by
//! the real SQLite adapter, and a notifier that records what it was asked to
//! send.

use adapter::{database::connect_database_with, repository::booking::BookingRepositoryImpl};
use async_trait::async_trait;
use kernel::notifier::{Notification, Notifier};
use kernel::repository::booking::BookingRepository;
use shared::config::DatabaseConfig;
use shared::error::AppResult;
use std::sync::{Arc, Mutex};

pub(crate) async fn memory_repo() -> Arc<dyn BookingRepository> {
    let pool = connect_database_with(&DatabaseConfig {
        path: ":memory:".into(),
    });
    pool.setup_schema().await.unwrap();
    Arc::new(BookingRepositoryImpl::new(pool))
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub(crate) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> AppResult<()> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}
