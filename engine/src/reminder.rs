//! In-process reminder timers. One tokio task per upcoming booking, keyed by
//! a `reminder_{id}` name so a re-arm replaces any previous timer for the
//! same record. Timers live only in memory; `rebuild_all` restores them from
//! the store after a restart.

use chrono::{Duration, Utc};
use kernel::model::id::BookingId;
use kernel::notifier::{Notification, Notifier, Recipient};
use kernel::repository::booking::BookingRepository;
use shared::error::AppResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Reminders fire this long before the booking starts.
pub const REMINDER_LEAD_DAYS: i64 = 1;

pub struct ReminderScheduler {
    repo: Arc<dyn BookingRepository>,
    notifier: Arc<dyn Notifier>,
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
}

fn timer_name(id: BookingId) -> String {
    format!("reminder_{id}")
}

impl ReminderScheduler {
    pub fn new(repo: Arc<dyn BookingRepository>, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        Arc::new(Self {
            repo,
            notifier,
            timers: Mutex::new(HashMap::new()),
        })
    }

    /// Arms a timer for the booking. Returns `false` without arming when the
    /// record is missing, canceled, a block, or its fire time has already
    /// passed.
    pub async fn arm(self: &Arc<Self>, id: BookingId) -> AppResult<bool> {
        let Some(booking) = self.repo.find_by_id(id).await? else {
            return Ok(false);
        };
        if booking.is_canceled() || booking.is_block() {
            return Ok(false);
        }
        let fire_at = booking.start - Duration::days(REMINDER_LEAD_DAYS);
        let delay = fire_at - Utc::now();
        if delay <= Duration::zero() {
            return Ok(false);
        }
        // chrono already guaranteed the delay is positive.
        let delay = delay.to_std().unwrap_or_default();

        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.fire(id).await;
        });

        let mut timers = self.timers.lock().await;
        if let Some(old) = timers.insert(timer_name(id), handle) {
            old.abort();
        }
        Ok(true)
    }

    /// Delivers the reminder, re-reading the record first so a cancellation
    /// between arming and firing turns this into a no-op.
    async fn fire(&self, id: BookingId) {
        self.timers.lock().await.remove(&timer_name(id));

        let booking = match self.repo.find_by_id(id).await {
            Ok(Some(booking)) => booking,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(booking_id = %id, error = %e, "reminder lookup failed");
                return;
            }
        };
        if booking.is_canceled() || booking.is_block() || Utc::now() >= booking.start {
            return;
        }

        let mut recipients = Vec::new();
        if let Some(owner) = booking.owner_id() {
            recipients.push(Recipient::Owner(owner));
        }
        recipients.push(Recipient::Audience);

        for recipient in recipients {
            let notification = Notification::ReminderDue {
                booking: booking.clone(),
                recipient,
            };
            if let Err(e) = self.notifier.notify(notification).await {
                tracing::warn!(booking_id = %id, error = %e, "reminder delivery failed");
            }
        }
    }

    /// Drops every timer and re-arms from the store. Called once at startup;
    /// safe to call again at any time.
    pub async fn rebuild_all(self: &Arc<Self>) -> AppResult<usize> {
        {
            let mut timers = self.timers.lock().await;
            for (_, handle) in timers.drain() {
                handle.abort();
            }
        }

        let mut armed = 0;
        for booking in self.repo.find_active_future(Utc::now()).await? {
            if booking.is_block() {
                continue;
            }
            if self.arm(booking.id).await? {
                armed += 1;
            }
        }
        Ok(armed)
    }

    /// The names of the currently armed timers, sorted.
    pub async fn armed(&self) -> Vec<String> {
        let timers = self.timers.lock().await;
        let mut names: Vec<String> = timers.keys().cloned().collect();
        names.sort();
        names
    }
}
