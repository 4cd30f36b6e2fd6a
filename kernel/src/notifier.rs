use crate::model::{booking::Booking, id::OwnerId};
use async_trait::async_trait;
use serde::Serialize;
use shared::error::AppResult;

/// Outbound events consumed by the transport layer for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    BookingCreated { booking: Booking },
    BookingCanceled { booking: Booking },
    ReminderDue { booking: Booking, recipient: Recipient },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Owner(OwnerId),
    Audience,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> AppResult<()>;
}
