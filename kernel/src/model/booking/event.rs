use crate::model::booking::BookingKind;
use crate::model::room::Room;
use chrono::{DateTime, Utc};
use derive_new::new;

#[derive(new, Debug, Clone)]
pub struct CreateBooking {
    pub room: Room,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: BookingKind,
    pub created_at: DateTime<Utc>,
}
