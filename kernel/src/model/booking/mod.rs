use crate::model::id::{BookingId, OwnerId};
use crate::model::room::Room;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod event;

/// An occupancy record for a room over a time interval. Blocks share the
/// same table and the same conflict space as ordinary bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub room: Room,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: BookingKind,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingKind {
    Booking {
        owner_id: Option<OwnerId>,
        owner_name: String,
        contact: Option<String>,
        topic: Option<String>,
    },
    Block {
        reason: String,
    },
}

impl Booking {
    pub fn is_canceled(&self) -> bool {
        self.canceled_at.is_some()
    }

    pub fn is_block(&self) -> bool {
        matches!(self.kind, BookingKind::Block { .. })
    }

    pub fn owner_id(&self) -> Option<OwnerId> {
        match &self.kind {
            BookingKind::Booking { owner_id, .. } => *owner_id,
            BookingKind::Block { .. } => None,
        }
    }
}

/// Half-open interval overlap: `[a_start, a_end)` against `[b_start, b_end)`.
/// Touching endpoints do not conflict.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    !(a_end <= b_start || a_start >= b_end)
}
