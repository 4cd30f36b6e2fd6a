use chrono::{DateTime, Utc};
use kernel::model::{
    booking::{Booking, BookingKind},
    id::{BookingId, OwnerId},
    room::Room,
};
use shared::error::{AppError, AppResult};

/// The flat row shape of the bookings table. Timestamps are unix seconds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub id: i64,
    pub room: String,
    pub start_ts: i64,
    pub end_ts: i64,
    pub user_id: Option<i64>,
    pub user_full_name: Option<String>,
    pub user_contact: Option<String>,
    pub topic: Option<String>,
    pub is_block: bool,
    pub block_reason: Option<String>,
    pub canceled: bool,
    pub canceled_at: Option<i64>,
    pub created_at: i64,
}

fn from_ts(ts: i64) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| AppError::ConversionEntityError(format!("timestamp out of range: {ts}")))
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(value: BookingRow) -> Result<Self, Self::Error> {
        let kind = if value.is_block {
            BookingKind::Block {
                reason: value.block_reason.unwrap_or_else(|| "block".into()),
            }
        } else {
            BookingKind::Booking {
                owner_id: value.user_id.map(OwnerId::new),
                owner_name: value.user_full_name.unwrap_or_default(),
                contact: value.user_contact,
                topic: value.topic,
            }
        };
        Ok(Booking {
            id: BookingId::new(value.id),
            room: value.room.parse()?,
            start: from_ts(value.start_ts)?,
            end: from_ts(value.end_ts)?,
            kind,
            canceled_at: value.canceled_at.map(from_ts).transpose()?,
            created_at: from_ts(value.created_at)?,
        })
    }
}

impl From<&Booking> for BookingRow {
    fn from(value: &Booking) -> Self {
        let (user_id, user_full_name, user_contact, topic, is_block, block_reason) =
            match &value.kind {
                BookingKind::Booking {
                    owner_id,
                    owner_name,
                    contact,
                    topic,
                } => (
                    owner_id.map(|id| id.raw()),
                    Some(owner_name.clone()),
                    contact.clone(),
                    topic.clone(),
                    false,
                    None,
                ),
                BookingKind::Block { reason } => {
                    (None, None, None, None, true, Some(reason.clone()))
                }
            };
        Self {
            id: value.id.raw(),
            room: value.room.as_str().into(),
            start_ts: value.start.timestamp(),
            end_ts: value.end.timestamp(),
            user_id,
            user_full_name,
            user_contact,
            topic,
            is_block,
            block_reason,
            canceled: value.canceled_at.is_some(),
            canceled_at: value.canceled_at.map(|at| at.timestamp()),
            created_at: value.created_at.timestamp(),
        }
    }
}
