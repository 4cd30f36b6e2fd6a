//! Query and cancellation operations that need no dialog state.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use kernel::model::{
    booking::Booking,
    id::{BookingId, OwnerId},
    room::Room,
};
use kernel::notifier::{Notification, Notifier};
use kernel::repository::booking::BookingRepository;
use shared::error::{AppError, AppResult};
use std::sync::Arc;

pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    notifier: Arc<dyn Notifier>,
}

impl BookingService {
    pub fn new(repo: Arc<dyn BookingRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { repo, notifier }
    }

    /// Cancels a booking or block. Only the owner or an admin may cancel,
    /// and never once the record has started. Blocks have no owner, so only
    /// admins can cancel them.
    pub async fn cancel(
        &self,
        actor: OwnerId,
        is_admin: bool,
        id: BookingId,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let booking = self
            .repo
            .find_by_id(id)
            .await?
            .filter(|b| !b.is_canceled())
            .ok_or_else(|| AppError::EntityNotFound(format!("booking {id} not found")))?;

        let owned_by_actor = booking.owner_id() == Some(actor);
        if !owned_by_actor && !is_admin {
            return Err(AppError::ForbiddenOperation(format!(
                "booking {id} belongs to someone else"
            )));
        }
        if now >= booking.start {
            return Err(AppError::AlreadyStarted(format!(
                "booking {id} has already started"
            )));
        }

        self.repo.cancel(id, now).await?;
        let canceled = Booking {
            canceled_at: Some(now),
            ..booking
        };

        if let Err(e) = self
            .notifier
            .notify(Notification::BookingCanceled {
                booking: canceled.clone(),
            })
            .await
        {
            tracing::warn!(booking_id = %id, error = %e, "cancellation notice failed");
        }
        Ok(canceled)
    }

    /// The actor's own active future bookings, soonest first.
    pub async fn my_bookings(&self, owner: OwnerId, now: DateTime<Utc>) -> AppResult<Vec<Booking>> {
        self.repo.find_future_by_owner(owner, now).await
    }

    /// Everything active on `day`, optionally narrowed to one room.
    pub async fn day_occupancy(
        &self,
        room: Option<Room>,
        day: NaiveDate,
    ) -> AppResult<Vec<Booking>> {
        self.repo.find_for_day(room, day).await
    }

    /// Active records starting within the next `days` days.
    pub async fn upcoming(&self, now: DateTime<Utc>, days: i64) -> AppResult<Vec<Booking>> {
        self.repo.find_in_range(now, now + Duration::days(days)).await
    }
}
