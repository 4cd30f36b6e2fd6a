use crate::model::{
    booking::{event::CreateBooking, Booking},
    id::{BookingId, OwnerId},
    room::Room,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::error::AppResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts a new booking or block. Runs a conflict pre-check inside the
    /// same transaction and fails with `SlotTaken` if the interval is
    /// already occupied.
    async fn create(&self, event: CreateBooking) -> AppResult<BookingId>;
    /// Marks the record as canceled, keeping the row. No-op when the record
    /// is already canceled; `EntityNotFound` when the id does not exist.
    async fn cancel(&self, id: BookingId, canceled_at: DateTime<Utc>) -> AppResult<()>;
    async fn find_by_id(&self, id: BookingId) -> AppResult<Option<Booking>>;
    /// Active, non-block bookings owned by `owner` starting at or after `now`.
    async fn find_future_by_owner(
        &self,
        owner: OwnerId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>>;
    /// Active records intersecting the calendar day of `day`.
    /// `room = None` means all rooms.
    async fn find_for_day(&self, room: Option<Room>, day: NaiveDate) -> AppResult<Vec<Booking>>;
    /// Active records whose start falls in `[start, end]`.
    async fn find_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>>;
    /// All active records, bookings and blocks, starting at or after `now`.
    async fn find_active_future(&self, now: DateTime<Utc>) -> AppResult<Vec<Booking>>;
    /// Active records in `room` overlapping `[start, end)` under half-open
    /// semantics, excluding `exclude` when given.
    async fn find_conflicts(
        &self,
        room: Room,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> AppResult<Vec<Booking>>;
    /// Every row regardless of cancellation state, for export.
    async fn find_all_raw(&self) -> AppResult<Vec<Booking>>;
    /// Atomically clears and repopulates the table, preserving ids.
    /// All-or-nothing: any failure rolls back to the prior state.
    async fn replace_all(&self, rows: Vec<Booking>) -> AppResult<usize>;
}
