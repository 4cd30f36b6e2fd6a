use crate::database::{model::booking::BookingRow, ConnectionPool};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use derive_new::new;
use kernel::model::{
    booking::{event::CreateBooking, Booking, BookingKind},
    id::{BookingId, OwnerId},
    room::Room,
};
use kernel::repository::booking::BookingRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct BookingRepositoryImpl {
    db: ConnectionPool,
}

fn collect(rows: Vec<BookingRow>) -> AppResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

#[async_trait]
impl BookingRepository for BookingRepositoryImpl {
    async fn create(&self, event: CreateBooking) -> AppResult<BookingId> {
        let mut tx = self.db.begin().await?;

        // Conflict pre-check inside the same transaction. The workflows run
        // their own re-check before committing; this guards the window
        // between that check and the insert.
        let conflicts = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT * FROM bookings
            WHERE room = ?1
              AND canceled = 0
              AND NOT (end_ts <= ?2 OR start_ts >= ?3)
            "#,
        )
        .bind(event.room.as_str())
        .bind(event.start.timestamp())
        .bind(event.end.timestamp())
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if !conflicts.is_empty() {
            return Err(AppError::SlotTaken(format!(
                "room {} is already occupied in the requested interval",
                event.room
            )));
        }

        let (user_id, user_full_name, user_contact, topic, is_block, block_reason) =
            match &event.kind {
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

        let res = sqlx::query(
            r#"
            INSERT INTO bookings
            (room, start_ts, end_ts, user_id, user_full_name, user_contact,
             topic, is_block, block_reason, canceled, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10)
            "#,
        )
        .bind(event.room.as_str())
        .bind(event.start.timestamp())
        .bind(event.end.timestamp())
        .bind(user_id)
        .bind(user_full_name)
        .bind(user_contact)
        .bind(topic)
        .bind(is_block)
        .bind(block_reason)
        .bind(event.created_at.timestamp())
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "no booking record has been created".into(),
            ));
        }
        let id = BookingId::new(res.last_insert_rowid());

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(id)
    }

    async fn cancel(&self, id: BookingId, canceled_at: DateTime<Utc>) -> AppResult<()> {
        let res = sqlx::query(
            "UPDATE bookings SET canceled = 1, canceled_at = ?1 WHERE id = ?2 AND canceled = 0",
        )
        .bind(canceled_at.timestamp())
        .bind(id.raw())
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            // Already-canceled rows stay canceled; only a missing id is an error.
            let exists = sqlx::query("SELECT id FROM bookings WHERE id = ?1")
                .bind(id.raw())
                .fetch_optional(self.db.inner_ref())
                .await
                .map_err(AppError::SpecificOperationError)?;
            if exists.is_none() {
                return Err(AppError::EntityNotFound(format!("booking {id} not found")));
            }
        }

        Ok(())
    }

    async fn find_by_id(&self, id: BookingId) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = ?1")
            .bind(id.raw())
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?
            .map(Booking::try_from)
            .transpose()
    }

    async fn find_future_by_owner(
        &self,
        owner: OwnerId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT * FROM bookings
            WHERE user_id = ?1 AND canceled = 0 AND is_block = 0 AND start_ts >= ?2
            ORDER BY start_ts
            "#,
        )
        .bind(owner.raw())
        .bind(now.timestamp())
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;
        collect(rows)
    }

    async fn find_for_day(&self, room: Option<Room>, day: NaiveDate) -> AppResult<Vec<Booking>> {
        let day_start = day.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::minutes(23 * 60 + 59);

        let rows = match room {
            Some(room) => {
                sqlx::query_as::<_, BookingRow>(
                    r#"
                    SELECT * FROM bookings
                    WHERE room = ?1 AND canceled = 0
                      AND start_ts <= ?2 AND end_ts >= ?3
                    ORDER BY start_ts
                    "#,
                )
                .bind(room.as_str())
                .bind(day_end.timestamp())
                .bind(day_start.timestamp())
                .fetch_all(self.db.inner_ref())
                .await
            }
            None => {
                sqlx::query_as::<_, BookingRow>(
                    r#"
                    SELECT * FROM bookings
                    WHERE canceled = 0
                      AND start_ts <= ?1 AND end_ts >= ?2
                    ORDER BY room, start_ts
                    "#,
                )
                .bind(day_end.timestamp())
                .bind(day_start.timestamp())
                .fetch_all(self.db.inner_ref())
                .await
            }
        }
        .map_err(AppError::SpecificOperationError)?;
        collect(rows)
    }

    async fn find_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT * FROM bookings
            WHERE canceled = 0
              AND start_ts >= ?1
              AND start_ts <= ?2
            ORDER BY start_ts, room
            "#,
        )
        .bind(start.timestamp())
        .bind(end.timestamp())
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;
        collect(rows)
    }

    async fn find_active_future(&self, now: DateTime<Utc>) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT * FROM bookings
            WHERE canceled = 0 AND start_ts >= ?1
            ORDER BY start_ts
            "#,
        )
        .bind(now.timestamp())
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;
        collect(rows)
    }

    async fn find_conflicts(
        &self,
        room: Room,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> AppResult<Vec<Booking>> {
        let rows = match exclude {
            Some(exclude) => {
                sqlx::query_as::<_, BookingRow>(
                    r#"
                    SELECT * FROM bookings
                    WHERE room = ?1
                      AND canceled = 0
                      AND id != ?2
                      AND NOT (end_ts <= ?3 OR start_ts >= ?4)
                    ORDER BY start_ts
                    "#,
                )
                .bind(room.as_str())
                .bind(exclude.raw())
                .bind(start.timestamp())
                .bind(end.timestamp())
                .fetch_all(self.db.inner_ref())
                .await
            }
            None => {
                sqlx::query_as::<_, BookingRow>(
                    r#"
                    SELECT * FROM bookings
                    WHERE room = ?1
                      AND canceled = 0
                      AND NOT (end_ts <= ?2 OR start_ts >= ?3)
                    ORDER BY start_ts
                    "#,
                )
                .bind(room.as_str())
                .bind(start.timestamp())
                .bind(end.timestamp())
                .fetch_all(self.db.inner_ref())
                .await
            }
        }
        .map_err(AppError::SpecificOperationError)?;
        collect(rows)
    }

    async fn find_all_raw(&self) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings ORDER BY start_ts")
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;
        collect(rows)
    }

    async fn replace_all(&self, rows: Vec<Booking>) -> AppResult<usize> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM bookings")
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

        let mut count = 0usize;
        for booking in &rows {
            let row = BookingRow::from(booking);
            let res = sqlx::query(
                r#"
                INSERT INTO bookings
                (id, room, start_ts, end_ts, user_id, user_full_name, user_contact,
                 topic, is_block, block_reason, canceled, canceled_at, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )
            .bind(row.id)
            .bind(&row.room)
            .bind(row.start_ts)
            .bind(row.end_ts)
            .bind(row.user_id)
            .bind(&row.user_full_name)
            .bind(&row.user_contact)
            .bind(&row.topic)
            .bind(row.is_block)
            .bind(&row.block_reason)
            .bind(row.canceled)
            .bind(row.canceled_at)
            .bind(row.created_at)
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
            count += res.rows_affected() as usize;
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_database_with;
    use shared::config::DatabaseConfig;

    async fn repo() -> BookingRepositoryImpl {
        let pool = connect_database_with(&DatabaseConfig {
            path: ":memory:".into(),
        });
        pool.setup_schema().await.unwrap();
        BookingRepositoryImpl::new(pool)
    }

    fn at(days_ahead: i64, h: u32, m: u32) -> DateTime<Utc> {
        (Utc::now() + Duration::days(days_ahead))
            .date_naive()
            .and_hms_opt(h, m, 0)
            .unwrap()
            .and_utc()
    }

    fn booking(room: Room, start: DateTime<Utc>, end: DateTime<Utc>, owner: i64) -> CreateBooking {
        CreateBooking::new(
            room,
            start,
            end,
            BookingKind::Booking {
                owner_id: Some(OwnerId::new(owner)),
                owner_name: "Jane Doe".into(),
                contact: Some("@jane".into()),
                topic: Some("weekly sync".into()),
            },
            Utc::now(),
        )
    }

    fn block(room: Room, start: DateTime<Utc>, end: DateTime<Utc>) -> CreateBooking {
        CreateBooking::new(
            room,
            start,
            end,
            BookingKind::Block {
                reason: "maintenance".into(),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn create_assigns_monotonic_ids() {
        let repo = repo().await;
        let a = repo
            .create(booking(Room::Floor3, at(1, 9, 0), at(1, 10, 0), 1))
            .await
            .unwrap();
        let b = repo
            .create(booking(Room::Floor3, at(1, 10, 0), at(1, 11, 0), 1))
            .await
            .unwrap();
        assert!(b > a);

        let stored = repo.find_by_id(a).await.unwrap().unwrap();
        assert_eq!(stored.room, Room::Floor3);
        assert_eq!(stored.start, at(1, 9, 0));
        assert!(!stored.is_canceled());
    }

    #[tokio::test]
    async fn overlap_rejected_touching_allowed() {
        let repo = repo().await;
        let first = repo
            .create(booking(Room::Floor3, at(1, 9, 0), at(1, 10, 0), 1))
            .await
            .unwrap();

        let conflicts = repo
            .find_conflicts(Room::Floor3, at(1, 9, 30), at(1, 10, 30), None)
            .await
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].id, first);

        let err = repo
            .create(booking(Room::Floor3, at(1, 9, 30), at(1, 10, 30), 2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SlotTaken(_)));

        // Back-to-back is not a conflict.
        repo.create(booking(Room::Floor3, at(1, 10, 0), at(1, 11, 0), 2))
            .await
            .unwrap();
        // Other rooms have their own axis.
        repo.create(booking(Room::Floor4, at(1, 9, 30), at(1, 10, 30), 2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn blocks_occupy_the_same_conflict_space() {
        let repo = repo().await;
        repo.create(block(Room::Floor4, at(2, 12, 0), at(2, 14, 0)))
            .await
            .unwrap();

        let conflicts = repo
            .find_conflicts(Room::Floor4, at(2, 13, 0), at(2, 13, 30), None)
            .await
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].is_block());
    }

    #[tokio::test]
    async fn cancel_keeps_the_row_but_hides_it_from_queries() {
        let repo = repo().await;
        let owner = OwnerId::new(7);
        let id = repo
            .create(booking(Room::Floor3, at(3, 9, 0), at(3, 10, 0), 7))
            .await
            .unwrap();

        repo.cancel(id, Utc::now()).await.unwrap();

        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert!(stored.is_canceled());

        assert!(repo
            .find_conflicts(Room::Floor3, at(3, 9, 0), at(3, 10, 0), None)
            .await
            .unwrap()
            .is_empty());
        assert!(repo
            .find_future_by_owner(owner, Utc::now())
            .await
            .unwrap()
            .is_empty());

        // Idempotent in effect.
        repo.cancel(id, Utc::now()).await.unwrap();
        let err = repo.cancel(BookingId::new(9999), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::EntityNotFound(_)));
    }

    #[tokio::test]
    async fn excluded_id_is_ignored_by_conflict_checks() {
        let repo = repo().await;
        let id = repo
            .create(booking(Room::Floor3, at(1, 9, 0), at(1, 10, 0), 1))
            .await
            .unwrap();

        let conflicts = repo
            .find_conflicts(Room::Floor3, at(1, 9, 0), at(1, 10, 0), Some(id))
            .await
            .unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn day_query_filters_and_orders() {
        let repo = repo().await;
        repo.create(booking(Room::Floor4, at(1, 11, 0), at(1, 12, 0), 1))
            .await
            .unwrap();
        repo.create(booking(Room::Floor3, at(1, 9, 0), at(1, 10, 0), 1))
            .await
            .unwrap();
        repo.create(booking(Room::Floor3, at(2, 9, 0), at(2, 10, 0), 1))
            .await
            .unwrap();

        let day = (Utc::now() + Duration::days(1)).date_naive();
        let all = repo.find_for_day(None, day).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].room, Room::Floor3);
        assert_eq!(all[1].room, Room::Floor4);

        let floor4 = repo.find_for_day(Some(Room::Floor4), day).await.unwrap();
        assert_eq!(floor4.len(), 1);
        assert_eq!(floor4[0].start, at(1, 11, 0));
    }

    #[tokio::test]
    async fn range_query_selects_by_start() {
        let repo = repo().await;
        repo.create(booking(Room::Floor3, at(1, 9, 0), at(1, 10, 0), 1))
            .await
            .unwrap();
        repo.create(booking(Room::Floor4, at(5, 9, 0), at(5, 10, 0), 1))
            .await
            .unwrap();
        repo.create(booking(Room::Floor3, at(40, 9, 0), at(40, 10, 0), 1))
            .await
            .unwrap();

        let rows = repo.find_in_range(at(0, 0, 0), at(30, 0, 0)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start, at(1, 9, 0));
        assert_eq!(rows[1].start, at(5, 9, 0));
    }

    #[tokio::test]
    async fn active_future_includes_blocks() {
        let repo = repo().await;
        repo.create(booking(Room::Floor3, at(1, 9, 0), at(1, 10, 0), 1))
            .await
            .unwrap();
        repo.create(block(Room::Floor4, at(1, 9, 0), at(1, 10, 0)))
            .await
            .unwrap();
        let canceled = repo
            .create(booking(Room::Floor3, at(2, 9, 0), at(2, 10, 0), 1))
            .await
            .unwrap();
        repo.cancel(canceled, Utc::now()).await.unwrap();

        let rows = repo.find_active_future(Utc::now()).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn replace_all_round_trips_the_raw_table() {
        let repo = repo().await;
        repo.create(booking(Room::Floor3, at(1, 9, 0), at(1, 10, 0), 1))
            .await
            .unwrap();
        repo.create(block(Room::Floor4, at(2, 9, 0), at(2, 10, 0)))
            .await
            .unwrap();
        let canceled = repo
            .create(booking(Room::Floor3, at(3, 9, 0), at(3, 10, 0), 2))
            .await
            .unwrap();
        repo.cancel(canceled, Utc::now()).await.unwrap();

        let raw = repo.find_all_raw().await.unwrap();
        let count = repo.replace_all(raw.clone()).await.unwrap();
        assert_eq!(count, raw.len());
        assert_eq!(repo.find_all_raw().await.unwrap(), raw);
    }

    #[tokio::test]
    async fn replace_all_rolls_back_on_partial_failure() {
        let repo = repo().await;
        repo.create(booking(Room::Floor3, at(1, 9, 0), at(1, 10, 0), 1))
            .await
            .unwrap();
        let before = repo.find_all_raw().await.unwrap();

        // Duplicate ids violate the primary key mid-way through the import.
        let mut bad = before.clone();
        bad.push(before[0].clone());
        let err = repo.replace_all(bad).await.unwrap_err();
        assert!(matches!(err, AppError::SpecificOperationError(_)));

        assert_eq!(repo.find_all_raw().await.unwrap(), before);
    }
}
