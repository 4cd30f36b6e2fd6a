use shared::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub mod model;

fn make_connect_options(cfg: &DatabaseConfig) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(&cfg.path)
        .create_if_missing(true)
}

#[derive(Clone)]
pub struct ConnectionPool(SqlitePool);

impl ConnectionPool {
    pub fn new(pool: SqlitePool) -> Self {
        Self(pool)
    }

    pub fn inner_ref(&self) -> &SqlitePool {
        &self.0
    }

    pub async fn begin(&self) -> AppResult<sqlx::Transaction<'_, sqlx::Sqlite>> {
        self.0.begin().await.map_err(AppError::TransactionError)
    }

    /// Creates the bookings table and its indexes when missing.
    pub async fn setup_schema(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room TEXT NOT NULL,
                start_ts INTEGER NOT NULL,
                end_ts INTEGER NOT NULL,
                user_id INTEGER,
                user_full_name TEXT,
                user_contact TEXT,
                topic TEXT,
                is_block INTEGER NOT NULL DEFAULT 0,
                block_reason TEXT,
                canceled INTEGER NOT NULL DEFAULT 0,
                canceled_at INTEGER,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.0)
        .await
        .map_err(AppError::SpecificOperationError)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_room_start ON bookings(room, start_ts)")
            .execute(&self.0)
            .await
            .map_err(AppError::SpecificOperationError)?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_start ON bookings(user_id, start_ts)")
            .execute(&self.0)
            .await
            .map_err(AppError::SpecificOperationError)?;

        Ok(())
    }
}

/// SQLite serializes writers; a single connection also keeps in-memory
/// databases alive for the pool's lifetime.
pub fn connect_database_with(cfg: &DatabaseConfig) -> ConnectionPool {
    ConnectionPool(
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(make_connect_options(cfg)),
    )
}
