use crate::error::{AppError, AppResult};

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    pub fn new() -> AppResult<Self> {
        let database = DatabaseConfig {
            path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "bookings.sqlite3".into()),
        };
        let admin = AdminConfig::from_env()?;
        Ok(Self { database, admin })
    }
}

pub struct DatabaseConfig {
    pub path: String,
}

/// Identities allowed to cancel any booking and to run block/rebuild
/// operations. Comma-separated numeric ids in `ADMIN_IDS`.
pub struct AdminConfig {
    pub admin_ids: Vec<i64>,
}

impl AdminConfig {
    fn from_env() -> AppResult<Self> {
        let raw = std::env::var("ADMIN_IDS").unwrap_or_default();
        let admin_ids = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>().map_err(|_| {
                    AppError::ConversionEntityError(format!("ADMIN_IDS entry is not an integer: {s}"))
                })
            })
            .collect::<AppResult<Vec<i64>>>()?;
        Ok(Self { admin_ids })
    }

    pub fn is_admin(&self, id: i64) -> bool {
        self.admin_ids.contains(&id)
    }
}
