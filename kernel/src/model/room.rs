use serde::{Deserialize, Serialize};
use shared::error::AppError;
use std::{fmt, str::FromStr};

/// The closed catalog of bookable rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Room {
    Floor3,
    Floor4,
}

impl Room {
    pub const ALL: [Room; 2] = [Room::Floor3, Room::Floor4];

    /// Stable key used as the storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Room::Floor3 => "floor3",
            Room::Floor4 => "floor4",
        }
    }
}

impl FromStr for Room {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "floor3" => Ok(Room::Floor3),
            "floor4" => Ok(Room::Floor4),
            other => Err(AppError::ConversionEntityError(format!(
                "unknown room key: {other}"
            ))),
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
