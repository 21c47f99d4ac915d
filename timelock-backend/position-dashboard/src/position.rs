// --- Position Models ---

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ValidationError;

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const DEFAULT_ASSET: &str = "STX";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum PositionStatus {
    Active,
    Unlocked,
}

/// Lock periods offered when creating a position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LockDuration {
    #[default]
    Week,
    Month,
    Quarter,
}

impl LockDuration {
    pub const ALL: [LockDuration; 3] = [LockDuration::Week, LockDuration::Month, LockDuration::Quarter];

    pub fn days(self) -> u32 {
        match self {
            LockDuration::Week => 7,
            LockDuration::Month => 30,
            LockDuration::Quarter => 90,
        }
    }
}

impl FromStr for LockDuration {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "7" => Ok(LockDuration::Week),
            "30" => Ok(LockDuration::Month),
            "90" => Ok(LockDuration::Quarter),
            other => Err(ValidationError(format!(
                "Lock duration must be 7, 30 or 90 days (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for LockDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.days())
    }
}

/// A time-locked position as reported by the exchange contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub id: u64,
    pub amount: Decimal,
    pub asset: String,
    pub created_at: u64,
    pub duration_days: u32,
    pub unlock_time: u64,
    pub is_active: bool,
    pub owner: String,
}

impl Position {
    /// Builds a position whose unlock time follows from its creation time and lock period.
    pub fn new(
        id: u64,
        amount: Decimal,
        created_at: u64,
        duration_days: u32,
        is_active: bool,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id,
            amount,
            asset: DEFAULT_ASSET.to_string(),
            created_at,
            duration_days,
            unlock_time: created_at
                .saturating_add(u64::from(duration_days).saturating_mul(SECONDS_PER_DAY)),
            is_active,
            owner: owner.into(),
        }
    }

    /// Status as of `observed_at`. Only ever computed from contract data at refresh time.
    pub fn status_at(&self, observed_at: u64) -> PositionStatus {
        if self.is_active && observed_at < self.unlock_time {
            PositionStatus::Active
        } else {
            PositionStatus::Unlocked
        }
    }
}
