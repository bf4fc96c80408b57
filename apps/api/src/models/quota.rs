use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One user's daily quota counter, as persisted in `user_quotas`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserQuotaRecord {
    pub user_id: String,
    /// Exempt from the quota entirely. Set out of band by an administrator.
    pub is_special: bool,
    /// UTC calendar day of the last granted reservation.
    pub last_reservation_date: Option<NaiveDate>,
    /// Reservations granted on `last_reservation_date`.
    pub reservations_today: i32,
    pub last_reservation_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserQuotaRecord {
    /// The record an unknown user is evaluated against.
    pub fn fresh(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            is_special: false,
            last_reservation_date: None,
            reservations_today: 0,
            last_reservation_at: None,
            updated_at: None,
        }
    }

    /// Reservations already counted against `today`. A stale or missing date counts as zero.
    pub fn reservations_on(&self, today: NaiveDate) -> u32 {
        match self.last_reservation_date {
            Some(date) if date == today => self.reservations_today.max(0) as u32,
            _ => 0,
        }
    }
}

/// Result of evaluating the daily-limit rule for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    /// Slots left today after this decision. `-1` means unlimited.
    pub remaining: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl QuotaDecision {
    pub const UNLIMITED: i64 = -1;

    pub fn unlimited() -> Self {
        Self {
            allowed: true,
            remaining: Self::UNLIMITED,
            reason: None,
        }
    }

    pub fn granted(remaining: i64) -> Self {
        Self {
            allowed: true,
            remaining,
            reason: None,
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            reason: Some(reason.into()),
        }
    }
}
