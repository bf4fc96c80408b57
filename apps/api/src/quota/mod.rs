//! Quota Ledger: per-user daily reservation counter with atomic check-and-reserve.
//!
//! `reserve` is the enforcement path and runs inside a store transaction.
//! `status` is the advisory path for UI display; it applies the same rule to a
//! plain read and never mutates anything.

pub mod clock;
pub mod handlers;
pub mod memory;
pub mod postgres;
pub mod store;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::models::quota::{QuotaDecision, UserQuotaRecord};
use crate::quota::clock::Clock;
use crate::quota::store::{QuotaStore, QuotaStoreError};

pub const DAILY_LIMIT_REASON: &str = "daily limit reached";

/// Outcome of running the limit rule inside a reservation transaction.
///
/// `grant` carries the record to write back. `None` means the transaction must not
/// touch the counters (special user or denial).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: QuotaDecision,
    pub grant: Option<UserQuotaRecord>,
}

/// Applies the daily-limit rule to `record` as of `now` and, when a slot is free,
/// produces the updated record that consumes it.
pub fn evaluate(record: &UserQuotaRecord, now: DateTime<Utc>, daily_limit: u32) -> Evaluation {
    if record.is_special {
        return Evaluation {
            decision: QuotaDecision::unlimited(),
            grant: None,
        };
    }

    let today = now.date_naive();
    let used = record.reservations_on(today);
    if used >= daily_limit {
        return Evaluation {
            decision: QuotaDecision::denied(DAILY_LIMIT_REASON),
            grant: None,
        };
    }

    // A new day restarts from zero rather than incrementing the stale counter.
    let reserved = used + 1;
    let updated = UserQuotaRecord {
        last_reservation_date: Some(today),
        reservations_today: reserved as i32,
        last_reservation_at: Some(now),
        updated_at: Some(now),
        ..record.clone()
    };

    Evaluation {
        decision: QuotaDecision::granted(i64::from(daily_limit - reserved)),
        grant: Some(updated),
    }
}

/// Read-only form of [`evaluate`]: what `reserve` would decide right now.
/// `remaining` counts the slots still free before any reservation is made.
pub fn peek(record: &UserQuotaRecord, now: DateTime<Utc>, daily_limit: u32) -> QuotaDecision {
    if record.is_special {
        return QuotaDecision::unlimited();
    }
    let used = record.reservations_on(now.date_naive());
    if used >= daily_limit {
        QuotaDecision::denied(DAILY_LIMIT_REASON)
    } else {
        QuotaDecision::granted(i64::from(daily_limit - used))
    }
}

/// Status shown to the user. Mirrors the decision plus the exemption flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    #[serde(flatten)]
    pub decision: QuotaDecision,
    pub is_special: bool,
}

/// The ledger owns the limit rule; the store owns atomicity.
#[derive(Clone)]
pub struct QuotaLedger {
    store: Arc<dyn QuotaStore>,
    clock: Arc<dyn Clock>,
    daily_limit: u32,
}

impl QuotaLedger {
    pub fn new(store: Arc<dyn QuotaStore>, clock: Arc<dyn Clock>, daily_limit: u32) -> Self {
        Self {
            store,
            clock,
            daily_limit,
        }
    }

    /// Atomically consumes one of the user's daily slots, or denies without mutating.
    ///
    /// The slot is consumed at grant time and never refunded, even if the work it
    /// pays for later fails. Storage faults are returned as errors, never as denials.
    pub async fn reserve(&self, user_id: &str) -> Result<QuotaDecision, QuotaStoreError> {
        let daily_limit = self.daily_limit;
        let clock = Arc::clone(&self.clock);
        let rule = move |record: UserQuotaRecord| evaluate(&record, clock.now(), daily_limit);

        let decision = self.store.reserve_with(user_id, &rule).await?;

        if decision.allowed {
            info!(user_id, remaining = decision.remaining, "Quota slot reserved");
        } else {
            info!(user_id, reason = ?decision.reason, "Quota reservation denied");
        }
        Ok(decision)
    }

    /// Current UTC calendar day according to the ledger's clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Advisory status for display. Fails open: a storage fault reports a free slot.
    pub async fn status(&self, user_id: &str) -> QuotaStatus {
        match self.store.fetch(user_id).await {
            Ok(record) => {
                let record = record.unwrap_or_else(|| UserQuotaRecord::fresh(user_id));
                QuotaStatus {
                    decision: peek(&record, self.clock.now(), self.daily_limit),
                    is_special: record.is_special,
                }
            }
            Err(e) => {
                warn!(user_id, error = %e, "Quota status read failed; reporting open slot");
                QuotaStatus {
                    decision: QuotaDecision::granted(i64::from(self.daily_limit)),
                    is_special: false,
                }
            }
        }
    }
}
