use async_trait::async_trait;
use thiserror::Error;

use crate::models::quota::{QuotaDecision, UserQuotaRecord};
use crate::quota::Evaluation;

/// Storage faults. Always distinct from a "limit reached" denial.
#[derive(Debug, Error)]
pub enum QuotaStoreError {
    #[error("quota storage error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The limit rule a store runs inside its transaction. Receives the current record
/// (or [`UserQuotaRecord::fresh`] when none exists) and says what to write back.
pub type Rule<'a> = &'a (dyn Fn(UserQuotaRecord) -> Evaluation + Send + Sync);

/// Persisted quota records keyed by user id.
///
/// Implementations must make `reserve_with` atomic per user: two concurrent calls for
/// the same id behave as if run one after the other.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Plain, non-transactional read.
    async fn fetch(&self, user_id: &str) -> Result<Option<UserQuotaRecord>, QuotaStoreError>;

    /// Read-evaluate-write as a single isolated transaction.
    async fn reserve_with(
        &self,
        user_id: &str,
        rule: Rule<'_>,
    ) -> Result<QuotaDecision, QuotaStoreError>;
}
