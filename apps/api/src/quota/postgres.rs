use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::models::quota::{QuotaDecision, UserQuotaRecord};
use crate::quota::store::{QuotaStore, QuotaStoreError, Rule};

const SELECT_COLUMNS: &str = "user_id, is_special, last_reservation_date, reservations_today, \
     last_reservation_at, updated_at";

/// Quota records in the shared `user_quotas` table.
///
/// Reservations lock the user's row with `SELECT ... FOR UPDATE`, so concurrent
/// reservers in any number of processes are serialised per user.
#[derive(Clone)]
pub struct PgQuotaStore {
    pool: PgPool,
}

impl PgQuotaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotaStore for PgQuotaStore {
    async fn fetch(&self, user_id: &str) -> Result<Option<UserQuotaRecord>, QuotaStoreError> {
        let record = sqlx::query_as::<_, UserQuotaRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM user_quotas WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn reserve_with(
        &self,
        user_id: &str,
        rule: Rule<'_>,
    ) -> Result<QuotaDecision, QuotaStoreError> {
        let mut tx = self.pool.begin().await?;

        // Make sure there is a row to lock; first attempt creates it with defaults.
        sqlx::query("INSERT INTO user_quotas (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let current = sqlx::query_as::<_, UserQuotaRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM user_quotas WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let evaluation = rule(current);

        if let Some(updated) = &evaluation.grant {
            sqlx::query(
                r#"
                UPDATE user_quotas
                SET last_reservation_date = $2,
                    reservations_today = $3,
                    last_reservation_at = $4,
                    updated_at = $5
                WHERE user_id = $1
                "#,
            )
            .bind(user_id)
            .bind(updated.last_reservation_date)
            .bind(updated.reservations_today)
            .bind(updated.last_reservation_at)
            .bind(updated.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            user_id,
            allowed = evaluation.decision.allowed,
            wrote = evaluation.grant.is_some(),
            "Quota transaction committed"
        );
        Ok(evaluation.decision)
    }
}
