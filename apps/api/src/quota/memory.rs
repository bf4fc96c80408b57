//! Process-local quota store. Atomic within one process only.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::quota::{QuotaDecision, UserQuotaRecord};
use crate::quota::store::{QuotaStore, QuotaStoreError, Rule};

#[derive(Default)]
pub struct InMemoryQuotaStore {
    records: Mutex<HashMap<String, UserQuotaRecord>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn insert(&self, record: UserQuotaRecord) {
        self.records
            .lock()
            .await
            .insert(record.user_id.clone(), record);
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn fetch(&self, user_id: &str) -> Result<Option<UserQuotaRecord>, QuotaStoreError> {
        Ok(self.records.lock().await.get(user_id).cloned())
    }

    async fn reserve_with(
        &self,
        user_id: &str,
        rule: Rule<'_>,
    ) -> Result<QuotaDecision, QuotaStoreError> {
        // The guard is held across read, evaluate and write.
        let mut records = self.records.lock().await;
        let current = records
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserQuotaRecord::fresh(user_id));

        let evaluation = rule(current);
        if let Some(updated) = evaluation.grant {
            records.insert(user_id.to_string(), updated);
        }
        Ok(evaluation.decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::clock::ManualClock;
    use crate::quota::QuotaLedger;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    const RACERS: usize = 32;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ))
    }

    async fn race(ledger: QuotaLedger, user_id: &'static str) -> usize {
        let handles: Vec<_> = (0..RACERS)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.reserve(user_id).await })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().allowed {
                granted += 1;
            }
        }
        granted
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_grant_exactly_one() {
        let ledger = QuotaLedger::new(Arc::new(InMemoryQuotaStore::new()), clock(), 1);
        assert_eq!(race(ledger, "racer").await, 1);
    }

    /// Reads, yields, then writes: the interleaving a non-transactional store allows.
    struct NonIsolatedStore {
        inner: InMemoryQuotaStore,
    }

    #[async_trait]
    impl QuotaStore for NonIsolatedStore {
        async fn fetch(&self, user_id: &str) -> Result<Option<UserQuotaRecord>, QuotaStoreError> {
            self.inner.fetch(user_id).await
        }

        async fn reserve_with(
            &self,
            user_id: &str,
            rule: Rule<'_>,
        ) -> Result<QuotaDecision, QuotaStoreError> {
            let current = self
                .inner
                .fetch(user_id)
                .await?
                .unwrap_or_else(|| UserQuotaRecord::fresh(user_id));
            tokio::task::yield_now().await;

            let evaluation = rule(current);
            if let Some(updated) = evaluation.grant {
                self.inner.insert(updated).await;
            }
            Ok(evaluation.decision)
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_non_isolated_store_double_grants() {
        let store = NonIsolatedStore {
            inner: InMemoryQuotaStore::new(),
        };
        let ledger = QuotaLedger::new(Arc::new(store), clock(), 1);
        assert!(
            race(ledger, "racer").await > 1,
            "without isolation every racer observes the empty record"
        );
    }
}
