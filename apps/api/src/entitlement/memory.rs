//! In-memory `UsageLedger` for tests. The map key enforces the same
//! one-row-per-pair rule as the Postgres unique constraint.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::entitlement::ledger::{InsertOutcome, UsageLedger};
use crate::models::usage::UsageRecordRow;

#[derive(Default)]
pub struct InMemoryUsageLedger {
    records: Mutex<HashMap<(Uuid, Uuid), UsageRecordRow>>,
}

impl InMemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a grant directly, bypassing the evaluator.
    pub fn seed(&self, user_id: Uuid, template_id: Uuid) {
        self.records
            .lock()
            .unwrap()
            .entry((user_id, template_id))
            .or_insert_with(|| record(user_id, template_id));
    }

    pub fn total_records(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

fn record(user_id: Uuid, template_id: Uuid) -> UsageRecordRow {
    UsageRecordRow {
        id: Uuid::new_v4(),
        user_id,
        template_id,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl UsageLedger for InMemoryUsageLedger {
    async fn exists(&self, user_id: Uuid, template_id: Uuid) -> Result<bool> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .contains_key(&(user_id, template_id)))
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<u64> {
        let records = self.records.lock().unwrap();
        Ok(records.keys().filter(|(u, _)| *u == user_id).count() as u64)
    }

    async fn try_insert(&self, user_id: Uuid, template_id: Uuid) -> Result<InsertOutcome> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&(user_id, template_id)) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        records.insert((user_id, template_id), record(user_id, template_id));
        Ok(InsertOutcome::Inserted)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UsageRecordRow>> {
        let records = self.records.lock().unwrap();
        let mut rows: Vec<_> = records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_second_insert_reports_already_exists() {
        let ledger = InMemoryUsageLedger::new();
        let (user, template) = (Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(
            ledger.try_insert(user, template).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            ledger.try_insert(user, template).await.unwrap(),
            InsertOutcome::AlreadyExists
        );
        assert_eq!(ledger.count_for_user(user).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_leave_one_record() {
        let ledger = Arc::new(InMemoryUsageLedger::new());
        let (user, template) = (Uuid::new_v4(), Uuid::new_v4());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.try_insert(user, template).await.unwrap() })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() == InsertOutcome::Inserted {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(ledger.total_records(), 1);
    }

    #[tokio::test]
    async fn test_count_is_per_user() {
        let ledger = InMemoryUsageLedger::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        ledger.seed(alice, Uuid::new_v4());
        ledger.seed(alice, Uuid::new_v4());
        ledger.seed(bob, Uuid::new_v4());

        assert_eq!(ledger.count_for_user(alice).await.unwrap(), 2);
        assert_eq!(ledger.count_for_user(bob).await.unwrap(), 1);
        assert_eq!(ledger.list_for_user(alice).await.unwrap().len(), 2);
    }
}
