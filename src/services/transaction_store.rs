// services/transaction_store.rs
use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteError, WriteFailure},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::errors::{AppError, Result};
use crate::models::pending_payment::PendingPayment;
use crate::models::transaction::{InsertOutcome, TransactionRecord};

pub const TRANSACTIONS_COLLECTION: &str = "payments";
pub const PENDING_COLLECTION: &str = "pending_payments";

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Unresolved pending rows are dropped by MongoDB after this long.
pub const PENDING_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn save_pending(&self, pending: PendingPayment) -> Result<()>;

    async fn find_pending(&self, merchant_transaction_id: &str) -> Result<Option<PendingPayment>>;

    /// A second record for the same merchant transaction id is a no-op.
    async fn record_transaction(&self, record: TransactionRecord) -> Result<InsertOutcome>;

    /// Records for one user in insertion order.
    async fn list_transactions(&self, user_id: &str, skip: u64, limit: i64) -> Result<Vec<TransactionRecord>>;
}

pub fn pending_ttl_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "createdAt": 1 })
        .options(IndexOptions::builder().expire_after(PENDING_TTL).build())
        .build()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code: DUPLICATE_KEY_CODE, .. }))
    )
}

#[derive(Clone)]
pub struct MongoTransactionStore {
    db: Database,
    transactions: Collection<TransactionRecord>,
    pending: Collection<PendingPayment>,
}

impl MongoTransactionStore {
    pub fn new(db: Database) -> Self {
        MongoTransactionStore {
            transactions: db.collection(TRANSACTIONS_COLLECTION),
            pending: db.collection(PENDING_COLLECTION),
            db,
        }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique_id = || {
            IndexModel::builder()
                .keys(doc! { "merchantTransactionId": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };

        self.transactions.create_index(unique_id()).await?;
        self.pending.create_index(unique_id()).await?;
        self.pending.create_index(pending_ttl_index()).await?;
        self.transactions
            .create_index(IndexModel::builder().keys(doc! { "userId": 1, "_id": 1 }).build())
            .await?;

        info!("Indexes ensured on '{}' and '{}'", TRANSACTIONS_COLLECTION, PENDING_COLLECTION);
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for MongoTransactionStore {
    async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn save_pending(&self, pending: PendingPayment) -> Result<()> {
        self.pending.insert_one(&pending).await?;
        Ok(())
    }

    async fn find_pending(&self, merchant_transaction_id: &str) -> Result<Option<PendingPayment>> {
        let filter = doc! { "merchantTransactionId": merchant_transaction_id };
        Ok(self.pending.find_one(filter).await?)
    }

    async fn record_transaction(&self, record: TransactionRecord) -> Result<InsertOutcome> {
        match self.transactions.insert_one(&record).await {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_duplicate_key(&e) => {
                warn!("Duplicate callback for {}, keeping existing record", record.merchant_transaction_id);
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_transactions(&self, user_id: &str, skip: u64, limit: i64) -> Result<Vec<TransactionRecord>> {
        let cursor = self
            .transactions
            .find(doc! { "userId": user_id })
            .sort(doc! { "_id": 1 })
            .skip(skip)
            .limit(limit)
            .await?;

        Ok(cursor.try_collect().await?)
    }
}

/// Process-local store with the same uniqueness rules as the Mongo one.
#[derive(Default)]
pub struct MemoryTransactionStore {
    transactions: RwLock<Vec<TransactionRecord>>,
    pending: RwLock<Vec<PendingPayment>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all_transactions(&self) -> Vec<TransactionRecord> {
        self.transactions.read().await.clone()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn save_pending(&self, pending: PendingPayment) -> Result<()> {
        let mut rows = self.pending.write().await;
        if rows
            .iter()
            .any(|p| p.merchant_transaction_id == pending.merchant_transaction_id)
        {
            return Err(AppError::store(format!(
                "duplicate pending payment {}",
                pending.merchant_transaction_id
            )));
        }
        rows.push(pending);
        Ok(())
    }

    async fn find_pending(&self, merchant_transaction_id: &str) -> Result<Option<PendingPayment>> {
        Ok(self
            .pending
            .read()
            .await
            .iter()
            .find(|p| p.merchant_transaction_id == merchant_transaction_id)
            .cloned())
    }

    async fn record_transaction(&self, record: TransactionRecord) -> Result<InsertOutcome> {
        let mut rows = self.transactions.write().await;
        if rows
            .iter()
            .any(|r| r.merchant_transaction_id == record.merchant_transaction_id)
        {
            warn!("Duplicate callback for {}, keeping existing record", record.merchant_transaction_id);
            return Ok(InsertOutcome::Duplicate);
        }
        rows.push(record);
        Ok(InsertOutcome::Inserted)
    }

    async fn list_transactions(&self, user_id: &str, skip: u64, limit: i64) -> Result<Vec<TransactionRecord>> {
        Ok(self
            .transactions
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn duplicate_records_are_a_no_op() {
        let store = MemoryTransactionStore::new();

        let first = store
            .record_transaction(TransactionRecord::success("txn123", "42", 10000))
            .await
            .unwrap();
        let second = store
            .record_transaction(TransactionRecord::success("txn123", "42", 10000))
            .await
            .unwrap();

        assert_eq!(first, InsertOutcome::Inserted);
        assert_eq!(second, InsertOutcome::Duplicate);
        assert_eq!(store.all_transactions().await.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_inserts_for_one_id_store_one_record() {
        let store = Arc::new(MemoryTransactionStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .record_transaction(TransactionRecord::success("race", "42", 500))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() == InsertOutcome::Inserted {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.all_transactions().await.len(), 1);
    }

    #[tokio::test]
    async fn listing_is_scoped_and_paginated_in_insertion_order() {
        let store = MemoryTransactionStore::new();
        for i in 0..5 {
            store
                .record_transaction(TransactionRecord::success(format!("a{}", i), "alice", 100 + i))
                .await
                .unwrap();
            store
                .record_transaction(TransactionRecord::success(format!("b{}", i), "bob", 200 + i))
                .await
                .unwrap();
        }

        let page = store.list_transactions("alice", 2, 2).await.unwrap();
        let ids: Vec<_> = page.iter().map(|r| r.merchant_transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "a3"]);

        let all = store.list_transactions("bob", 0, 100).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|r| r.user_id == "bob"));
    }

    #[test]
    fn pending_rows_expire_on_created_at() {
        let index = pending_ttl_index();
        assert_eq!(index.keys, doc! { "createdAt": 1 });

        let options = index.options.unwrap();
        assert_eq!(options.expire_after, Some(PENDING_TTL));
        assert!(options.unique.is_none());
    }

    #[tokio::test]
    async fn pending_payments_round_trip_by_id() {
        let store = MemoryTransactionStore::new();
        store
            .save_pending(PendingPayment::new("MTabc", "alice", 2500))
            .await
            .unwrap();

        let found = store.find_pending("MTabc").await.unwrap().unwrap();
        assert_eq!(found.user_id, "alice");
        assert_eq!(found.amount, 2500);
        assert!(store.find_pending("missing").await.unwrap().is_none());
        assert!(store.save_pending(PendingPayment::new("MTabc", "bob", 1)).await.is_err());
    }
}
