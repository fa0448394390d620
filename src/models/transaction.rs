// models/transaction.rs
use serde::{Deserialize, Serialize};
use mongodb::bson::{self, oid::ObjectId};
use validator::Validate;

use crate::errors::{AppError, Result};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
}

/// A payment the provider confirmed as `PAYMENT_SUCCESS`. Stored in `payments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub merchant_transaction_id: String,
    pub user_id: String,
    pub amount: i64,
    pub status: TransactionStatus,
    pub created_at: bson::DateTime,
}

impl TransactionRecord {
    pub fn success(merchant_transaction_id: impl Into<String>, user_id: impl Into<String>, amount: i64) -> Self {
        TransactionRecord {
            id: None,
            merchant_transaction_id: merchant_transaction_id.into(),
            user_id: user_id.into(),
            amount,
            status: TransactionStatus::Success,
            created_at: bson::DateTime::now(),
        }
    }
}

/// Outcome of inserting a record under the unique transaction id index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransactionQuery {
    #[validate(range(min = 1, max = 1_000_000, message = "page must be between 1 and 1000000"))]
    pub page: Option<u64>,

    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl TransactionQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT)
    }

    pub fn skip(&self) -> Result<u64> {
        (self.page() - 1)
            .checked_mul(self.limit() as u64)
            .filter(|_| self.page() <= MAX_PAGE)
            .ok_or_else(|| AppError::invalid_data("page out of range"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: Option<String>,
    pub merchant_transaction_id: String,
    pub user_id: String,
    pub amount: i64,
    pub status: TransactionStatus,
    pub created_at: String,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        TransactionResponse {
            id: record.id.map(|id| id.to_hex()),
            merchant_transaction_id: record.merchant_transaction_id,
            user_id: record.user_id,
            amount: record.amount,
            status: record.status,
            created_at: record
                .created_at
                .try_to_rfc3339_string()
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionResponse>,
    pub count: usize,
    pub page: u64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_camel_case_fields() {
        let record = TransactionRecord::success("txn123", "42", 10000);
        let doc = bson::to_document(&record).unwrap();

        assert_eq!(doc.get_str("merchantTransactionId").unwrap(), "txn123");
        assert_eq!(doc.get_str("userId").unwrap(), "42");
        assert_eq!(doc.get_i64("amount").unwrap(), 10000);
        assert_eq!(doc.get_str("status").unwrap(), "success");
        assert!(doc.get_datetime("createdAt").is_ok());
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn query_defaults_and_skip() {
        let query = TransactionQuery { page: None, limit: None };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(query.skip().unwrap(), 0);

        let query = TransactionQuery { page: Some(3), limit: Some(10) };
        assert_eq!(query.skip().unwrap(), 20);
    }

    #[test]
    fn skip_rejects_pages_past_the_bound() {
        let query = TransactionQuery { page: Some(u64::MAX), limit: Some(100) };
        assert!(query.validate().is_err());
        assert!(query.skip().is_err());

        let query = TransactionQuery { page: Some(MAX_PAGE), limit: Some(MAX_PAGE_LIMIT) };
        assert!(query.validate().is_ok());
        assert_eq!(query.skip().unwrap(), (MAX_PAGE - 1) * 100);
    }

    #[test]
    fn query_validation_rejects_out_of_range_values() {
        assert!(TransactionQuery { page: Some(0), limit: None }.validate().is_err());
        assert!(TransactionQuery { page: None, limit: Some(101) }.validate().is_err());
        assert!(TransactionQuery { page: Some(2), limit: Some(50) }.validate().is_ok());
    }
}
