use serde::{Deserialize, Serialize};
use mongodb::bson::{self, oid::ObjectId};

/// Initiated payment awaiting the provider callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub merchant_transaction_id: String,
    pub user_id: String,
    pub amount: i64,
    pub created_at: bson::DateTime,
}

impl PendingPayment {
    pub fn new(merchant_transaction_id: impl Into<String>, user_id: impl Into<String>, amount: i64) -> Self {
        PendingPayment {
            id: None,
            merchant_transaction_id: merchant_transaction_id.into(),
            user_id: user_id.into(),
            amount,
            created_at: bson::DateTime::now(),
        }
    }
}
