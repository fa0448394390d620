use std::sync::Arc;

use crate::config::PhonePeConfig;
use crate::services::phonepe_service::PaymentGateway;
use crate::services::transaction_store::TransactionStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TransactionStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub phonepe: Arc<PhonePeConfig>,
    pub jwt_secret: Arc<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        gateway: Arc<dyn PaymentGateway>,
        phonepe: PhonePeConfig,
        jwt_secret: impl Into<String>,
    ) -> Self {
        AppState {
            store,
            gateway,
            phonepe: Arc::new(phonepe),
            jwt_secret: Arc::new(jwt_secret.into()),
        }
    }
}
