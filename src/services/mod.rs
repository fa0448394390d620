pub mod phonepe_service;
pub mod transaction_store;
