pub mod pending_payment;
pub mod transaction;
pub mod user;
