pub mod health;
pub mod payment_handlers;
