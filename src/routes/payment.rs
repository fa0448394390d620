use axum::{middleware, routing::get, Router};

use crate::handlers::payment_handlers;
use crate::middleware::auth::{optional_auth, require_auth};
use crate::state::AppState;

pub fn payment_routes(state: AppState) -> Router<AppState> {
    let pay = Router::new()
        .route("/pay", get(payment_handlers::initiate_payment))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    let transactions = Router::new()
        .route("/transactions", get(payment_handlers::get_transactions))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .merge(pay)
        .merge(transactions)
        // Provider callback
        .route("/redirectUrl", get(payment_handlers::payment_callback))
        .route("/redirectUrl/", get(payment_handlers::payment_callback))
        .route("/redirectUrl/:merchantTransactionId", get(payment_handlers::payment_callback))
        // Landing pages
        .route("/success", get(payment_handlers::success_page))
        .route("/error", get(payment_handlers::error_page))
        .route("/pending", get(payment_handlers::pending_page))
}
