// handlers/payment_handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn};
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::pending_payment::PendingPayment;
use crate::models::transaction::{
    InsertOutcome, TransactionListResponse, TransactionQuery, TransactionRecord, TransactionResponse,
};
use crate::models::user::Claims;
use crate::services::phonepe_service::{
    generate_merchant_transaction_id, is_valid_merchant_transaction_id, PaymentOutcome, PaymentRequest,
    StatusResponse,
};
use crate::state::AppState;

pub const SUCCESS_PAGE: &str = "/success";
pub const ERROR_PAGE: &str = "/error";
pub const PENDING_PAGE: &str = "/pending";

#[derive(Debug, Deserialize)]
pub struct PayQuery {
    pub amount: Option<i64>,
}

/// 302 Found, the status the provider hand-off expects.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub async fn initiate_payment(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Query(query): Query<PayQuery>,
) -> Result<Response> {
    let amount = query.amount.unwrap_or(state.phonepe.default_amount);
    if amount <= 0 {
        return Err(AppError::invalid_data("amount must be greater than 0"));
    }

    let user_id = match claims {
        Some(Extension(claims)) => claims.sub,
        None => state.phonepe.default_user_id.clone(),
    };

    let request = PaymentRequest {
        merchant_transaction_id: generate_merchant_transaction_id(),
        user_id,
        amount,
    };

    let pending = PendingPayment::new(&request.merchant_transaction_id, &request.user_id, request.amount);
    if let Err(e) = state.store.save_pending(pending).await {
        error!("Failed to save pending payment {}: {}", request.merchant_transaction_id, e);
        return Ok(found(ERROR_PAGE));
    }

    match state.gateway.initiate_payment(&request).await {
        Ok(url) => {
            info!("Redirecting {} to provider page", request.merchant_transaction_id);
            Ok(found(&url))
        }
        Err(e) => {
            error!("Failed to initiate payment {}: {}", request.merchant_transaction_id, e);
            Ok(found(ERROR_PAGE))
        }
    }
}

pub async fn payment_callback(
    State(state): State<AppState>,
    merchant_transaction_id: Option<Path<String>>,
) -> Result<Response> {
    let merchant_transaction_id = match merchant_transaction_id {
        Some(Path(id)) if !id.trim().is_empty() => id,
        _ => return Err(AppError::MissingTransactionId),
    };

    if !is_valid_merchant_transaction_id(&merchant_transaction_id) {
        return Err(AppError::invalid_data("invalid merchant transaction id"));
    }

    let status = match state.gateway.query_status(&merchant_transaction_id).await {
        Ok(status) => status,
        Err(e) => {
            error!("Error fetching payment status for {}: {}", merchant_transaction_id, e);
            return Ok(found(ERROR_PAGE));
        }
    };
    info!("Payment status for {}: {}", merchant_transaction_id, status.code);

    match status.outcome() {
        PaymentOutcome::Success => Ok(record_success(&state, &merchant_transaction_id, &status).await),
        PaymentOutcome::Error => Ok(found(ERROR_PAGE)),
        PaymentOutcome::Pending => Ok(found(PENDING_PAGE)),
    }
}

async fn record_success(state: &AppState, merchant_transaction_id: &str, status: &StatusResponse) -> Response {
    let (user_id, amount) = match state.store.find_pending(merchant_transaction_id).await {
        Ok(Some(pending)) => {
            if let Some(reported) = status.reported_amount() {
                if reported != pending.amount {
                    warn!(
                        "Amount mismatch for {}: requested {}, provider reported {}",
                        merchant_transaction_id, pending.amount, reported
                    );
                }
            }
            (pending.user_id, pending.amount)
        }
        Ok(None) => {
            warn!(
                "No pending payment for {}, using provider amount and default user",
                merchant_transaction_id
            );
            (
                state.phonepe.default_user_id.clone(),
                status.reported_amount().unwrap_or(state.phonepe.default_amount),
            )
        }
        Err(e) => {
            error!("Error loading pending payment {}: {}", merchant_transaction_id, e);
            return found(ERROR_PAGE);
        }
    };

    let record = TransactionRecord::success(merchant_transaction_id, user_id, amount);
    match state.store.record_transaction(record).await {
        Ok(InsertOutcome::Inserted) => {
            info!("Payment data saved: {}", merchant_transaction_id);
            found(SUCCESS_PAGE)
        }
        Ok(InsertOutcome::Duplicate) => found(SUCCESS_PAGE),
        Err(e) => {
            error!("Error saving payment data for {}: {}", merchant_transaction_id, e);
            found(ERROR_PAGE)
        }
    }
}

pub async fn get_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<TransactionListResponse>> {
    query.validate()?;

    let records = state
        .store
        .list_transactions(&claims.sub, query.skip()?, query.limit())
        .await?;

    let transactions: Vec<TransactionResponse> = records.into_iter().map(TransactionResponse::from).collect();

    Ok(Json(TransactionListResponse {
        count: transactions.len(),
        transactions,
        page: query.page(),
        limit: query.limit(),
    }))
}

pub async fn success_page() -> &'static str {
    "Payment successful"
}

pub async fn error_page() -> &'static str {
    "Payment failed"
}

pub async fn pending_page() -> &'static str {
    "Payment pending"
}
