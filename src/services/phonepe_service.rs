// services/phonepe_service.rs
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as base64, Engine as _};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::PhonePeConfig;
use crate::errors::{AppError, Result};

pub const PAY_ENDPOINT: &str = "/pg/v1/pay";
pub const STATUS_ENDPOINT: &str = "/pg/v1/status";
pub const CALLBACK_PATH: &str = "/redirectUrl";

pub const CODE_PAYMENT_SUCCESS: &str = "PAYMENT_SUCCESS";
pub const CODE_PAYMENT_ERROR: &str = "PAYMENT_ERROR";

const MAX_TRANSACTION_ID_LEN: usize = 35;

// Pay request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PayPayload {
    pub merchant_id: String,
    pub merchant_transaction_id: String,
    pub merchant_user_id: String,
    pub amount: i64,
    pub redirect_url: String,
    pub redirect_mode: String,
    pub mobile_number: String,
    pub payment_instrument: PaymentInstrument,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentInstrument {
    #[serde(rename = "type")]
    pub instrument_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PayRequestBody {
    pub request: String,
}

// Pay response
#[derive(Debug, Deserialize)]
pub struct PayResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub code: String,
    pub message: Option<String>,
    pub data: Option<PayResponseData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponseData {
    pub merchant_transaction_id: Option<String>,
    pub instrument_response: Option<InstrumentResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentResponse {
    pub redirect_info: Option<RedirectInfo>,
}

#[derive(Debug, Deserialize)]
pub struct RedirectInfo {
    pub url: String,
    pub method: Option<String>,
}

impl PayResponse {
    pub fn redirect_url(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .instrument_response
            .as_ref()?
            .redirect_info
            .as_ref()
            .map(|info| info.url.as_str())
    }
}

// Status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub success: bool,
    pub code: String,
    pub message: Option<String>,
    pub data: Option<StatusData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    pub merchant_id: Option<String>,
    pub merchant_transaction_id: Option<String>,
    pub transaction_id: Option<String>,
    pub amount: Option<i64>,
    pub state: Option<String>,
    pub response_code: Option<String>,
}

impl StatusResponse {
    pub fn outcome(&self) -> PaymentOutcome {
        PaymentOutcome::from_code(&self.code)
    }

    pub fn reported_amount(&self) -> Option<i64> {
        self.data.as_ref().and_then(|d| d.amount)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success,
    Error,
    Pending,
}

impl PaymentOutcome {
    pub fn from_code(code: &str) -> Self {
        match code {
            CODE_PAYMENT_SUCCESS => PaymentOutcome::Success,
            CODE_PAYMENT_ERROR => PaymentOutcome::Error,
            _ => PaymentOutcome::Pending,
        }
    }
}

/// What the booking side asks the provider to charge.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub merchant_transaction_id: String,
    pub user_id: String,
    pub amount: i64,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns the provider-hosted page the payer must be redirected to.
    async fn initiate_payment(&self, request: &PaymentRequest) -> Result<String>;

    async fn query_status(&self, merchant_transaction_id: &str) -> Result<StatusResponse>;
}

pub fn generate_merchant_transaction_id() -> String {
    let mut id = format!("MT{}", Uuid::new_v4().simple());
    id.truncate(MAX_TRANSACTION_ID_LEN);
    id
}

pub fn is_valid_merchant_transaction_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_TRANSACTION_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn callback_url(config: &PhonePeConfig, merchant_transaction_id: &str) -> String {
    format!("{}{}/{}", config.redirect_base_url, CALLBACK_PATH, merchant_transaction_id)
}

pub fn build_pay_payload(config: &PhonePeConfig, request: &PaymentRequest) -> PayPayload {
    PayPayload {
        merchant_id: config.merchant_id.clone(),
        merchant_transaction_id: request.merchant_transaction_id.clone(),
        merchant_user_id: request.user_id.clone(),
        amount: request.amount,
        redirect_url: callback_url(config, &request.merchant_transaction_id),
        redirect_mode: "REDIRECT".to_string(),
        mobile_number: config.mobile_number.clone(),
        payment_instrument: PaymentInstrument {
            instrument_type: "PAY_PAGE".to_string(),
        },
    }
}

pub fn encode_payload(payload: &PayPayload) -> Result<String> {
    let json = serde_json::to_vec(payload)?;
    Ok(base64.encode(json))
}

/// `hex(sha256(message + salt_key)) + "###" + salt_index`
pub fn x_verify(config: &PhonePeConfig, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    hasher.update(config.salt_key.as_bytes());
    format!("{}###{}", hex::encode(hasher.finalize()), config.salt_index)
}

pub fn status_path(config: &PhonePeConfig, merchant_transaction_id: &str) -> String {
    format!("{}/{}/{}", STATUS_ENDPOINT, config.merchant_id, merchant_transaction_id)
}

#[derive(Debug, Clone)]
pub struct PhonePeService {
    config: PhonePeConfig,
    client: Client,
}

impl PhonePeService {
    pub fn new(config: PhonePeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(PhonePeService { config, client })
    }
}

#[async_trait]
impl PaymentGateway for PhonePeService {
    async fn initiate_payment(&self, request: &PaymentRequest) -> Result<String> {
        info!(
            "PhonePe: initiating {} for user {} - {} paise",
            request.merchant_transaction_id, request.user_id, request.amount
        );

        let payload = build_pay_payload(&self.config, request);
        let encoded = encode_payload(&payload)?;
        let signature = x_verify(&self.config, &format!("{}{}", encoded, PAY_ENDPOINT));

        let response = self
            .client
            .post(format!("{}{}", self.config.base_url, PAY_ENDPOINT))
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-VERIFY", signature)
            .json(&PayRequestBody { request: encoded })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("PhonePe pay failed: {} - {}", status, body);
            return Err(AppError::phonepe(format!("pay request failed: {}", status)));
        }

        let pay_response: PayResponse = response.json().await?;
        debug!("PhonePe pay response: {:?}", pay_response);

        match pay_response.redirect_url() {
            Some(url) => {
                info!("PhonePe pay page ready for {}", request.merchant_transaction_id);
                Ok(url.to_string())
            }
            None => Err(AppError::phonepe(format!(
                "pay response without redirect url (code {})",
                pay_response.code
            ))),
        }
    }

    async fn query_status(&self, merchant_transaction_id: &str) -> Result<StatusResponse> {
        let path = status_path(&self.config, merchant_transaction_id);
        let signature = x_verify(&self.config, &path);

        let response = self
            .client
            .get(format!("{}{}", self.config.base_url, path))
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-MERCHANT-ID", &self.config.merchant_id)
            .header("X-VERIFY", signature)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("PhonePe status for {}: {} - {}", merchant_transaction_id, status, body);

        // Failed payments come back as non-2xx with a JSON body carrying the code.
        match serde_json::from_str::<StatusResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => {
                error!("PhonePe status failed: {} - {}", status, body);
                Err(AppError::phonepe(format!("status request failed: {}", status)))
            }
            Err(e) => Err(AppError::phonepe(format!("invalid status response: {}", e))),
        }
    }
}
