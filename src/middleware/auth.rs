use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::errors::{AppError, Result};
use crate::models::user::Claims;
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
}

pub fn decode_claims(secret: &str, token: &str) -> Result<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_ref());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::new(Algorithm::HS256))?;
    Ok(token_data.claims)
}

/// Rejects the request with 401 unless it carries a valid Bearer token.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(&headers).ok_or(AppError::AuthError)?;
    let claims = decode_claims(&state.jwt_secret, token)?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Passes anonymous requests through. A request that sends credentials must
/// send a valid Bearer token or it is rejected with 401.
pub async fn optional_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    if headers.contains_key(AUTHORIZATION) {
        let token = bearer_token(&headers).ok_or(AppError::AuthError)?;
        let claims = decode_claims(&state.jwt_secret, token).map_err(|e| {
            tracing::debug!("Rejecting invalid bearer token on optional route: {}", e);
            e
        })?;
        request.extensions_mut().insert(claims);
    }

    Ok(next.run(request).await)
}
