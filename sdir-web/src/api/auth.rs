//! Authentication endpoints
//!
//! Thin wrappers over the identity provider. Every successful transition is
//! published on the identity bus so SSE subscribers follow along.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use sdir_common::events::IdentityState;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub uid: String,
    pub email: String,
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub uid: String,
    pub email: String,
}

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))
}

fn validate_credentials(creds: &Credentials) -> ApiResult<()> {
    if creds.email.trim().is_empty() || !creds.email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".to_string()));
    }
    if creds.password.is_empty() {
        return Err(ApiError::Validation("a password is required".to_string()));
    }
    Ok(())
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    validate_credentials(&creds)?;
    let session = state.identity.register(&creds.email, &creds.password).await?;
    info!(email = %session.email, "Registered new account");

    state.identity_bus.publish(IdentityState::SignedIn {
        uid: session.uid.clone(),
        email: session.email.clone(),
    });

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            uid: session.uid,
            email: session.email,
            id_token: session.id_token,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> ApiResult<Json<SessionResponse>> {
    validate_credentials(&creds)?;
    let session = state.identity.login(&creds.email, &creds.password).await?;
    info!(email = %session.email, "Signed in");

    state.identity_bus.publish(IdentityState::SignedIn {
        uid: session.uid.clone(),
        email: session.email.clone(),
    });

    Ok(Json(SessionResponse {
        uid: session.uid,
        email: session.email,
        id_token: session.id_token,
    }))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> StatusCode {
    state.identity_bus.publish(IdentityState::SignedOut);
    StatusCode::NO_CONTENT
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<IdentityResponse>> {
    let token = bearer_token(&headers)?;
    let identity = state.identity.lookup(token).await?;
    Ok(Json(IdentityResponse {
        uid: identity.uid,
        email: identity.email,
    }))
}

/// DELETE /api/auth/me
///
/// Deletes the account and cascades to any student record it owns.
pub async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let token = bearer_token(&headers)?;
    let identity = state.identity.lookup(token).await?;

    let records = state.store.list_all().await?;
    for record in records {
        if record.owner_ref.as_deref() == Some(identity.uid.as_str()) {
            if let Some(id) = record.id.as_deref() {
                state.store.delete(id).await?;
                info!(record_id = %id, "Deleted student record owned by removed account");
            }
        }
    }

    state.identity.delete_account(token).await?;
    state.identity_bus.publish(IdentityState::SignedOut);
    info!(uid = %identity.uid, "Deleted account");

    Ok(StatusCode::NO_CONTENT)
}
