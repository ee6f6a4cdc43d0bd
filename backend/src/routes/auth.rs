//! Registration and login.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};

use recordvault_common::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use super::{blocking, json_body};
use crate::error::StoreError;
use crate::AppState;

/// POST /api/register - Create an account
async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, StoreError> {
    let body = json_body(payload)?;
    let credentials = state.credentials.clone();

    let user_id = blocking(move || {
        credentials.register(
            body.username.as_deref().unwrap_or_default(),
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
    })
    .await?;

    Ok(Json(RegisterResponse {
        success: true,
        message: "Registration successful".to_string(),
        user_id,
    }))
}

/// POST /api/login - Check credentials and return the public user
async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, StoreError> {
    let body = json_body(payload)?;
    let credentials = state.credentials.clone();

    let user = blocking(move || {
        credentials.verify_credentials(
            body.username.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
    })
    .await?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        user,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}
