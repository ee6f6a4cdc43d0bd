//! Admin API routes.
//!
//! Provides:
//! - All non-admin users with their records (`GET /api/admin/users`)
//! - One user with its records (`GET /api/admin/users/:userId`)
//! - Cascade delete of a user and its records (`DELETE /api/admin/users/:userId`)
//!
//! These routes are not gated: the system has no session to check a role
//! against.

use std::sync::Arc;

use axum::{
    extract::rejection::PathRejection,
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use recordvault_common::{AckResponse, AdminUserResponse, AdminUsersResponse};

use super::path_id;
use crate::error::StoreError;
use crate::AppState;

/// GET /api/admin/users - List all non-admin users with their records
async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdminUsersResponse>, StoreError> {
    let users = state.aggregation.list_users_with_data().await?;
    tracing::debug!("Returning {} users", users.len());
    Ok(Json(AdminUsersResponse {
        success: true,
        users,
    }))
}

/// GET /api/admin/users/:userId - One user with its records
async fn get_user(
    State(state): State<Arc<AppState>>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AdminUserResponse>, StoreError> {
    let user = state.aggregation.get_user_with_data(path_id(user_id)?)?;
    Ok(Json(AdminUserResponse {
        success: true,
        user,
    }))
}

/// DELETE /api/admin/users/:userId - Delete a user and everything it owns
async fn delete_user(
    State(state): State<Arc<AppState>>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AckResponse>, StoreError> {
    let user_id = path_id(user_id)?;
    state.aggregation.delete_user_cascade(user_id)?;
    tracing::info!(user_id, "Admin deleted user");
    Ok(Json(AckResponse::ok("User deleted successfully")))
}

/// Build the admin router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:user_id", get(get_user).delete(delete_user))
        .with_state(state)
}
