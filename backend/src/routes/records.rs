//! Per-user record CRUD.
//!
//! The `userId` in requests is trusted as given; there is no session binding
//! it to the caller.

use std::sync::Arc;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use recordvault_common::{
    AckResponse, CreateRecordRequest, CreateRecordResponse, RecordsResponse, UpdateRecordRequest,
};

use super::{json_body, path_id};
use crate::error::StoreError;
use crate::AppState;

/// POST /api/userdata - Save a record for a user
async fn create_record(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateRecordRequest>, JsonRejection>,
) -> Result<Json<CreateRecordResponse>, StoreError> {
    let body = json_body(payload)?;
    let id = state.records.create(
        body.user_id.unwrap_or(0),
        body.title.as_deref().unwrap_or_default(),
        body.description.as_deref(),
        body.data.as_ref(),
    )?;

    Ok(Json(CreateRecordResponse {
        success: true,
        message: "Data saved successfully".to_string(),
        id,
    }))
}

/// GET /api/userdata/:userId - List a user's records, newest first
async fn list_records(
    State(state): State<Arc<AppState>>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<RecordsResponse>, StoreError> {
    let data = state.records.list_by_owner(path_id(user_id)?)?;
    Ok(Json(RecordsResponse { success: true, data }))
}

/// PUT /api/userdata/:id - Overwrite a record
async fn update_record(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateRecordRequest>, JsonRejection>,
) -> Result<Json<AckResponse>, StoreError> {
    let id = path_id(id)?;
    let body = json_body(payload)?;
    state.records.update(
        id,
        body.title.as_deref().unwrap_or_default(),
        body.description.as_deref(),
        body.data.as_ref(),
    )?;
    Ok(Json(AckResponse::ok("Data updated successfully")))
}

/// DELETE /api/userdata/:id - Delete one record
async fn delete_record(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AckResponse>, StoreError> {
    state.records.delete_by_id(path_id(id)?)?;
    Ok(Json(AckResponse::ok("Data deleted successfully")))
}

pub fn router(state: Arc<AppState>) -> Router {
    // GET takes a user id, PUT and DELETE a record id.
    Router::new()
        .route("/userdata", post(create_record))
        .route(
            "/userdata/:id",
            get(list_records).put(update_record).delete(delete_record),
        )
        .with_state(state)
}
