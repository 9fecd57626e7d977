use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::auth::extractors::CurrentUser;
use crate::records::dto::{AddRecordRequest, DeleteRecordRequest, EditRecordRequest};
use crate::records::repo_types::HealthRecord;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/health_data/add", post(add_record))
        .route("/health_data/edit", post(edit_record))
        .route("/health_data/delete", post(delete_record))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(owner_id): CurrentUser,
) -> Result<Json<Vec<HealthRecord>>, (StatusCode, String)> {
    let records = state
        .records
        .list_by_owner(&owner_id)
        .await
        .map_err(internal)?;
    Ok(Json(records))
}

#[instrument(skip(state, payload))]
pub async fn add_record(
    State(state): State<AppState>,
    CurrentUser(owner_id): CurrentUser,
    Json(payload): Json<AddRecordRequest>,
) -> Result<String, (StatusCode, String)> {
    let record = state
        .records
        .create(&owner_id, &payload.category, payload.data)
        .await
        .map_err(internal)?;
    info!(record_id = %record.id, %owner_id, "health record added");
    Ok("Data added".into())
}

/// Updates a record and returns the owner's refreshed list, mirroring the
/// dashboard the edit form lands back on.
#[instrument(skip(state, payload))]
pub async fn edit_record(
    State(state): State<AppState>,
    CurrentUser(owner_id): CurrentUser,
    Json(payload): Json<EditRecordRequest>,
) -> Result<Json<Vec<HealthRecord>>, (StatusCode, String)> {
    state
        .records
        .update(payload.id, &payload.category, payload.data)
        .await
        .map_err(internal)?;
    let records = state
        .records
        .list_by_owner(&owner_id)
        .await
        .map_err(internal)?;
    Ok(Json(records))
}

/// Confirms regardless of whether a matching record existed.
#[instrument(skip(state))]
pub async fn delete_record(
    State(state): State<AppState>,
    Json(payload): Json<DeleteRecordRequest>,
) -> Result<String, (StatusCode, String)> {
    state.records.delete(payload.id).await.map_err(internal)?;
    info!(record_id = %payload.id, "health record deleted");
    Ok("Data deleted".into())
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "record store failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
}
