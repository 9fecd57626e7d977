use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use crate::sharing::dto::{AccessQuery, ShareRequest};
use crate::sharing::services::{self, ShareError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health_data/share", post(share))
        .route("/health_data/access", get(access))
}

#[instrument(skip(state))]
pub async fn share(
    State(state): State<AppState>,
    Json(payload): Json<ShareRequest>,
) -> Result<String, (StatusCode, String)> {
    let grant = services::create_grant(&state, &payload.record_id)
        .await
        .map_err(internal)?;
    Ok(format!("Share link created. Access code: {}", grant.code))
}

/// Success returns the record as JSON. Every failure is a plain
/// human-readable message, never a structured error, and wrong codes are
/// not distinguishable from expired ones.
#[instrument(skip(state))]
pub async fn access(State(state): State<AppState>, Query(query): Query<AccessQuery>) -> Response {
    match services::validate_and_consume(&state, &query.code).await {
        Ok(record) => Json(record).into_response(),
        Err(e @ (ShareError::GrantNotFound | ShareError::RecordGone)) => {
            e.to_string().into_response()
        }
        Err(ShareError::Storage(e)) => internal(e).into_response(),
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "grant store failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use serde_json::json;
    use time::macros::datetime;

    use super::*;
    use crate::clock::ManualClock;

    fn test_state() -> AppState {
        let clock = Arc::new(ManualClock::new(datetime!(2026-01-01 00:00 UTC)));
        let (state, _rx) = AppState::in_memory(clock);
        state
    }

    async fn body_string(res: Response) -> String {
        let bytes = to_bytes(res.into_body(), 64 * 1024).await.expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    #[tokio::test]
    async fn share_confirmation_contains_the_code() {
        let state = test_state();
        let msg = share(
            State(state.clone()),
            Json(ShareRequest {
                record_id: "any-record".into(),
            }),
        )
        .await
        .expect("share");
        assert!(msg.starts_with("Share link created. Access code: "));

        let code = msg.rsplit(' ').next().expect("code suffix");
        assert_eq!(code.len(), 8);
    }

    #[tokio::test]
    async fn access_returns_record_json_on_success() {
        let state = test_state();
        let record = state
            .records
            .create("owner-1", "bp", json!({"sys": 121}))
            .await
            .expect("create record");
        let grant = services::create_grant(&state, &record.id.to_string())
            .await
            .expect("create grant");

        let res = access(
            State(state),
            Query(AccessQuery {
                code: grant.code.clone(),
            }),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&body_string(res).await).expect("json body");
        assert_eq!(body["data"]["sys"], 121);
        assert_eq!(body["owner_id"], "owner-1");
    }

    #[tokio::test]
    async fn absent_code_gets_the_uniform_not_found_message() {
        let state = test_state();

        // No `code` parameter at all must still deserialize, to an empty
        // code, instead of rejecting the request.
        let uri: axum::http::Uri = "/health_data/access".parse().expect("uri");
        let Query(query) =
            Query::<AccessQuery>::try_from_uri(&uri).expect("absent code still extracts");
        assert_eq!(query.code, "");

        let res = access(State(state), Query(query)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, "Invalid or expired access code");
    }

    #[tokio::test]
    async fn access_failures_are_plain_messages() {
        let state = test_state();

        let res = access(
            State(state.clone()),
            Query(AccessQuery {
                code: "nope1234".into(),
            }),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, "Invalid or expired access code");

        // Grant pointing at a record that was never created.
        let grant = services::create_grant(&state, "gone-record")
            .await
            .expect("create grant");
        let res = access(State(state), Query(AccessQuery { code: grant.code })).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, "Health record not found");
    }
}
