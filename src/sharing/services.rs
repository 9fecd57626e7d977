use thiserror::Error;
use time::Duration;
use tracing::{info, warn};

use crate::notify::AccessEvent;
use crate::records::repo_types::HealthRecord;
use crate::sharing::repo_types::AccessGrant;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ShareError {
    /// Unknown and expired codes are deliberately indistinguishable so the
    /// response never reveals which codes once existed.
    #[error("Invalid or expired access code")]
    GrantNotFound,
    /// The grant matched but its record is gone (deleted after issuing).
    #[error("Health record not found")]
    RecordGone,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Issues a grant for `record_id`. The record's existence is not checked
/// here; a grant for a missing record simply dead-ends at access time.
pub async fn create_grant(state: &AppState, record_id: &str) -> anyhow::Result<AccessGrant> {
    let code = state.codes.generate(state.config.share.code_length);
    let now = state.clock.now();
    let expires_at = now + Duration::minutes(state.config.share.ttl_minutes);
    let grant = state.grants.insert(record_id, &code, now, expires_at).await?;
    info!(%record_id, code = %grant.code, %expires_at, "access grant created");
    Ok(grant)
}

/// Redeems a code. A valid redemption queues an access event for the record
/// owner; grants stay redeemable until they expire, and every redemption
/// notifies again. Notification problems never fail the read.
pub async fn validate_and_consume(
    state: &AppState,
    code: &str,
) -> Result<HealthRecord, ShareError> {
    let now = state.clock.now();
    let grant = state
        .grants
        .find_valid(code, now)
        .await?
        .ok_or(ShareError::GrantNotFound)?;

    let record = state
        .records
        .find_by_id(&grant.record_id)
        .await?
        .ok_or(ShareError::RecordGone)?;

    let event = AccessEvent {
        owner_id: record.owner_id.clone(),
    };
    if let Err(e) = state.access_events.send(event) {
        warn!(error = %e, "access notification dropped");
    }

    info!(code, record_id = %record.id, "shared health record accessed");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use time::macros::datetime;
    use tokio::sync::mpsc::error::TryRecvError;

    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::AccessEvent;
    use crate::state::AppState;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn test_state() -> (AppState, UnboundedReceiver<AccessEvent>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(datetime!(2026-01-01 00:00 UTC)));
        let (state, rx) = AppState::in_memory(clock.clone());
        (state, rx, clock)
    }

    #[tokio::test]
    async fn grant_validates_immediately_after_creation() {
        let (state, _rx, _clock) = test_state();
        let record = state
            .records
            .create("owner-1", "bp", json!({"sys": 118}))
            .await
            .expect("create record");

        let grant = create_grant(&state, &record.id.to_string())
            .await
            .expect("create grant");
        assert_eq!(grant.code.len(), 8);
        assert_eq!(
            grant.expires_at,
            datetime!(2026-01-01 00:00 UTC) + Duration::hours(1)
        );

        let got = validate_and_consume(&state, &grant.code)
            .await
            .expect("valid grant");
        assert_eq!(got.id, record.id);
    }

    #[tokio::test]
    async fn never_issued_code_is_not_found() {
        let (state, _rx, _clock) = test_state();
        let err = validate_and_consume(&state, "nope1234").await.unwrap_err();
        assert!(matches!(err, ShareError::GrantNotFound));
    }

    #[tokio::test]
    async fn expired_code_matches_never_issued_in_shape() {
        let (state, _rx, clock) = test_state();
        let record = state
            .records
            .create("owner-1", "bp", json!({}))
            .await
            .expect("create record");
        let grant = create_grant(&state, &record.id.to_string())
            .await
            .expect("create grant");

        clock.advance(Duration::minutes(61));

        let expired = validate_and_consume(&state, &grant.code).await.unwrap_err();
        let unknown = validate_and_consume(&state, "nope1234").await.unwrap_err();
        assert!(matches!(expired, ShareError::GrantNotFound));
        assert_eq!(expired.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn exactly_at_expiry_is_expired() {
        let (state, _rx, clock) = test_state();
        let record = state
            .records
            .create("owner-1", "bp", json!({}))
            .await
            .expect("create record");
        let grant = create_grant(&state, &record.id.to_string())
            .await
            .expect("create grant");

        clock.advance(Duration::hours(1));

        let err = validate_and_consume(&state, &grant.code).await.unwrap_err();
        assert!(matches!(err, ShareError::GrantNotFound));
    }

    #[tokio::test]
    async fn record_deleted_after_grant_is_a_distinct_miss() {
        let (state, _rx, _clock) = test_state();
        let record = state
            .records
            .create("owner-1", "bp", json!({}))
            .await
            .expect("create record");
        let grant = create_grant(&state, &record.id.to_string())
            .await
            .expect("create grant");

        state.records.delete(record.id).await.expect("delete");

        let err = validate_and_consume(&state, &grant.code).await.unwrap_err();
        assert!(matches!(err, ShareError::RecordGone));
    }

    #[tokio::test]
    async fn grants_for_missing_records_are_still_issued() {
        // Grant creation never checks that the record exists.
        let (state, _rx, _clock) = test_state();
        let grant = create_grant(&state, "no-such-record")
            .await
            .expect("create grant");
        let err = validate_and_consume(&state, &grant.code).await.unwrap_err();
        assert!(matches!(err, ShareError::RecordGone));
    }

    #[tokio::test]
    async fn grant_is_reusable_and_notifies_on_every_redemption() {
        let (state, mut rx, _clock) = test_state();
        let record = state
            .records
            .create("owner-1", "bp", json!({}))
            .await
            .expect("create record");
        let grant = create_grant(&state, &record.id.to_string())
            .await
            .expect("create grant");

        for _ in 0..3 {
            validate_and_consume(&state, &grant.code)
                .await
                .expect("still valid");
        }

        for _ in 0..3 {
            let event = rx.try_recv().expect("one event per redemption");
            assert_eq!(event.owner_id, "owner-1");
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn end_to_end_share_then_expire() {
        let (state, mut rx, clock) = test_state();

        let record = state
            .records
            .create("owner-u1", "bp", json!({"sys": 120}))
            .await
            .expect("create record");
        let grant = create_grant(&state, &record.id.to_string())
            .await
            .expect("create grant");

        let got = validate_and_consume(&state, &grant.code)
            .await
            .expect("valid before expiry");
        assert_eq!(got.id, record.id);
        let event = rx.try_recv().expect("exactly one event queued");
        assert_eq!(event.owner_id, "owner-u1");
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        clock.advance(Duration::minutes(61));

        let err = validate_and_consume(&state, &grant.code).await.unwrap_err();
        assert!(matches!(err, ShareError::GrantNotFound));
        assert!(
            matches!(rx.try_recv(), Err(TryRecvError::Empty)),
            "no notification after expiry"
        );
    }
}
