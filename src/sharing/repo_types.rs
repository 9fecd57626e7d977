use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Time-limited permission to read one health record without logging in.
/// `record_id` is stored as given; nothing checks the record exists when
/// the grant is issued.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessGrant {
    pub id: Uuid,
    pub record_id: String,
    pub code: String,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}
