use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A single health entry. `owner_id` is a free-form string, not a foreign
/// key: it holds whatever the identification cookie carried. `category` and
/// `data` are opaque to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HealthRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub category: String,
    pub data: serde_json::Value,
    pub created_at: OffsetDateTime,
}
