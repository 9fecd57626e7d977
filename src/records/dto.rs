use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AddRecordRequest {
    #[serde(default)]
    pub category: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct EditRecordRequest {
    pub id: Uuid,
    #[serde(default)]
    pub category: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRecordRequest {
    pub id: Uuid,
}
