use serde::Deserialize;

/// Share request. The record id is taken as-is; it is not required to
/// reference an existing record.
#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub record_id: String,
}

/// Query string for redeeming a code: `/health_data/access?code=...`.
/// An absent `code` deserializes to an empty string, which matches no
/// grant, so the caller still gets the uniform not-found message instead
/// of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    #[serde(default)]
    pub code: String,
}
