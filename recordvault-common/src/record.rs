use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A titled, owner-scoped record with an opaque JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    /// Owning user. Not enforced by the schema.
    pub user_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Payload as stored; `None` when the record was saved without one.
    #[serde(default)]
    pub data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
