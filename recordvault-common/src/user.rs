//! User projections. None of them carry the password hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Projection returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

/// Lightweight user row used by listings and admin views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A user together with every record it owns.
///
/// Serializes flat: the user fields sit next to a `data` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWithRecords {
    #[serde(flatten)]
    pub user: UserSummary,
    pub data: Vec<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_user_uses_camel_case() {
        let user = PublicUser {
            id: 7,
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            is_admin: false,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["isAdmin"], false);
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_user_with_records_is_flattened() {
        let entry = UserWithRecords {
            user: UserSummary {
                id: 1,
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                created_at: Utc::now(),
            },
            data: vec![],
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json["createdAt"].is_string());
        assert_eq!(json["data"], serde_json::json!([]));
        assert!(json.get("user").is_none());
    }
}
