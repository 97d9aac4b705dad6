use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User struct matching database column order exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct User {
    pub id: i64,
    pub google_id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body returned by `POST /api/auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Plain acknowledgement body, e.g. `{"status":"ok"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn user_serializes_with_snake_case_fields() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let user = User {
            id: 7,
            google_id: "1234567890".to_string(),
            email: "player@example.com".to_string(),
            display_name: "Player One".to_string(),
            avatar_url: "https://example.com/a.png".to_string(),
            created_at: ts,
            updated_at: ts,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["google_id"], "1234567890");
        assert_eq!(value["display_name"], "Player One");
        assert_eq!(value["avatar_url"], "https://example.com/a.png");
        assert!(value["created_at"].is_string());
    }

    #[test]
    fn status_ok_body() {
        let body = serde_json::to_string(&StatusResponse::ok()).unwrap();
        assert_eq!(body, r#"{"status":"ok"}"#);
    }
}
