//! Google OAuth client used by the login flow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthSettings;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Scopes requested at login: identity, email and basic profile.
const LOGIN_SCOPES: [&str; 3] = ["openid", "email", "profile"];

#[derive(Debug, Error)]
pub enum OAuthError {
    /// The authorization code could not be traded for a token. Codes are single-use,
    /// so this is reported to the client rather than retried.
    #[error("code exchange failed: {0}")]
    Exchange(String),

    /// The profile endpoint could not be reached or returned something unusable.
    #[error("profile fetch failed: {0}")]
    Profile(String),
}

/// Profile fields the service keeps about a Google account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderProfile {
    #[serde(rename = "id")]
    pub external_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

/// The three provider interactions in the redirect dance.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL of the consent screen, carrying `state` for the callback to echo.
    fn authorize_url(&self, state: &str) -> String;

    /// Trade an authorization code for a provider access token.
    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError>;

    /// Fetch the account profile with a provider access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, OAuthError>;
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

pub struct GoogleProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleProvider {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: settings.google_client_id.clone(),
            client_secret: settings.google_client_secret.clone(),
            redirect_uri: settings.redirect_url.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             access_type=offline&\
             state={}",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&LOGIN_SCOPES.join(" ")),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&TokenRequest {
                code,
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                redirect_uri: &self.redirect_uri,
                grant_type: "authorization_code",
            })
            .send()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Token exchange failed: {} - {}", status, body);
            return Err(OAuthError::Exchange(format!("token endpoint returned {}", status)));
        }

        let tokens: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::Exchange(format!("invalid token response: {}", e)))?;

        Ok(tokens.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, OAuthError> {
        let response = self
            .client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::Profile(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::Profile(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<ProviderProfile>()
            .await
            .map_err(|e| OAuthError::Profile(format!("invalid user info response: {}", e)))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AuthSettings {
        AuthSettings {
            google_client_id: "client id".to_string(),
            google_client_secret: "client-secret".to_string(),
            jwt_secret: "jwt".to_string(),
            redirect_url: "http://localhost:8080/api/auth/google/callback".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            cookie_secure: false,
        }
    }

    #[test]
    fn authorize_url_carries_state_and_scopes() {
        let provider = GoogleProvider::new(&settings());
        let url = provider.authorize_url("abc_-123");

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fapi%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("access_type=offline"));
        assert!(url.ends_with("state=abc_-123"));
    }

    #[test]
    fn profile_parses_google_userinfo() {
        let body = r#"{
            "id": "1029384756",
            "email": "player@example.com",
            "verified_email": true,
            "name": "Player One",
            "picture": "https://lh3.googleusercontent.com/a/photo"
        }"#;

        let profile: ProviderProfile = serde_json::from_str(body).unwrap();
        assert_eq!(profile.external_id, "1029384756");
        assert_eq!(profile.email, "player@example.com");
        assert_eq!(profile.name, "Player One");
        assert_eq!(profile.picture, "https://lh3.googleusercontent.com/a/photo");
    }

    #[test]
    fn profile_tolerates_missing_optional_fields() {
        let profile: ProviderProfile = serde_json::from_str(r#"{"id": "42"}"#).unwrap();
        assert_eq!(profile.external_id, "42");
        assert!(profile.name.is_empty());
        assert!(profile.picture.is_empty());
    }
}
