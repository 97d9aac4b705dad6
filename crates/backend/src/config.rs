//! Server configuration.
//!
//! Every option is a long flag that falls back to an environment variable, so the
//! service can be configured entirely through `.env` in development.

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "tuner-backend")]
#[command(about = "Google login, JWT sessions and user profile API")]
pub struct AppConfig {
    /// Postgres connection string. Auth routes are disabled when unset.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,

    #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
    pub google_client_secret: Option<String>,

    /// Shared HMAC secret for access and refresh tokens.
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Where the browser lands after a successful login.
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:5173")]
    pub frontend_url: String,

    /// OAuth callback registered with Google. Derived from `PORT` when unset.
    #[arg(long, env = "GOOGLE_REDIRECT_URL")]
    pub google_redirect_url: Option<String>,

    /// Mark every cookie the service sets as `Secure`.
    #[arg(long, env = "COOKIE_SECURE", default_value_t = false)]
    pub cookie_secure: bool,

    /// Comma-separated list of allowed CORS origins. Defaults to the frontend URL.
    #[arg(long, env = "CORS_ALLOWED_ORIGINS")]
    pub cors_allowed_origins: Option<String>,
}

impl AppConfig {
    pub fn redirect_url(&self) -> String {
        self.google_redirect_url.clone().unwrap_or_else(|| {
            format!(
                "http://localhost:{}/api/auth/google/callback",
                self.port
            )
        })
    }

    pub fn cors_origins(&self) -> Vec<String> {
        match &self.cors_allowed_origins {
            Some(origins) => origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => vec![self.frontend_url.trim_end_matches('/').to_string()],
        }
    }
}

/// The subset of configuration the login flow cannot run without.
#[derive(Clone)]
pub struct AuthSettings {
    pub google_client_id: String,
    pub google_client_secret: String,
    pub jwt_secret: String,
    pub redirect_url: String,
    pub frontend_url: String,
    pub cookie_secure: bool,
}

impl AuthSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            google_client_id: config
                .google_client_id
                .clone()
                .filter(|v| !v.is_empty())
                .context("GOOGLE_CLIENT_ID must be set")?,
            google_client_secret: config
                .google_client_secret
                .clone()
                .filter(|v| !v.is_empty())
                .context("GOOGLE_CLIENT_SECRET must be set")?,
            jwt_secret: config
                .jwt_secret
                .clone()
                .filter(|v| !v.is_empty())
                .context("JWT_SECRET must be set")?,
            redirect_url: config.redirect_url(),
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
            cookie_secure: config.cookie_secure,
        })
    }
}
