//! Authentication module for JWT-based sessions with Google OAuth login.
//!
//! This module provides:
//! - Access/refresh token creation and validation
//! - The Google OAuth redirect flow with an anti-forgery state cookie
//! - Refresh and logout endpoints
//! - `require_auth` middleware for protecting routes

mod handlers;
mod jwt;
mod middleware;
pub mod oauth;
pub mod types;

pub use handlers::{google_callback, google_login, logout, me, refresh};
pub use jwt::{TokenError, TokenService};
pub use middleware::require_auth;
pub use oauth::{GoogleProvider, IdentityProvider};

#[cfg(test)]
pub use jwt::REFRESH_TOKEN_TTL_SECS;
#[cfg(test)]
pub use types::Claims;
