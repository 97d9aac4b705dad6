// Database models for Diesel
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Insertable profile as reported by the identity provider.
///
/// `updated_at` is stamped by the caller so the insert and conflict branches agree.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub google_id: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
    pub avatar_url: &'a str,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewUser<'a> {
    pub fn new(
        google_id: &'a str,
        email: &'a str,
        display_name: &'a str,
        avatar_url: &'a str,
    ) -> Self {
        Self {
            google_id,
            email,
            display_name,
            avatar_url,
            updated_at: Utc::now(),
        }
    }
}
