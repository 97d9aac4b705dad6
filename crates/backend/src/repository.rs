//! User persistence.
//!
//! Handlers talk to the [`UserStore`] trait so the login flow can be exercised without a
//! database; [`PgUserStore`] is the Postgres implementation used in production.

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use tuner_types::User;

use crate::db::{get_conn, DbPool};
use crate::models::NewUser;

/// Storage operations the auth flow needs.
///
/// Implementations must keep `google_id` unique: concurrent upserts with the same
/// external id resolve to a single row.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user or refresh the mutable profile fields of the existing one.
    ///
    /// `created_at` is set once on insert and never changes afterwards.
    async fn upsert_by_google_id(&self, profile: &NewUser<'_>) -> Result<User>;

    /// Look up a user by internal id.
    async fn get_by_id(&self, user_id: i64) -> Result<Option<User>>;
}

/// Diesel-backed store; conflict resolution happens in a single
/// `INSERT ... ON CONFLICT DO UPDATE` statement.
#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn upsert_by_google_id(&self, profile: &NewUser<'_>) -> Result<User> {
        use crate::schema::users::dsl::*;

        let mut conn = get_conn(&self.pool).await?;

        let user = diesel::insert_into(users)
            .values(profile)
            .on_conflict(google_id)
            .do_update()
            .set((
                email.eq(excluded(email)),
                display_name.eq(excluded(display_name)),
                avatar_url.eq(excluded(avatar_url)),
                updated_at.eq(excluded(updated_at)),
            ))
            .get_result::<User>(&mut *conn)
            .await?;

        Ok(user)
    }

    async fn get_by_id(&self, user_id: i64) -> Result<Option<User>> {
        use crate::schema::users::dsl::*;

        let mut conn = get_conn(&self.pool).await?;

        let user = users
            .filter(id.eq(user_id))
            .first::<User>(&mut *conn)
            .await
            .optional()?;

        Ok(user)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::memory::MemoryUserStore;
    use super::*;

    async fn assert_upsert_keeps_one_row(store: &dyn UserStore, google_id: &str) {
        let first = store
            .upsert_by_google_id(&NewUser::new(
                google_id,
                "player@example.com",
                "Old Name",
                "https://example.com/old.png",
            ))
            .await
            .expect("first upsert");

        let second = store
            .upsert_by_google_id(&NewUser::new(
                google_id,
                "player@example.com",
                "New Name",
                "https://example.com/new.png",
            ))
            .await
            .expect("second upsert");

        assert_eq!(first.id, second.id);
        assert_eq!(second.display_name, "New Name");
        assert_eq!(second.avatar_url, "https://example.com/new.png");
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let stored = store
            .get_by_id(first.id)
            .await
            .expect("lookup")
            .expect("row exists");
        assert_eq!(stored, second);
    }

    async fn assert_concurrent_upserts_keep_one_row(store: Arc<dyn UserStore>, google_id: &str) {
        let tasks = (0..8).map(|i| {
            let store = Arc::clone(&store);
            let google_id = google_id.to_string();
            tokio::spawn(async move {
                let name = format!("Player {}", i);
                store
                    .upsert_by_google_id(&NewUser::new(
                        &google_id,
                        "player@example.com",
                        &name,
                        "",
                    ))
                    .await
            })
        });

        let results = futures::future::join_all(tasks).await;
        let ids: Vec<i64> = results
            .into_iter()
            .map(|r| r.expect("task").expect("upsert").id)
            .collect();

        assert!(ids.windows(2).all(|w| w[0] == w[1]), "ids: {:?}", ids);
    }

    #[tokio::test]
    async fn memory_upsert_updates_in_place() {
        let store = MemoryUserStore::default();
        assert_upsert_keeps_one_row(&store, "google-1").await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn memory_concurrent_upserts_single_row() {
        let store = Arc::new(MemoryUserStore::default());
        assert_concurrent_upserts_keep_one_row(store.clone(), "google-2").await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn memory_get_missing_user() {
        let store = MemoryUserStore::default();
        assert!(store.get_by_id(99).await.unwrap().is_none());
    }

    fn test_database_url() -> Option<String> {
        let url = std::env::var("TEST_DATABASE_URL").ok();
        if url.is_none() {
            eprintln!("skipping postgres store test: set TEST_DATABASE_URL to run it");
        }
        url
    }

    fn unique_google_id(prefix: &str) -> String {
        format!("{}-{}", prefix, Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    #[tokio::test]
    async fn postgres_upsert_updates_in_place() {
        let Some(url) = test_database_url() else {
            return;
        };
        let pool = crate::db::establish_connection_pool(&url).expect("pool");
        crate::db::ensure_schema(&pool).await.expect("schema");

        let store = PgUserStore::new(pool);
        assert_upsert_keeps_one_row(&store, &unique_google_id("pg-upsert")).await;
    }

    #[tokio::test]
    async fn postgres_concurrent_upserts_single_row() {
        let Some(url) = test_database_url() else {
            return;
        };
        let pool = crate::db::establish_connection_pool(&url).expect("pool");
        crate::db::ensure_schema(&pool).await.expect("schema");

        let google = unique_google_id("pg-concurrent");
        assert_concurrent_upserts_keep_one_row(Arc::new(PgUserStore::new(pool.clone())), &google)
            .await;

        use crate::schema::users::dsl::*;
        let mut conn = get_conn(&pool).await.expect("conn");
        let count: i64 = users
            .filter(google_id.eq(google.as_str()))
            .count()
            .get_result(&mut *conn)
            .await
            .expect("count");
        assert_eq!(count, 1);
    }
}
