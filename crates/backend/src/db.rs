use diesel_async::{
    pooled_connection::{
        deadpool::{Object, Pool, PoolError},
        AsyncDieselConnectionManager, ManagerConfig,
    },
    AsyncPgConnection, SimpleAsyncConnection,
};
use tokio_postgres::config::SslMode;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConn = Object<AsyncPgConnection>;

const CREATE_USERS: &str =
    include_str!("../migrations/2024-05-01-000000_create_users/up.sql");

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    AsyncPgConnection::try_from(client).await
}

/// Local databases usually run without TLS; honour an explicit `sslmode=disable`.
///
/// A URL tokio-postgres cannot parse keeps TLS on and fails at connect time.
fn wants_tls(database_url: &str) -> bool {
    match database_url.parse::<tokio_postgres::Config>() {
        Ok(config) => !matches!(config.get_ssl_mode(), SslMode::Disable),
        Err(_) => true,
    }
}

pub fn establish_connection_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let manager = if wants_tls(database_url) {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup =
            Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
            database_url,
            manager_config,
        )
    } else {
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url)
    };

    let pool = Pool::builder(manager).build()?;

    Ok(pool)
}

/// Check out a connection. The typed `PoolError` is kept so callers can report an
/// unavailable database distinctly.
pub async fn get_conn(pool: &DbPool) -> Result<DbConn, PoolError> {
    pool.get().await
}

/// Create the `users` table if it does not exist yet.
pub async fn ensure_schema(pool: &DbPool) -> anyhow::Result<()> {
    let mut conn = get_conn(pool).await?;
    conn.batch_execute(CREATE_USERS).await?;
    Ok(())
}
