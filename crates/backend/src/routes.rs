use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth, handlers, AppState};

/// Assemble the application router.
///
/// Auth routes are only mounted when a user store is available; without one the
/// service still answers health checks.
pub fn build_router(state: Option<AppState>, cors_origins: &[String]) -> Router {
    let mut app = Router::new()
        .route("/healthz", get(handlers::heartbeat))
        .route("/api/health", get(handlers::health));

    if let Some(state) = state {
        app = app.merge(auth_routes(state));
    }

    app.layer(build_cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
}

fn auth_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/api/auth/google", get(auth::google_login))
        .route("/api/auth/google/callback", get(auth::google_callback))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .merge(protected)
        .with_state(state)
}

/// Build CORS layer for the configured origins.
///
/// Credentials are allowed so the refresh cookie reaches `/api/auth/refresh` from the
/// frontend. If no origin parses, falls back to permissive CORS.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|s| s.parse().ok()).collect();

    if origins.is_empty() {
        tracing::warn!(
            "No valid CORS origins configured, using permissive CORS (not recommended for production)"
        );
        return CorsLayer::permissive();
    }

    tracing::info!("CORS configured for origins: {:?}", origins);
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
