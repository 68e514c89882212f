use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use kickstand::config::AppConfig;
use kickstand::db;
use kickstand::handlers;
use kickstand::services::identity::HttpIdentityProvider;
use kickstand::services::session::{SessionGate, SqliteTokenStore};
use kickstand::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    tracing::info!("using identity service at {}", config.identity_url);
    let identity = Arc::new(HttpIdentityProvider::new(config.identity_url.clone()));

    let user_gate = SessionGate::with_identity(
        "/login",
        Box::new(SqliteTokenStore::new(Arc::clone(&db), "user")),
        identity,
    );
    let admin_gate = SessionGate::presence_only(
        "/admin/login",
        Box::new(SqliteTokenStore::new(Arc::clone(&db), "admin")),
    );

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        user_gate,
        admin_gate,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/locations", get(handlers::catalog::get_locations))
        .route("/api/bikes/:id/rates", get(handlers::catalog::get_bike_rates))
        .route("/api/quote", post(handlers::catalog::get_quote))
        .route("/api/bookings", post(handlers::booking::create_booking))
        .route("/api/bookings", get(handlers::booking::list_bookings))
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::booking::cancel_booking),
        )
        .route("/api/session", get(handlers::session::get_session))
        .route("/api/session/login", post(handlers::session::login))
        .route("/api/session/logout", post(handlers::session::logout))
        .route(
            "/api/admin/session",
            get(handlers::session::get_admin_session),
        )
        .route(
            "/api/admin/session/login",
            post(handlers::session::admin_login),
        )
        .route(
            "/api/admin/session/logout",
            post(handlers::session::admin_logout),
        )
        .route("/api/admin/bikes", post(handlers::admin::upsert_bike))
        .route("/api/admin/locations", post(handlers::admin::upsert_location))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
