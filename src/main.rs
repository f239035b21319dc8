mod models;
mod handlers;
mod routes;
mod docs;
mod config;
mod db;
mod services;
mod ws;

use axum::{routing::get, Router};
use std::panic;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use routes::create_api_routes;
use docs::ApiDoc;
use config::Config;
use tracing::{info, error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::handlers::{health_check, ready_check};
use crate::services::schema_store::SchemaStore;
use crate::ws::handler::ws_handler;
use crate::ws::store::SessionStore;

/// Shared state for the collaboration engine
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub store: Arc<dyn SchemaStore>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "schemly_collab=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let app_config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    config::set_config(app_config.clone());

    // Initialize the database connection; the engine cannot authorize joins
    // or confirm mutations without it.
    let db_url = match &app_config.db_url {
        Some(db_url) => db_url.clone(),
        None => {
            error!("No database URL configured - collaboration sessions cannot be served");
            std::process::exit(1);
        }
    };
    if let Err(e) = db::dbschema::init_db(&db_url).await {
        error!("Failed to initialize database: {}", e);
        std::process::exit(1);
    }
    info!("Database initialized successfully");

    let store: Arc<dyn SchemaStore> = db::dbschema::get_db().expect("database initialized");
    let app_state = Arc::new(AppState {
        sessions: Arc::new(SessionStore::new()),
        store,
    });

    // Create API routes
    let api_routes = create_api_routes(app_state.clone());

    // Combine all routes
    let app_routes = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/ready", get(ready_check))
        // The collaboration WebSocket endpoint
        .route("/ws", get(ws_handler))
        .with_state(app_state)
        // Mount authenticated API routes
        .nest("/api", api_routes)
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add tracing layer
        .layer(TraceLayer::new_for_http());

    // Start the HTTP server
    let listener = tokio::net::TcpListener::bind(app_config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", app_config.server_address()));

    info!("🚀 Server running on http://{}", app_config.server_address());
    info!("📡 WebSocket available at ws://{}/ws", app_config.server_address());
    info!("📚 Swagger UI available at http://{}/swagger", app_config.server_address());

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
