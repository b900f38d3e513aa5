use axum::{
    routing::get,
    Json,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::models::RecordKind;
use crate::db::JsonStore;
use crate::server::config::ServerConfig;
use crate::timocom::TimocomClient;
use crate::version::VERSION;
use crate::web::routes::*;

pub use crate::web::error::AppError;

pub mod error;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub timocom: Arc<TimocomClient>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: JsonStore, timocom: TimocomClient, config: ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            store: Arc::new(store),
            timocom: Arc::new(timocom),
            config: Arc::new(config),
        })
    }
}

async fn health_check_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

pub fn create_axum_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        // The proxy accepts any method, so preflights must too.
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .merge(search_routes::create_search_router())
        .nest("/api/agents", agent_routes::create_agents_router())
        .nest("/api/sequences", sequence_routes::create_sequence_router())
        .nest("/api/logisticsBases", logistics_base_routes::create_logistics_bases_router())
        .nest("/api/timocomSettings", settings_routes::create_settings_router())
        .nest("/api/orders", record_routes::create_record_router(RecordKind::Order))
        .nest("/api/conversations", record_routes::create_record_router(RecordKind::Conversation))
        .nest("/api/documents", record_routes::create_record_router(RecordKind::Document))
        .nest("/api/timocom-proxy", proxy_routes::create_proxy_router())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
