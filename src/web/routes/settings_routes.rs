use axum::{
    body::Bytes,
    extract::State,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::db::models::TimocomSettings;
use crate::db::services;
use crate::web::routes::parse_json_body;
use crate::web::{AppError, AppState};

// Mounted under /api/timocomSettings
pub fn create_settings_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_settings_handler).put(update_settings_handler))
}

async fn get_settings_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<TimocomSettings>, AppError> {
    Ok(Json(services::get_timocom_settings(&app_state.store).await?))
}

async fn update_settings_handler(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TimocomSettings>, AppError> {
    let Value::Object(values) = parse_json_body::<Value>(&body)? else {
        return Err(AppError::InvalidInput("Settings must be a JSON object".to_string()));
    };

    let settings = services::update_timocom_settings(&app_state.store, values).await?;
    info!(keys = settings.values.len(), "TIMOCOM settings updated.");
    Ok(Json(settings))
}
