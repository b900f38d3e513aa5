use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::db::models::{LogisticsBase, LogisticsBaseInput};
use crate::db::services;
use crate::web::routes::parse_json_body;
use crate::web::{AppError, AppState};

pub fn create_logistics_bases_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_bases_handler).post(create_base_handler))
        .route(
            "/{base_id}",
            get(get_base_handler)
                .put(update_base_handler)
                .delete(delete_base_handler),
        )
}

async fn get_bases_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<LogisticsBase>>, AppError> {
    Ok(Json(services::get_all_logistics_bases(&app_state.store).await?))
}

async fn get_base_handler(
    State(app_state): State<Arc<AppState>>,
    Path(base_id): Path<String>,
) -> Result<Json<LogisticsBase>, AppError> {
    services::get_logistics_base_by_id(&app_state.store, &base_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Logistics base {base_id} not found")))
}

async fn create_base_handler(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<LogisticsBase>), AppError> {
    let payload: LogisticsBaseInput = parse_json_body(&body)?;
    let name = payload
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Logistics base name is required".to_string()))?;
    let address = payload
        .address
        .filter(|a| !a.city.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Logistics base address with a city is required".to_string()))?;

    let base =
        services::create_logistics_base(&app_state.store, &name, address, payload.coordinates).await?;
    info!(base_id = %base.id, name = %base.name, "Logistics base created.");
    Ok((StatusCode::CREATED, Json(base)))
}

async fn update_base_handler(
    State(app_state): State<Arc<AppState>>,
    Path(base_id): Path<String>,
    body: Bytes,
) -> Result<Json<LogisticsBase>, AppError> {
    let payload: LogisticsBaseInput = parse_json_body(&body)?;
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::InvalidInput("Logistics base name must not be empty".to_string()));
    }
    if payload.address.as_ref().is_some_and(|a| a.city.trim().is_empty()) {
        return Err(AppError::InvalidInput("Logistics base address needs a city".to_string()));
    }

    let base = services::update_logistics_base(
        &app_state.store,
        &base_id,
        payload.name,
        payload.address,
        payload.coordinates,
    )
    .await?;
    info!(base_id = %base.id, "Logistics base updated.");
    Ok(Json(base))
}

async fn delete_base_handler(
    State(app_state): State<Arc<AppState>>,
    Path(base_id): Path<String>,
) -> Result<StatusCode, AppError> {
    services::delete_logistics_base(&app_state.store, &base_id).await?;
    info!(base_id = %base_id, "Logistics base deleted.");
    Ok(StatusCode::NO_CONTENT)
}
