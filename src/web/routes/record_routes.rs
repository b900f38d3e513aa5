use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::db::models::RecordKind;
use crate::db::services;
use crate::web::routes::parse_json_body;
use crate::web::{AppError, AppState};

/// Orders, conversations and documents share one schemaless surface; `kind` picks the collection.
pub fn create_record_router(kind: RecordKind) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(
                move |State(app_state): State<Arc<AppState>>,
                      Query(filters): Query<HashMap<String, String>>| async move {
                    list_records_handler(app_state, kind, filters).await
                },
            )
            .post(
                move |State(app_state): State<Arc<AppState>>, body: Bytes| async move {
                    create_record_handler(app_state, kind, body).await
                },
            ),
        )
        .route(
            "/{record_id}",
            get(
                move |State(app_state): State<Arc<AppState>>, Path(record_id): Path<String>| async move {
                    get_record_handler(app_state, kind, record_id).await
                },
            ),
        )
}

async fn list_records_handler(
    app_state: Arc<AppState>,
    kind: RecordKind,
    filters: HashMap<String, String>,
) -> Result<Json<Vec<Value>>, AppError> {
    Ok(Json(services::list_records(&app_state.store, kind, &filters).await?))
}

async fn get_record_handler(
    app_state: Arc<AppState>,
    kind: RecordKind,
    record_id: String,
) -> Result<Json<Value>, AppError> {
    services::get_record_by_id(&app_state.store, kind, &record_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!("No {} record with id {record_id}", kind.collection_name()))
        })
}

async fn create_record_handler(
    app_state: Arc<AppState>,
    kind: RecordKind,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Value::Object(record) = parse_json_body::<Value>(&body)? else {
        return Err(AppError::InvalidInput("Record must be a JSON object".to_string()));
    };

    let created = services::create_record(&app_state.store, kind, record).await?;
    info!(collection = kind.collection_name(), "Record stored.");
    Ok((StatusCode::CREATED, Json(created)))
}
