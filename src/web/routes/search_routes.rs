use axum::{
    body::Bytes,
    extract::State,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use crate::db::services;
use crate::timocom::offers::extract_offers;
use crate::timocom::request::{build_search_request, connection_test_request, SearchDefaults, SearchIntent};
use crate::web::models::{ConnectionTestResponse, OfferSearchResponse};
use crate::web::routes::parse_optional_json;
use crate::web::{AppError, AppState};

pub fn create_search_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/test-connection", post(test_connection_handler))
        .route("/search-offers", post(search_offers_handler))
}

async fn test_connection_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<ConnectionTestResponse>, AppError> {
    let probe = connection_test_request(Utc::now());
    let timeout = app_state.config.connection_test_timeout();

    let response = app_state
        .timocom
        .search_offers_with_timeout(&probe, timeout)
        .await
        .map_err(|e| {
            error!(error = %e, "Freight exchange connection test failed.");
            AppError::from(e)
        })?;

    let sample_offers = extract_offers(&response).len();
    info!(sample_offers, "Freight exchange connection test succeeded.");

    Ok(Json(ConnectionTestResponse {
        success: true,
        message: "Connection to the freight exchange succeeded".to_string(),
        base_url: app_state.timocom.base_url().to_string(),
        authenticated: app_state.timocom.has_credentials(),
        sample_offers,
    }))
}

async fn search_offers_handler(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<OfferSearchResponse>, AppError> {
    let intent: SearchIntent = parse_optional_json(&body)?;

    let defaults = match intent.logistics_base_id.as_deref() {
        Some(base_id) => {
            let base = services::get_logistics_base_by_id(&app_state.store, base_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Logistics base {base_id} not found")))?;
            SearchDefaults::from_base(&base)
        }
        None => SearchDefaults::default(),
    };

    let request = build_search_request(&intent, &defaults, Utc::now())?;
    let response = app_state.timocom.search_offers(&request).await?;
    let offers = extract_offers(&response);

    info!(offers = offers.len(), "Ad-hoc freight search completed.");
    Ok(Json(OfferSearchResponse {
        success: true,
        total_offers: offers.len(),
        offers,
        search_request: request,
        history_entry_id: None,
    }))
}
