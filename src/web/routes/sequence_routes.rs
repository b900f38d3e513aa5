use axum::{
    body::Bytes,
    extract::State,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::models::SearchKind;
use crate::db::services;
use crate::timocom::offers::{extract_offers, process_offers, OfferFilter};
use crate::timocom::sequence::{build_sequence_request, SequenceRequest};
use crate::web::models::OfferSearchResponse;
use crate::web::routes::parse_optional_json;
use crate::web::{AppError, AppState};

pub fn create_sequence_router() -> Router<Arc<AppState>> {
    Router::new().route("/find", post(find_sequence_handler))
}

async fn find_sequence_handler(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<OfferSearchResponse>, AppError> {
    let sequence: SequenceRequest = parse_optional_json(&body)?;

    // Validate everything before the exchange is called.
    let request = build_sequence_request(&sequence, Utc::now()).map_err(|e| {
        warn!(error = %e, "Rejected sequence search.");
        AppError::from(e)
    })?;
    let agent = match sequence.agent_id.as_deref() {
        Some(agent_id) => Some(
            services::get_agent_by_id(&app_state.store, agent_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Agent {agent_id} not found")))?,
        ),
        None => None,
    };

    let response = app_state.timocom.search_offers(&request).await?;
    let initial_offers = extract_offers(&response);
    let processed_offers = process_offers(
        &initial_offers,
        &OfferFilter {
            preferred_countries: agent
                .as_ref()
                .map(|a| a.preferred_countries.clone())
                .unwrap_or_default(),
            max_results: Some(request.max_results as usize),
        },
    );

    let history_entry_id = match &agent {
        Some(agent) => {
            let entry = services::record_search(
                &app_state.store,
                &agent.id,
                SearchKind::SequenceSearch,
                json!({ "sequence": sequence, "request": request }),
                initial_offers.clone(),
                processed_offers.clone(),
                app_state.config.history_limit,
            )
            .await?;
            Some(entry.id)
        }
        None => None,
    };

    info!(
        offers = initial_offers.len(),
        accepted = processed_offers.len(),
        recorded = history_entry_id.is_some(),
        "Return-trip search completed."
    );
    Ok(Json(OfferSearchResponse {
        success: true,
        total_offers: initial_offers.len(),
        offers: processed_offers,
        search_request: request,
        history_entry_id,
    }))
}
