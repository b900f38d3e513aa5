use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::db::models::{Agent, AgentHistoryEntry, AgentInput, LogisticsBase, SearchKind};
use crate::db::services;
use crate::timocom::offers::{extract_offers, process_offers, OfferFilter};
use crate::timocom::request::{build_search_request, SearchDefaults, SearchIntent};
use crate::web::models::{
    HistoryClearedResponse, LatestOffersResponse, LatestSearchResponse, OfferSearchResponse,
};
use crate::web::routes::{parse_json_body, parse_optional_json};
use crate::web::{AppError, AppState};

// --- Router ---

pub fn create_agents_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_agents_handler).post(create_agent_handler))
        .route(
            "/{agent_id}",
            get(get_agent_handler)
                .put(update_agent_handler)
                .delete(delete_agent_handler),
        )
        .route("/{agent_id}/search-offers", post(agent_search_offers_handler))
        .route("/{agent_id}/latest-offers", get(latest_offers_handler))
        .route("/{agent_id}/latest-search", get(latest_search_handler))
        .route(
            "/{agent_id}/history",
            get(get_history_handler).delete(clear_history_handler),
        )
}

async fn load_agent(app_state: &AppState, agent_id: &str) -> Result<Agent, AppError> {
    services::get_agent_by_id(&app_state.store, agent_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Agent {agent_id} not found")))
}

// --- CRUD Handlers ---

async fn get_agents_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Agent>>, AppError> {
    Ok(Json(services::get_all_agents(&app_state.store).await?))
}

async fn get_agent_handler(
    State(app_state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Json<Agent>, AppError> {
    Ok(Json(load_agent(&app_state, &agent_id).await?))
}

async fn create_agent_handler(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Agent>), AppError> {
    let payload: AgentInput = parse_json_body(&body)?;
    if payload.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        return Err(AppError::InvalidInput("Agent name is required".to_string()));
    }

    let agent = services::create_agent(&app_state.store, payload).await?;
    info!(agent_id = %agent.id, name = %agent.name, "Agent created.");
    Ok((StatusCode::CREATED, Json(agent)))
}

async fn update_agent_handler(
    State(app_state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    body: Bytes,
) -> Result<Json<Agent>, AppError> {
    let payload: AgentInput = parse_json_body(&body)?;
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::InvalidInput("Agent name must not be empty".to_string()));
    }

    let agent = services::update_agent(&app_state.store, &agent_id, payload).await?;
    info!(agent_id = %agent.id, "Agent updated.");
    Ok(Json(agent))
}

async fn delete_agent_handler(
    State(app_state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<StatusCode, AppError> {
    services::delete_agent(&app_state.store, &agent_id).await?;
    info!(agent_id = %agent_id, "Agent deleted; history kept.");
    Ok(StatusCode::NO_CONTENT)
}

// --- Search & History Handlers ---

async fn agent_search_offers_handler(
    State(app_state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    body: Bytes,
) -> Result<Json<OfferSearchResponse>, AppError> {
    let intent: SearchIntent = parse_optional_json(&body)?;
    let agent = load_agent(&app_state, &agent_id).await?;

    // The base reference is weak; a dangling id only surfaces here.
    let base_id = intent
        .logistics_base_id
        .clone()
        .or_else(|| agent.selected_logistics_base.clone());
    let base: Option<LogisticsBase> = match base_id {
        Some(base_id) => Some(
            services::get_logistics_base_by_id(&app_state.store, &base_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Logistics base {base_id} not found")))?,
        ),
        None => None,
    };

    let defaults = SearchDefaults::for_agent(&agent, base.as_ref());
    let request = build_search_request(&intent, &defaults, Utc::now())?;

    let response = app_state.timocom.search_offers(&request).await?;
    let initial_offers = extract_offers(&response);
    let processed_offers = process_offers(
        &initial_offers,
        &OfferFilter {
            preferred_countries: agent.preferred_countries.clone(),
            max_results: Some(request.max_results as usize),
        },
    );

    let entry = services::record_search(
        &app_state.store,
        &agent.id,
        SearchKind::AgentSearch,
        json!({ "intent": intent, "request": request }),
        initial_offers,
        processed_offers.clone(),
        app_state.config.history_limit,
    )
    .await?;

    info!(
        agent_id = %agent.id,
        offers = entry.offers_count,
        accepted = entry.accepted_offers_count,
        "Agent freight search completed."
    );
    Ok(Json(OfferSearchResponse {
        success: true,
        total_offers: entry.offers_count,
        offers: processed_offers,
        search_request: request,
        history_entry_id: Some(entry.id),
    }))
}

async fn latest_offers_handler(
    State(app_state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Json<LatestOffersResponse>, AppError> {
    // History outlives its agent, so a deleted agent still has latest offers.
    let latest = services::get_latest_offers(&app_state.store, &agent_id).await?;

    Ok(Json(LatestOffersResponse {
        success: true,
        agent_id: latest.agent_id,
        offers: latest.offers,
        last_updated: latest.last_updated,
    }))
}

async fn latest_search_handler(
    State(app_state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Json<LatestSearchResponse>, AppError> {
    let entry = services::get_latest_entry(&app_state.store, &agent_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No search recorded for agent {agent_id}")))?;

    Ok(Json(LatestSearchResponse {
        success: true,
        agent_id: entry.agent_id,
        search_params: entry.search_params,
        timestamp: entry.timestamp,
    }))
}

async fn get_history_handler(
    State(app_state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Json<Vec<AgentHistoryEntry>>, AppError> {
    Ok(Json(services::get_history_for_agent(&app_state.store, &agent_id).await?))
}

async fn clear_history_handler(
    State(app_state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Json<HistoryClearedResponse>, AppError> {
    let removed_entries = services::clear_history_for_agent(&app_state.store, &agent_id).await?;
    info!(agent_id = %agent_id, removed_entries, "Agent history cleared.");

    Ok(Json(HistoryClearedResponse {
        success: true,
        removed_entries,
    }))
}
