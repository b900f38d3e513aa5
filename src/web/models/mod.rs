use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::timocom::request::FreightSearchRequest;

/// Result of any offer search. `searchRequest` echoes the body sent to the exchange.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OfferSearchResponse {
    pub success: bool,
    pub offers: Vec<Value>,
    pub total_offers: usize,
    pub search_request: FreightSearchRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_entry_id: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResponse {
    pub success: bool,
    pub message: String,
    pub base_url: String,
    pub authenticated: bool,
    pub sample_offers: usize,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LatestOffersResponse {
    pub success: bool,
    pub agent_id: String,
    pub offers: Vec<Value>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LatestSearchResponse {
    pub success: bool,
    pub agent_id: String,
    pub search_params: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HistoryClearedResponse {
    pub success: bool,
    pub removed_entries: usize,
}
