//! Return-trip ("sequence") searches.
//!
//! Given the home base an offer started from and the place it delivers to, search for
//! freight going back: start at the delivery point, end at the home base.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::request::{
    default_sortings, format_bound, AdapterError, FreightSearchRequest, LocationCriteria,
    DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT,
};
use crate::db::models::CityRef;

pub const SEQUENCE_RADIUS_KM: u32 = 50;
pub const SEQUENCE_WINDOW_HOURS: i64 = 24;

/// Return-trip search input. The radius is fixed at [`SEQUENCE_RADIUS_KM`]; a `radius`
/// field in the body is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRequest {
    /// Home base, i.e. where the outbound offer was loaded.
    #[serde(default)]
    pub origin_city: Option<CityRef>,
    /// Delivery location of the outbound offer.
    #[serde(default)]
    pub destination_city: Option<CityRef>,
    /// Records the result in this agent's history when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Defaults to 30, capped at 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

/// Builds the return-leg search. The window starts at `now`, not at the outbound offer's
/// delivery time.
pub fn build_sequence_request(
    request: &SequenceRequest,
    now: DateTime<Utc>,
) -> Result<FreightSearchRequest, AdapterError> {
    let home = request
        .origin_city
        .as_ref()
        .and_then(CityRef::to_address)
        .ok_or(AdapterError::MissingField("originCity"))?;
    let delivery = request
        .destination_city
        .as_ref()
        .and_then(CityRef::to_address)
        .ok_or(AdapterError::MissingField("destinationCity"))?;

    Ok(FreightSearchRequest {
        start_location: LocationCriteria::area(delivery, SEQUENCE_RADIUS_KM),
        destination_location: LocationCriteria::area(home, SEQUENCE_RADIUS_KM),
        exclusive_left_lower_bound_date_time: format_bound(now),
        inclusive_right_upper_bound_date_time: format_bound(now + Duration::hours(SEQUENCE_WINDOW_HOURS)),
        vehicle_properties: None,
        sortings: default_sortings(),
        first_result: 0,
        max_results: request
            .max_results
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .min(MAX_RESULTS_LIMIT),
    })
}
