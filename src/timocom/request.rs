//! Builds freight-offer search bodies in the exchange's nested request schema.
//!
//! A location is either an `areaSearch` (address plus radius in km) or a
//! `postalCodeAreasArray` (country plus postal-code prefixes). Missing origin or destination
//! is always a validation error; nothing is filled in with sample cities.
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::db::models::{Address, Agent, CityRef, LogisticsBase};

pub const DEFAULT_RADIUS_KM: u32 = 100;
pub const DEFAULT_WINDOW_DAYS: i64 = 3;
pub const DEFAULT_MAX_RESULTS: u32 = 30;
pub const MAX_RESULTS_LIMIT: u32 = 100;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid date in {field}: '{value}' (expected RFC 3339 or YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAddress {
    pub object_type: &'static str,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl From<Address> for SearchAddress {
    fn from(address: Address) -> Self {
        Self {
            object_type: "address",
            city: address.city,
            country: address.country,
            postal_code: address.postal_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Area {
    pub address: SearchAddress,
    pub size_km: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalCodeArea {
    pub country: String,
    #[serde(default)]
    pub postal_codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "objectType")]
pub enum LocationCriteria {
    #[serde(rename = "areaSearch")]
    AreaSearch { area: Area },
    #[serde(rename = "postalCodeAreasArray")]
    PostalCodeAreas {
        #[serde(rename = "postalCodeAreas")]
        postal_code_areas: Vec<PostalCodeArea>,
    },
}

impl LocationCriteria {
    pub fn area(address: Address, size_km: u32) -> Self {
        LocationCriteria::AreaSearch {
            area: Area {
                address: address.into(),
                size_km,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VehicleProperties {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<String>,
}

/// Body of `POST /search-offers` on the freight exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreightSearchRequest {
    pub start_location: LocationCriteria,
    pub destination_location: LocationCriteria,
    pub exclusive_left_lower_bound_date_time: String,
    pub inclusive_right_upper_bound_date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_properties: Option<VehicleProperties>,
    pub sortings: Vec<Value>,
    pub first_result: u32,
    pub max_results: u32,
}

/// Loosely-typed search request as sent by the dashboard. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIntent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_city: Option<CityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logistics_base_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_city: Option<CityRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub origin_postal_codes: Vec<PostalCodeArea>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination_postal_codes: Vec<PostalCodeArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_radius: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trailer_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub special_equipment: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortings: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_result: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

/// Fallback values used when the intent leaves a field out,
/// typically taken from an agent and its logistics base.
#[derive(Debug, Clone, Default)]
pub struct SearchDefaults {
    pub origin: Option<Address>,
    pub destination: Option<Address>,
    pub radius: Option<u32>,
    pub destination_radius: Option<u32>,
    pub trailer_types: Vec<String>,
    pub special_equipment: Vec<String>,
}

impl SearchDefaults {
    pub fn from_base(base: &LogisticsBase) -> Self {
        Self {
            origin: Some(base.address.clone()),
            ..Default::default()
        }
    }

    pub fn for_agent(agent: &Agent, base: Option<&LogisticsBase>) -> Self {
        Self {
            origin: base.map(|b| b.address.clone()),
            destination: agent.destination_city.as_ref().and_then(CityRef::to_address),
            radius: agent.search_radius,
            destination_radius: agent.max_operating_radius,
            trailer_types: agent.trailer_types.clone(),
            special_equipment: agent.special_equipment.clone(),
        }
    }
}

pub fn build_search_request(
    intent: &SearchIntent,
    defaults: &SearchDefaults,
    now: DateTime<Utc>,
) -> Result<FreightSearchRequest, AdapterError> {
    let radius = intent.radius.or(defaults.radius).unwrap_or(DEFAULT_RADIUS_KM);
    let destination_radius = intent
        .destination_radius
        .or(defaults.destination_radius)
        .unwrap_or(DEFAULT_RADIUS_KM);

    let start_location = resolve_location(
        &intent.origin_postal_codes,
        intent.origin_city.as_ref(),
        defaults.origin.as_ref(),
        radius,
    )
    .ok_or(AdapterError::MissingField("originCity"))?;
    let destination_location = resolve_location(
        &intent.destination_postal_codes,
        intent.destination_city.as_ref(),
        defaults.destination.as_ref(),
        destination_radius,
    )
    .ok_or(AdapterError::MissingField("destinationCity"))?;

    let lower = match &intent.date_from {
        Some(value) => parse_date_bound("dateFrom", value)?,
        None => now,
    };
    let upper = match &intent.date_to {
        Some(value) => parse_date_bound("dateTo", value)?,
        None => lower + Duration::days(DEFAULT_WINDOW_DAYS),
    };
    if lower > upper {
        warn!(%lower, %upper, "Search window lower bound is after the upper bound; passing it through.");
    }

    let mut body: Vec<String> = defaults.trailer_types.clone();
    merge_unique(&mut body, &intent.trailer_types);
    let mut equipment: Vec<String> = defaults.special_equipment.clone();
    merge_unique(&mut equipment, &intent.special_equipment);
    let vehicle_properties = (!body.is_empty() || !equipment.is_empty())
        .then_some(VehicleProperties { body, equipment });

    Ok(FreightSearchRequest {
        start_location,
        destination_location,
        exclusive_left_lower_bound_date_time: format_bound(lower),
        inclusive_right_upper_bound_date_time: format_bound(upper),
        vehicle_properties,
        sortings: intent.sortings.clone().unwrap_or_else(default_sortings),
        first_result: intent.first_result.unwrap_or(0),
        max_results: intent
            .max_results
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .min(MAX_RESULTS_LIMIT),
    })
}

/// Minimal probe payload for checking credentials and reachability.
pub fn connection_test_request(now: DateTime<Utc>) -> FreightSearchRequest {
    let berlin = Address {
        city: "Berlin".to_string(),
        postal_code: Some("10115".to_string()),
        country: Some("DE".to_string()),
    };
    let munich = Address {
        city: "München".to_string(),
        postal_code: Some("80331".to_string()),
        country: Some("DE".to_string()),
    };

    FreightSearchRequest {
        start_location: LocationCriteria::area(berlin, DEFAULT_RADIUS_KM),
        destination_location: LocationCriteria::area(munich, DEFAULT_RADIUS_KM),
        exclusive_left_lower_bound_date_time: format_bound(now),
        inclusive_right_upper_bound_date_time: format_bound(now + Duration::days(DEFAULT_WINDOW_DAYS)),
        vehicle_properties: None,
        sortings: default_sortings(),
        first_result: 0,
        max_results: 1,
    }
}

pub(crate) fn format_bound(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn default_sortings() -> Vec<Value> {
    vec![json!({ "field": "creationDateTime", "ascending": false })]
}

fn resolve_location(
    postal_codes: &[PostalCodeArea],
    city: Option<&CityRef>,
    fallback: Option<&Address>,
    size_km: u32,
) -> Option<LocationCriteria> {
    if !postal_codes.is_empty() {
        return Some(LocationCriteria::PostalCodeAreas {
            postal_code_areas: postal_codes.to_vec(),
        });
    }

    city.and_then(CityRef::to_address)
        .or_else(|| fallback.cloned())
        .map(|address| LocationCriteria::area(address, size_km))
}

fn parse_date_bound(field: &'static str, value: &str) -> Result<DateTime<Utc>, AdapterError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AdapterError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

fn merge_unique(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
