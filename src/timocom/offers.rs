use std::collections::HashSet;

use serde_json::Value;

/// Pulls the offer list out of a search response (`payload`), tolerating a bare array.
pub fn extract_offers(response: &Value) -> Vec<Value> {
    match response {
        Value::Array(items) => items.clone(),
        other => other
            .get("payload")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    /// ISO country codes accepted as unloading country; empty accepts all.
    pub preferred_countries: Vec<String>,
    pub max_results: Option<usize>,
}

/// Trims raw offers for storage and display: drops repeated offer ids, keeps offers whose
/// unloading country is preferred (offers without a recognisable country are kept) and caps
/// the list length.
pub fn process_offers(offers: &[Value], filter: &OfferFilter) -> Vec<Value> {
    let mut seen = HashSet::new();

    let kept = offers
        .iter()
        .filter(|offer| match offer_id(offer) {
            Some(id) => seen.insert(id),
            None => true,
        })
        .filter(|offer| country_allowed(offer, &filter.preferred_countries))
        .cloned();

    match filter.max_results {
        Some(max) => kept.take(max).collect(),
        None => kept.collect(),
    }
}

fn offer_id(offer: &Value) -> Option<String> {
    match offer.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn country_allowed(offer: &Value, preferred: &[String]) -> bool {
    if preferred.is_empty() {
        return true;
    }
    match unloading_country(offer) {
        Some(country) => preferred.iter().any(|p| p.eq_ignore_ascii_case(country)),
        None => true,
    }
}

fn unloading_country(offer: &Value) -> Option<&str> {
    let from_places = offer
        .get("loadingPlaces")
        .and_then(Value::as_array)
        .and_then(|places| {
            places
                .iter()
                .rev()
                .find(|p| p.get("loadingType").and_then(Value::as_str) == Some("UNLOADING"))
        })
        .and_then(|p| p.pointer("/address/country"))
        .and_then(Value::as_str);

    from_places.or_else(|| {
        offer
            .pointer("/destinationLocation/area/address/country")
            .and_then(Value::as_str)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offer(id: &str, unloading_country: &str) -> Value {
        json!({
            "id": id,
            "loadingPlaces": [
                {"loadingType": "LOADING", "address": {"city": "Berlin", "country": "DE"}},
                {"loadingType": "UNLOADING", "address": {"city": "X", "country": unloading_country}}
            ]
        })
    }

    #[test]
    fn test_extract_offers_from_payload_or_array() {
        let wrapped = json!({"payload": [{"id": "1"}, {"id": "2"}], "totalResults": 2});
        assert_eq!(extract_offers(&wrapped).len(), 2);
        assert_eq!(extract_offers(&json!([{"id": "1"}])).len(), 1);
        assert!(extract_offers(&json!({"message": "nothing"})).is_empty());
    }

    #[test]
    fn test_process_filters_dedupes_and_caps() {
        let offers = vec![
            offer("1", "DE"),
            offer("1", "DE"),
            offer("2", "FR"),
            offer("3", "pl"),
            json!({"id": "4"}),
            offer("5", "PL"),
        ];
        let filter = OfferFilter {
            preferred_countries: vec!["DE".to_string(), "PL".to_string()],
            max_results: Some(3),
        };

        let processed = process_offers(&offers, &filter);
        let ids: Vec<&str> = processed.iter().map(|o| o["id"].as_str().unwrap()).collect();

        assert_eq!(ids, vec!["1", "3", "4"]);
    }

    #[test]
    fn test_no_preferences_keeps_everything_unique() {
        let offers = vec![offer("1", "DE"), offer("2", "FR"), json!({"price": 10})];
        let processed = process_offers(&offers, &OfferFilter::default());
        assert_eq!(processed.len(), 3);
    }
}
