use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root document of the JSON database file.
/// Every collection defaults to empty so a partial or hand-edited file still loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub logistics_bases: Vec<LogisticsBase>,
    #[serde(default)]
    pub agent_history: Vec<AgentHistoryEntry>,
    #[serde(default)]
    pub orders: Vec<Value>,
    #[serde(default)]
    pub conversations: Vec<Value>,
    #[serde(default)]
    pub documents: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timocom_settings: Option<TimocomSettings>,
}

/// Postal address as used by logistics bases and search locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    pub fn city(name: impl Into<String>) -> Self {
        Self {
            city: name.into(),
            ..Default::default()
        }
    }
}

/// A city given either as a bare name (`"Hamburg"`) or as a full address object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CityRef {
    Name(String),
    Address(Address),
}

impl CityRef {
    /// Blank names count as absent.
    pub fn to_address(&self) -> Option<Address> {
        let address = match self {
            CityRef::Name(name) => Address::city(name.trim()),
            CityRef::Address(address) => address.clone(),
        };
        (!address.city.trim().is_empty()).then_some(address)
    }
}

/// A dispatcher profile. Searches run on its behalf starting from its logistics base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub selected_logistics_base: Option<String>, // Weak reference to LogisticsBase.id
    #[serde(default)]
    pub destination_city: Option<CityRef>,
    #[serde(default)]
    pub search_radius: Option<u32>,
    #[serde(default)]
    pub preferred_countries: Vec<String>,
    #[serde(default)]
    pub max_operating_radius: Option<u32>,
    #[serde(default)]
    pub trailer_types: Vec<String>,
    #[serde(default)]
    pub special_equipment: Vec<String>,
    #[serde(default)]
    pub certificates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Writable agent fields, shared by create and update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInput {
    pub name: Option<String>,
    #[serde(default)]
    pub selected_logistics_base: Option<String>,
    #[serde(default)]
    pub destination_city: Option<CityRef>,
    #[serde(default)]
    pub search_radius: Option<u32>,
    #[serde(default)]
    pub preferred_countries: Vec<String>,
    #[serde(default)]
    pub max_operating_radius: Option<u32>,
    #[serde(default)]
    pub trailer_types: Vec<String>,
    #[serde(default)]
    pub special_equipment: Vec<String>,
    #[serde(default)]
    pub certificates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsBase {
    pub id: String,
    pub name: String,
    pub address: Address,
    #[serde(default)]
    pub coordinates: Option<Value>, // Stored verbatim, e.g. {"lat": 52.5, "lng": 13.4}
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsBaseInput {
    pub name: Option<String>,
    pub address: Option<Address>,
    #[serde(default)]
    pub coordinates: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchKind {
    AgentSearch,
    SequenceSearch,
}

/// One recorded search for an agent. The newest entry doubles as the agent's "latest offers".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentHistoryEntry {
    pub id: String,
    pub agent_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: SearchKind,
    pub search_params: Value,
    #[serde(default)]
    pub initial_offers: Vec<Value>,
    #[serde(default)]
    pub processed_offers: Vec<Value>,
    pub offers_count: usize,
    pub accepted_offers_count: usize,
}

/// Free-form TIMOCOM settings; only `lastUpdated` is owned by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimocomSettings {
    #[serde(flatten)]
    pub values: Map<String, Value>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Collections holding opaque pass-through records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Order,
    Conversation,
    Document,
}

impl RecordKind {
    pub fn collection_name(self) -> &'static str {
        match self {
            RecordKind::Order => "orders",
            RecordKind::Conversation => "conversations",
            RecordKind::Document => "documents",
        }
    }

    pub fn records(self, db: &Database) -> &Vec<Value> {
        match self {
            RecordKind::Order => &db.orders,
            RecordKind::Conversation => &db.conversations,
            RecordKind::Document => &db.documents,
        }
    }

    pub fn records_mut(self, db: &mut Database) -> &mut Vec<Value> {
        match self {
            RecordKind::Order => &mut db.orders,
            RecordKind::Conversation => &mut db.conversations,
            RecordKind::Document => &mut db.documents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_city_ref_accepts_name_or_address() {
        let by_name: CityRef = serde_json::from_value(json!("Hamburg")).unwrap();
        let by_address: CityRef =
            serde_json::from_value(json!({"city": "Lyon", "postalCode": "69001", "country": "FR"}))
                .unwrap();

        assert_eq!(by_name.to_address(), Some(Address::city("Hamburg")));
        let lyon = by_address.to_address().unwrap();
        assert_eq!(lyon.postal_code.as_deref(), Some("69001"));
        assert_eq!(lyon.country.as_deref(), Some("FR"));
        assert_eq!(CityRef::Name("  ".to_string()).to_address(), None);
    }

    #[test]
    fn test_database_loads_with_missing_collections() {
        let db: Database = serde_json::from_value(json!({
            "agents": [{"id": "a1", "name": "North"}]
        }))
        .unwrap();

        assert_eq!(db.agents.len(), 1);
        assert!(db.agents[0].preferred_countries.is_empty());
        assert!(db.logistics_bases.is_empty());
        assert!(db.timocom_settings.is_none());
    }

    #[test]
    fn test_settings_keep_unknown_keys() {
        let settings: TimocomSettings = serde_json::from_value(json!({
            "companyId": 42,
            "defaultRadius": 75,
            "lastUpdated": "2025-01-02T03:04:05Z"
        }))
        .unwrap();

        assert_eq!(settings.values.get("companyId"), Some(&json!(42)));
        assert!(settings.last_updated.is_some());
        let round_trip = serde_json::to_value(&settings).unwrap();
        assert_eq!(round_trip["defaultRadius"], json!(75));
    }
}
