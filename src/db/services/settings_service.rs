use chrono::Utc;
use serde_json::{Map, Value};

use crate::db::models::TimocomSettings;
use crate::db::store::{JsonStore, StoreError};

// --- Settings Service Functions ---

/// Retrieves the TIMOCOM settings; an unset blob reads as empty.
pub async fn get_timocom_settings(store: &JsonStore) -> Result<TimocomSettings, StoreError> {
    Ok(store.read().await?.timocom_settings.unwrap_or_default())
}

/// Replaces the TIMOCOM settings blob and stamps `lastUpdated`.
/// A client-supplied `lastUpdated` is discarded.
pub async fn update_timocom_settings(
    store: &JsonStore,
    mut values: Map<String, Value>,
) -> Result<TimocomSettings, StoreError> {
    values.remove("lastUpdated");
    let settings = TimocomSettings {
        values,
        last_updated: Some(Utc::now()),
    };

    let saved = settings.clone();
    store
        .update(move |db| {
            db.timocom_settings = Some(settings);
            Ok(())
        })
        .await?;
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_stamps_last_updated() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("db.json")).await.unwrap();

        assert!(get_timocom_settings(&store).await.unwrap().last_updated.is_none());

        let mut values = Map::new();
        values.insert("apiMode".to_string(), json!("sandbox"));
        values.insert("lastUpdated".to_string(), json!("1999-01-01T00:00:00Z"));
        let saved = update_timocom_settings(&store, values).await.unwrap();

        let loaded = get_timocom_settings(&store).await.unwrap();
        assert_eq!(loaded.values.get("apiMode"), Some(&json!("sandbox")));
        assert!(!loaded.values.contains_key("lastUpdated"));
        assert_eq!(loaded.last_updated, saved.last_updated);
        assert!(loaded.last_updated.unwrap().timestamp() > 946_684_800);
    }
}
