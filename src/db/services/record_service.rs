use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::db::models::RecordKind;
use crate::db::store::{JsonStore, StoreError};

// --- Pass-through Record Service Functions (orders, conversations, documents) ---

/// Lists records whose top-level fields equal every given filter value.
pub async fn list_records(
    store: &JsonStore,
    kind: RecordKind,
    filters: &HashMap<String, String>,
) -> Result<Vec<Value>, StoreError> {
    let db = store.read().await?;
    Ok(kind
        .records(&db)
        .iter()
        .filter(|record| matches_filters(record, filters))
        .cloned()
        .collect())
}

pub async fn get_record_by_id(
    store: &JsonStore,
    kind: RecordKind,
    record_id: &str,
) -> Result<Option<Value>, StoreError> {
    let db = store.read().await?;
    Ok(kind
        .records(&db)
        .iter()
        .find(|record| field_as_string(record, "id").as_deref() == Some(record_id))
        .cloned())
}

/// Stores a record, stamping `id` when absent and `createdAt` always.
pub async fn create_record(
    store: &JsonStore,
    kind: RecordKind,
    mut record: serde_json::Map<String, Value>,
) -> Result<Value, StoreError> {
    record
        .entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    record.insert("createdAt".to_string(), Value::String(Utc::now().to_rfc3339()));

    let record = Value::Object(record);
    let created = record.clone();
    store
        .update(move |db| {
            kind.records_mut(db).push(record);
            Ok(())
        })
        .await?;
    Ok(created)
}

fn matches_filters(record: &Value, filters: &HashMap<String, String>) -> bool {
    filters
        .iter()
        .all(|(key, expected)| field_as_string(record, key).as_deref() == Some(expected.as_str()))
}

// Query parameters are strings, so scalar fields are compared by their textual form.
fn field_as_string(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filters_compare_scalars_as_text() {
        let record = json!({"id": 7, "agentId": "a1", "paid": true, "meta": {"x": 1}});

        let mut filters = HashMap::new();
        assert!(matches_filters(&record, &filters));

        filters.insert("id".to_string(), "7".to_string());
        filters.insert("paid".to_string(), "true".to_string());
        assert!(matches_filters(&record, &filters));

        filters.insert("agentId".to_string(), "a2".to_string());
        assert!(!matches_filters(&record, &filters));

        let mut nested = HashMap::new();
        nested.insert("meta".to_string(), "{\"x\":1}".to_string());
        assert!(!matches_filters(&record, &nested));
    }

    #[tokio::test]
    async fn test_create_and_filter_orders() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("db.json")).await.unwrap();

        let first = json!({"agentId": "a1", "status": "open"});
        let second = json!({"id": "ord-2", "agentId": "a2", "status": "open"});
        let created = create_record(&store, RecordKind::Order, first.as_object().unwrap().clone())
            .await
            .unwrap();
        create_record(&store, RecordKind::Order, second.as_object().unwrap().clone())
            .await
            .unwrap();

        assert!(created["id"].is_string());
        assert!(created["createdAt"].is_string());

        let mut filters = HashMap::new();
        filters.insert("status".to_string(), "open".to_string());
        assert_eq!(list_records(&store, RecordKind::Order, &filters).await.unwrap().len(), 2);

        filters.insert("agentId".to_string(), "a2".to_string());
        let only = list_records(&store, RecordKind::Order, &filters).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0]["id"], json!("ord-2"));

        assert!(get_record_by_id(&store, RecordKind::Order, "ord-2").await.unwrap().is_some());
        assert!(get_record_by_id(&store, RecordKind::Document, "ord-2").await.unwrap().is_none());
    }
}
