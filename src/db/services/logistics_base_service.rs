use chrono::Utc;
use uuid::Uuid;

use crate::db::models::{Address, LogisticsBase};
use crate::db::store::{JsonStore, StoreError};

// --- Logistics Base Service Functions ---

pub async fn get_all_logistics_bases(store: &JsonStore) -> Result<Vec<LogisticsBase>, StoreError> {
    Ok(store.read().await?.logistics_bases)
}

pub async fn get_logistics_base_by_id(
    store: &JsonStore,
    base_id: &str,
) -> Result<Option<LogisticsBase>, StoreError> {
    let db = store.read().await?;
    Ok(db.logistics_bases.into_iter().find(|b| b.id == base_id))
}

/// Creates a logistics base; `address` and `coordinates` are stored exactly as given.
pub async fn create_logistics_base(
    store: &JsonStore,
    name: &str,
    address: Address,
    coordinates: Option<serde_json::Value>,
) -> Result<LogisticsBase, StoreError> {
    let now = Utc::now();
    let base = LogisticsBase {
        id: Uuid::new_v4().to_string(),
        name: name.to_owned(),
        address,
        coordinates,
        created_at: now,
        updated_at: now,
    };

    let created = base.clone();
    store
        .update(move |db| {
            db.logistics_bases.push(base);
            Ok(())
        })
        .await?;
    Ok(created)
}

/// Updates the given fields of a logistics base; `None` leaves a field as it is.
pub async fn update_logistics_base(
    store: &JsonStore,
    base_id: &str,
    name: Option<String>,
    address: Option<Address>,
    coordinates: Option<serde_json::Value>,
) -> Result<LogisticsBase, StoreError> {
    store
        .update(|db| {
            let base = db
                .logistics_bases
                .iter_mut()
                .find(|b| b.id == base_id)
                .ok_or_else(|| StoreError::NotFound(format!("Logistics base {base_id} not found")))?;

            if let Some(name) = name {
                base.name = name;
            }
            if let Some(address) = address {
                base.address = address;
            }
            if coordinates.is_some() {
                base.coordinates = coordinates;
            }
            base.updated_at = Utc::now();

            Ok(base.clone())
        })
        .await
}

/// Deletes a logistics base. Agents still pointing at it are not touched.
pub async fn delete_logistics_base(store: &JsonStore, base_id: &str) -> Result<(), StoreError> {
    store
        .update(|db| {
            let before = db.logistics_bases.len();
            db.logistics_bases.retain(|b| b.id != base_id);
            if db.logistics_bases.len() == before {
                return Err(StoreError::NotFound(format!("Logistics base {base_id} not found")));
            }
            Ok(())
        })
        .await
}
