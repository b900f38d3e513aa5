use chrono::Utc;
use uuid::Uuid;

use crate::db::models::{Agent, AgentInput};
use crate::db::store::{JsonStore, StoreError};

// --- Agent Service Functions ---

pub async fn get_all_agents(store: &JsonStore) -> Result<Vec<Agent>, StoreError> {
    Ok(store.read().await?.agents)
}

pub async fn get_agent_by_id(store: &JsonStore, agent_id: &str) -> Result<Option<Agent>, StoreError> {
    let db = store.read().await?;
    Ok(db.agents.into_iter().find(|a| a.id == agent_id))
}

/// Creates an agent. `input.name` is expected to be validated by the caller.
pub async fn create_agent(store: &JsonStore, input: AgentInput) -> Result<Agent, StoreError> {
    let now = Utc::now();
    let agent = Agent {
        id: Uuid::new_v4().to_string(),
        name: input.name.unwrap_or_default(),
        selected_logistics_base: input.selected_logistics_base,
        destination_city: input.destination_city,
        search_radius: input.search_radius,
        preferred_countries: input.preferred_countries,
        max_operating_radius: input.max_operating_radius,
        trailer_types: input.trailer_types,
        special_equipment: input.special_equipment,
        certificates: input.certificates,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let created = agent.clone();
    store
        .update(move |db| {
            db.agents.push(agent);
            Ok(())
        })
        .await?;
    Ok(created)
}

/// Replaces the writable fields of an agent. A missing `name` keeps the current one.
pub async fn update_agent(
    store: &JsonStore,
    agent_id: &str,
    input: AgentInput,
) -> Result<Agent, StoreError> {
    store
        .update(|db| {
            let agent = db
                .agents
                .iter_mut()
                .find(|a| a.id == agent_id)
                .ok_or_else(|| StoreError::NotFound(format!("Agent {agent_id} not found")))?;

            if let Some(name) = input.name {
                agent.name = name;
            }
            agent.selected_logistics_base = input.selected_logistics_base;
            agent.destination_city = input.destination_city;
            agent.search_radius = input.search_radius;
            agent.preferred_countries = input.preferred_countries;
            agent.max_operating_radius = input.max_operating_radius;
            agent.trailer_types = input.trailer_types;
            agent.special_equipment = input.special_equipment;
            agent.certificates = input.certificates;
            agent.updated_at = Some(Utc::now());

            Ok(agent.clone())
        })
        .await
}

/// Deletes an agent. Its search history is left untouched.
pub async fn delete_agent(store: &JsonStore, agent_id: &str) -> Result<(), StoreError> {
    store
        .update(|db| {
            let before = db.agents.len();
            db.agents.retain(|a| a.id != agent_id);
            if db.agents.len() == before {
                return Err(StoreError::NotFound(format!("Agent {agent_id} not found")));
            }
            Ok(())
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::CityRef;

    async fn open_store(dir: &tempfile::TempDir) -> JsonStore {
        JsonStore::open(dir.path().join("db.json")).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_update_delete_agent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let created = create_agent(
            &store,
            AgentInput {
                name: Some("Nord".to_string()),
                preferred_countries: vec!["DE".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(get_all_agents(&store).await.unwrap().len(), 1);

        let updated = update_agent(
            &store,
            &created.id,
            AgentInput {
                destination_city: Some(CityRef::Name("Wien".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Nord");
        assert_eq!(updated.destination_city, Some(CityRef::Name("Wien".to_string())));
        assert!(updated.preferred_countries.is_empty());

        delete_agent(&store, &created.id).await.unwrap();
        assert!(get_agent_by_id(&store, &created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_agent_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let result = update_agent(&store, "missing", AgentInput::default()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(matches!(delete_agent(&store, "missing").await, Err(StoreError::NotFound(_))));
    }
}
