use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::db::models::{AgentHistoryEntry, SearchKind};
use crate::db::store::{JsonStore, StoreError};

// --- Agent History Service Functions ---

/// Projection of an agent's newest history entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestOffers {
    pub agent_id: String,
    pub offers: Vec<Value>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Appends a search to an agent's history and prunes the oldest entries beyond `limit`.
/// At least the entry just recorded is always kept.
pub async fn record_search(
    store: &JsonStore,
    agent_id: &str,
    kind: SearchKind,
    search_params: Value,
    initial_offers: Vec<Value>,
    processed_offers: Vec<Value>,
    limit: usize,
) -> Result<AgentHistoryEntry, StoreError> {
    let limit = limit.max(1);
    store
        .update(move |db| {
            // Stamped under the writer lock so append order matches timestamp order.
            let entry = AgentHistoryEntry {
                id: Uuid::new_v4().to_string(),
                agent_id: agent_id.to_owned(),
                timestamp: Utc::now(),
                kind,
                search_params,
                offers_count: initial_offers.len(),
                accepted_offers_count: processed_offers.len(),
                initial_offers,
                processed_offers,
            };
            db.agent_history.push(entry.clone());
            prune_agent_history(&mut db.agent_history, agent_id, limit);
            Ok(entry)
        })
        .await
}

/// All entries for an agent, newest first.
pub async fn get_history_for_agent(
    store: &JsonStore,
    agent_id: &str,
) -> Result<Vec<AgentHistoryEntry>, StoreError> {
    let db = store.read().await?;
    let mut entries: Vec<AgentHistoryEntry> = db
        .agent_history
        .into_iter()
        .rev()
        .filter(|e| e.agent_id == agent_id)
        .collect();
    // Stable sort: entries with equal timestamps stay in reverse insertion order.
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(entries)
}

pub async fn get_latest_entry(
    store: &JsonStore,
    agent_id: &str,
) -> Result<Option<AgentHistoryEntry>, StoreError> {
    Ok(get_history_for_agent(store, agent_id).await?.into_iter().next())
}

/// Latest offers for an agent; an agent without history yields an empty list.
pub async fn get_latest_offers(store: &JsonStore, agent_id: &str) -> Result<LatestOffers, StoreError> {
    let latest = get_latest_entry(store, agent_id).await?;
    Ok(match latest {
        Some(entry) => LatestOffers {
            agent_id: entry.agent_id,
            offers: entry.processed_offers,
            last_updated: Some(entry.timestamp),
        },
        None => LatestOffers {
            agent_id: agent_id.to_owned(),
            offers: Vec::new(),
            last_updated: None,
        },
    })
}

/// Removes every history entry of an agent and returns how many were removed.
pub async fn clear_history_for_agent(store: &JsonStore, agent_id: &str) -> Result<usize, StoreError> {
    store
        .update(|db| {
            let before = db.agent_history.len();
            db.agent_history.retain(|e| e.agent_id != agent_id);
            Ok(before - db.agent_history.len())
        })
        .await
}

fn prune_agent_history(history: &mut Vec<AgentHistoryEntry>, agent_id: &str, limit: usize) {
    let mut owned: Vec<usize> = history
        .iter()
        .enumerate()
        .filter(|(_, e)| e.agent_id == agent_id)
        .map(|(i, _)| i)
        .collect();
    if owned.len() <= limit {
        return;
    }

    // Oldest by timestamp first; the stable sort keeps append order for ties.
    owned.sort_by_key(|&i| history[i].timestamp);
    let dropped: HashSet<usize> = owned[..owned.len() - limit].iter().copied().collect();

    let mut index = 0;
    history.retain(|_| {
        let keep = !dropped.contains(&index);
        index += 1;
        keep
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn open_store(dir: &tempfile::TempDir) -> JsonStore {
        JsonStore::open(dir.path().join("db.json")).await.unwrap()
    }

    #[tokio::test]
    async fn test_latest_offers_come_from_newest_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        record_search(&store, "a1", SearchKind::AgentSearch, json!({"n": 1}), vec![json!({"id": "o1"})], vec![json!({"id": "o1"})], 10)
            .await
            .unwrap();
        record_search(
            &store,
            "a1",
            SearchKind::AgentSearch,
            json!({"n": 2}),
            vec![json!({"id": "o2"}), json!({"id": "o3"})],
            vec![json!({"id": "o3"})],
            10,
        )
        .await
        .unwrap();

        let latest = get_latest_offers(&store, "a1").await.unwrap();
        assert_eq!(latest.offers, vec![json!({"id": "o3"})]);
        assert!(latest.last_updated.is_some());

        let entry = get_latest_entry(&store, "a1").await.unwrap().unwrap();
        assert_eq!(entry.search_params, json!({"n": 2}));
        assert_eq!(entry.offers_count, 2);
        assert_eq!(entry.accepted_offers_count, 1);
    }

    #[tokio::test]
    async fn test_history_is_pruned_per_agent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        record_search(&store, "other", SearchKind::AgentSearch, json!({}), vec![], vec![], 2)
            .await
            .unwrap();
        for n in 0..5 {
            record_search(&store, "a1", SearchKind::SequenceSearch, json!({"n": n}), vec![], vec![], 2)
                .await
                .unwrap();
        }

        let history = get_history_for_agent(&store, "a1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].search_params, json!({"n": 4}));
        assert_eq!(history[1].search_params, json!({"n": 3}));
        assert_eq!(get_history_for_agent(&store, "other").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_history_leaves_other_agents() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        record_search(&store, "a1", SearchKind::AgentSearch, json!({}), vec![], vec![], 10).await.unwrap();
        record_search(&store, "a2", SearchKind::AgentSearch, json!({}), vec![], vec![], 10).await.unwrap();

        assert_eq!(clear_history_for_agent(&store, "a1").await.unwrap(), 1);
        assert!(get_latest_offers(&store, "a1").await.unwrap().offers.is_empty());
        assert!(get_latest_entry(&store, "a2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_zero_limit_keeps_the_new_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let entry = record_search(&store, "a1", SearchKind::AgentSearch, json!({}), vec![], vec![], 0)
            .await
            .unwrap();

        let history = get_history_for_agent(&store, "a1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, entry.id);
    }

    #[test]
    fn test_prune_drops_oldest_by_timestamp() {
        use chrono::TimeZone;

        let at = |minute: u32, id: &str| AgentHistoryEntry {
            id: id.to_string(),
            agent_id: "a1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 5, 1, 12, minute, 0).unwrap(),
            kind: SearchKind::AgentSearch,
            search_params: json!({}),
            initial_offers: vec![],
            processed_offers: vec![],
            offers_count: 0,
            accepted_offers_count: 0,
        };
        // Appended out of timestamp order.
        let mut history = vec![at(5, "newer"), at(1, "oldest"), at(9, "newest")];

        prune_agent_history(&mut history, "a1", 2);

        let ids: Vec<_> = history.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "newest"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_records_keep_the_newest() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(open_store(&dir).await);

        let handles: Vec<_> = (0..10)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    record_search(&store, "a1", SearchKind::AgentSearch, json!({"n": n}), vec![], vec![], 3)
                        .await
                        .unwrap()
                })
            })
            .collect();
        let mut recorded = Vec::new();
        for handle in handles {
            recorded.push(handle.await.unwrap());
        }

        recorded.sort_by_key(|e| e.timestamp);
        let newest: Vec<_> = recorded.iter().rev().take(3).map(|e| e.id.clone()).collect();
        let kept: Vec<_> = get_history_for_agent(&store, "a1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(kept.len(), 3);
        for id in &newest {
            assert!(kept.contains(id));
        }
    }
}
