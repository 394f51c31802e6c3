//! Agent registry
//!
//! Maintains the in-memory set of known agent descriptors. Durable storage
//! is abstracted behind the [`CardStore`] capability; the registry mirrors
//! writes to it best-effort and never assumes a specific backend.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::protocol::{AgentCard, GatewayResult};

/// External persistence capability for agent cards.
///
/// Implemented by an external store; the gateway core ships no concrete
/// database backend.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn save(&self, card: &AgentCard) -> GatewayResult<()>;
    async fn load(&self, id: &str) -> GatewayResult<Option<AgentCard>>;
    async fn load_all(&self) -> GatewayResult<Vec<AgentCard>>;
    async fn delete(&self, id: &str) -> GatewayResult<()>;
}

/// One registered card plus its registration sequence number.
///
/// The sequence is the router's tie-break order: first registered wins.
/// Re-registering an id replaces the card but keeps its sequence.
#[derive(Debug, Clone)]
struct RegistryEntry {
    card: AgentCard,
    seq: u64,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<String, RegistryEntry>,
    /// Lowercased skill id/tag -> agent ids. Exact-match fast path;
    /// name-substring matches still scan.
    skill_index: HashMap<String, HashSet<String>>,
    next_seq: u64,
}

impl RegistryState {
    fn index_card(&mut self, card: &AgentCard) {
        for skill in &card.skills {
            self.skill_index
                .entry(skill.id.to_lowercase())
                .or_default()
                .insert(card.id.clone());
            for tag in &skill.tags {
                self.skill_index
                    .entry(tag.to_lowercase())
                    .or_default()
                    .insert(card.id.clone());
            }
        }
    }

    fn unindex_card(&mut self, card: &AgentCard) {
        for skill in &card.skills {
            let mut keys: Vec<String> = vec![skill.id.to_lowercase()];
            keys.extend(skill.tags.iter().map(|t| t.to_lowercase()));
            for key in keys {
                if let Some(ids) = self.skill_index.get_mut(&key) {
                    ids.remove(&card.id);
                    if ids.is_empty() {
                        self.skill_index.remove(&key);
                    }
                }
            }
        }
    }

    fn insert(&mut self, card: AgentCard) {
        let prior = self
            .entries
            .get(&card.id)
            .map(|entry| (entry.card.clone(), entry.seq));

        let seq = match prior {
            // Overwrite keeps the original tie-break position
            Some((old, seq)) => {
                self.unindex_card(&old);
                seq
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                seq
            }
        };

        self.index_card(&card);
        self.entries.insert(card.id.clone(), RegistryEntry { card, seq });
    }
}

/// In-memory agent registry.
///
/// A single mutual-exclusion domain over the backing state; register,
/// unregister and the router's read-then-select all serialize through it,
/// so a concurrent write can never produce a torn card.
pub struct AgentRegistry {
    state: RwLock<RegistryState>,
    store: Option<Arc<dyn CardStore>>,
}

impl AgentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            store: None,
        }
    }

    /// Create a registry mirroring writes to an external card store.
    pub fn with_store(store: Arc<dyn CardStore>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            store: Some(store),
        }
    }

    /// Load previously persisted cards into memory.
    pub async fn hydrate(&self) -> GatewayResult<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };

        let cards = store.load_all().await?;
        let mut state = self.state.write().await;
        let count = cards.len();
        for card in cards {
            state.insert(card);
        }

        tracing::info!(count, "Registry hydrated from store");
        Ok(count)
    }

    /// Register an agent, overwriting any existing entry with the same id.
    ///
    /// Assigns an id when the card has none and stamps both timestamps.
    /// Always succeeds; store mirroring is best-effort.
    pub async fn register(&self, mut card: AgentCard) -> AgentCard {
        if card.id.is_empty() {
            card.id = Uuid::now_v7().to_string();
        }

        let now = Utc::now();
        card.registered_at = Some(now);
        card.updated_at = Some(now);

        {
            let mut state = self.state.write().await;
            state.insert(card.clone());
        }

        tracing::info!(agent_id = %card.id, name = %card.name, "Agent registered");

        if let Some(store) = &self.store {
            if let Err(err) = store.save(&card).await {
                tracing::warn!(agent_id = %card.id, error = %err, "Card store save failed");
            }
        }

        card
    }

    /// Get an agent by id.
    pub async fn get(&self, agent_id: &str) -> Option<AgentCard> {
        let state = self.state.read().await;
        state.entries.get(agent_id).map(|entry| entry.card.clone())
    }

    /// Snapshot of all registered cards. Insertion order is not preserved.
    pub async fn list(&self) -> Vec<AgentCard> {
        let state = self.state.read().await;
        state.entries.values().map(|entry| entry.card.clone()).collect()
    }

    /// Snapshot of all cards in registration order (first registered first).
    pub(crate) async fn list_by_registration(&self) -> Vec<AgentCard> {
        let state = self.state.read().await;
        let mut entries: Vec<&RegistryEntry> = state.entries.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.iter().map(|entry| entry.card.clone()).collect()
    }

    /// Remove an agent. Returns whether an entry existed.
    pub async fn unregister(&self, agent_id: &str) -> bool {
        let removed = {
            let mut state = self.state.write().await;
            match state.entries.remove(agent_id) {
                Some(entry) => {
                    let card = entry.card;
                    state.unindex_card(&card);
                    true
                }
                None => false,
            }
        };

        if removed {
            tracing::info!(agent_id, "Agent unregistered");
            if let Some(store) = &self.store {
                if let Err(err) = store.delete(agent_id).await {
                    tracing::warn!(agent_id, error = %err, "Card store delete failed");
                }
            }
        }

        removed
    }

    /// Find agents whose skills satisfy `query`.
    ///
    /// Matches case-insensitively on skill id, skill name (substring) and
    /// tag membership.
    pub async fn find_by_skill(&self, query: &str) -> Vec<AgentCard> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;

        let mut matched: HashSet<&str> = state
            .skill_index
            .get(&needle)
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default();

        // Name substrings are not indexable; scan for them
        for entry in state.entries.values() {
            if matched.contains(entry.card.id.as_str()) {
                continue;
            }
            if entry.card.matches_skill(&needle) {
                matched.insert(entry.card.id.as_str());
            }
        }

        matched
            .into_iter()
            .filter_map(|id| state.entries.get(id))
            .map(|entry| entry.card.clone())
            .collect()
    }

    /// Count registered agents.
    pub async fn count(&self) -> usize {
        let state = self.state.read().await;
        state.entries.len()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
