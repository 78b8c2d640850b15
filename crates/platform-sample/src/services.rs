//! Cross-cutting services shared by every module through the
//! [`SharedContext`](module_orchestrator::SharedContext).
//!
//! These are deliberately small in-memory stand-ins for a real database, cache and message
//! bus. The entry point builds them once and the orchestrator hands them to every factory.

use module_orchestrator::SharedContext;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Collection-scoped key/value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, serde_json::Value>>>,
}

impl MemoryStore {
    pub async fn put(&self, collection: &str, key: &str, value: serde_json::Value) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value);
        debug!(collection, key, "Stored");
    }

    pub async fn get(&self, collection: &str, key: &str) -> Option<serde_json::Value> {
        let collections = self.collections.read().await;
        collections.get(collection).and_then(|c| c.get(key)).cloned()
    }

    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, HashMap::len)
    }
}

/// String cache with hit/miss counters.
#[derive(Debug, Default)]
pub struct Cache {
    entries: RwLock<HashMap<String, String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl Cache {
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().await.insert(key.into(), value.into());
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let value = self.entries.read().await.get(key).cloned();
        let counter = if value.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    pub async fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().await.remove(key)
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().await.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// A message exchanged between business modules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Publish/subscribe bus for cross-module notifications.
#[derive(Debug, Clone)]
pub struct DomainBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl DomainBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, topic: impl Into<String>, payload: serde_json::Value) -> usize {
        let event = DomainEvent {
            topic: topic.into(),
            payload,
        };
        debug!(topic = %event.topic, "Publishing domain event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

/// Builds the shared context every module factory receives.
pub fn shared_context(bus_capacity: usize) -> SharedContext {
    SharedContext::builder()
        .with(MemoryStore::default())
        .with(Cache::default())
        .with(DomainBus::new(bus_capacity))
        .build()
}
