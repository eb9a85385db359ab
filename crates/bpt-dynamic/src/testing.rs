//! In-memory doubles for exercising the runner without a live application

use crate::error::{StoreError, TransportError};
use crate::store::{SnapshotEnvelope, SnapshotKey, SnapshotStore};
use crate::transport::{GraphQlClient, GraphQlRequest};
use async_trait::async_trait;
use bpt_model::ValueMap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

type Handler = dyn Fn(&GraphQlRequest) -> Result<Value, TransportError> + Send + Sync;

/// Transport answering every request through a closure, recording each one
pub struct ScriptedTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<GraphQlRequest>>,
}

impl fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("requests", &self.requests.lock().len())
            .finish_non_exhaustive()
    }
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&GraphQlRequest) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Accepts every mutation and lists no read-model items
    #[must_use]
    pub fn succeeding() -> Self {
        Self::new(|request| {
            if request.query.starts_with("query") {
                Ok(json!({ request.operation.clone(): { "items": [] } }))
            } else {
                Ok(json!({ request.operation.clone(): true }))
            }
        })
    }

    /// Fails every request with a GraphQL error
    #[must_use]
    pub fn rejecting(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(TransportError::GraphQl(vec![message.clone()])))
    }

    /// Every request received so far, oldest first
    #[must_use]
    pub fn requests(&self) -> Vec<GraphQlRequest> {
        self.requests.lock().clone()
    }

    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.operation.clone())
            .collect()
    }
}

#[async_trait]
impl GraphQlClient for ScriptedTransport {
    async fn execute(&self, request: &GraphQlRequest) -> Result<Value, TransportError> {
        self.requests.lock().push(request.clone());
        (self.handler)(request)
    }
}

#[derive(Debug, Clone)]
struct StoredSnapshot {
    envelope: SnapshotEnvelope,
    visible_from: Instant,
}

/// Snapshot store held in memory; entries may become visible after a delay
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<SnapshotKey, Vec<StoredSnapshot>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot created now, visible immediately
    pub fn insert(&self, key: SnapshotKey, value: ValueMap) {
        self.insert_at(key, value, Utc::now());
    }

    pub fn insert_at(&self, key: SnapshotKey, value: ValueMap, created_at: DateTime<Utc>) {
        self.push(key, SnapshotEnvelope::new(value, created_at), Instant::now());
    }

    /// Store a snapshot that lookups only see once `delay` has passed
    pub fn insert_after(&self, key: SnapshotKey, value: ValueMap, delay: Duration) {
        self.push(
            key,
            SnapshotEnvelope::new(value, Utc::now()),
            Instant::now() + delay,
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, key: SnapshotKey, envelope: SnapshotEnvelope, visible_from: Instant) {
        self.entries.entry(key).or_default().push(StoredSnapshot {
            envelope,
            visible_from,
        });
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn snapshots(&self, key: &SnapshotKey) -> Result<Vec<SnapshotEnvelope>, StoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(key)
            .map(|stored| {
                stored
                    .iter()
                    .filter(|s| s.visible_from <= now)
                    .map(|s| s.envelope.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_transport_records_requests() {
        let transport = ScriptedTransport::succeeding();
        let request = GraphQlRequest::new("OrderCocktail", "mutation { OrderCocktail }");
        let data = transport.execute(&request).await.unwrap();
        assert_eq!(data, json!({"OrderCocktail": true}));
        assert_eq!(transport.operations(), vec!["OrderCocktail"]);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_snapshots_appear_later() {
        let store = MemoryStore::new();
        let key = SnapshotKey::new("Drink", "t-1");
        store.insert_after(key.clone(), ValueMap::new(), Duration::from_millis(300));

        assert!(store.snapshots(&key).await.unwrap().is_empty());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.snapshots(&key).await.unwrap().len(), 1);
        assert_eq!(store.len(), 1);
    }
}
