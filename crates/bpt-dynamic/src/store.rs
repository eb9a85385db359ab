//! Persisted snapshot lookup
//!
//! Reduced entity state is stored as snapshot envelopes keyed by
//! `Entity-id-snapshot`. [`LocalEventStore`] reads the line-delimited JSON
//! event file a locally running application writes.

use crate::error::StoreError;
use async_trait::async_trait;
use bpt_model::ValueMap;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Composite key of one entity instance's snapshots
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotKey {
    pub entity: String,
    pub id: String,
}

impl SnapshotKey {
    #[must_use]
    pub fn new(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-snapshot", self.entity, self.id)
    }
}

/// One persisted snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEnvelope {
    pub value: ValueMap,
    pub created_at: DateTime<Utc>,
}

impl SnapshotEnvelope {
    #[must_use]
    pub fn new(value: ValueMap, created_at: DateTime<Utc>) -> Self {
        Self { value, created_at }
    }

    /// Most recently created envelope; the last one wins a tie
    #[must_use]
    pub fn latest(envelopes: &[SnapshotEnvelope]) -> Option<&SnapshotEnvelope> {
        envelopes.iter().max_by_key(|e| e.created_at)
    }
}

/// Source of persisted entity snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync + fmt::Debug {
    /// Every snapshot recorded under `key`, in no particular order
    ///
    /// # Errors
    /// [`StoreError`] if the store cannot be read
    async fn snapshots(&self, key: &SnapshotKey) -> Result<Vec<SnapshotEnvelope>, StoreError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    entity_type_name: Option<String>,
    #[serde(default, rename = "entityID")]
    entity_id: Option<Value>,
    #[serde(default)]
    value: Option<ValueMap>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl EventRecord {
    fn into_snapshot(self, key: &SnapshotKey) -> Option<SnapshotEnvelope> {
        if self.kind.as_deref() != Some("snapshot")
            || self.entity_type_name.as_deref() != Some(key.entity.as_str())
        {
            return None;
        }
        let id_matches = match &self.entity_id {
            Some(Value::String(id)) => *id == key.id,
            Some(other) => other.to_string() == key.id,
            None => false,
        };
        if !id_matches {
            return None;
        }
        Some(SnapshotEnvelope::new(self.value?, self.created_at?))
    }
}

/// Snapshot store over a line-delimited JSON event file
#[derive(Debug, Clone)]
pub struct LocalEventStore {
    path: PathBuf,
}

impl LocalEventStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for LocalEventStore {
    async fn snapshots(&self, key: &SnapshotKey) -> Result<Vec<SnapshotEnvelope>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "event file not written yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::io_error(&self.path, e)),
        };

        let mut snapshots = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<EventRecord>(line) {
                Ok(record) => snapshots.extend(record.into_snapshot(key)),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %e,
                    "skipping undecodable event line"
                ),
            }
        }
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn events_file(lines: &[Value]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn key_format() {
        assert_eq!(SnapshotKey::new("Drink", "t-1").to_string(), "Drink-t-1-snapshot");
    }

    #[tokio::test]
    async fn reads_matching_snapshots() {
        let file = events_file(&[
            json!({"kind": "event", "entityTypeName": "Drink", "entityID": "t-1",
                   "value": {"drink": "gimlet"}, "createdAt": "2024-05-01T10:00:00.000Z"}),
            json!({"kind": "snapshot", "entityTypeName": "Drink", "entityID": "t-1",
                   "value": {"drink": "Gimlet"}, "createdAt": "2024-05-01T10:00:01.000Z"}),
            json!({"kind": "snapshot", "entityTypeName": "Drink", "entityID": "t-2",
                   "value": {"drink": "Negroni"}, "createdAt": "2024-05-01T10:00:02.000Z"}),
            json!({"$$deleted": true, "_id": "abc"}),
        ]);
        let store = LocalEventStore::new(file.path());

        let snapshots = store.snapshots(&SnapshotKey::new("Drink", "t-1")).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].value["drink"], "Gimlet");
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalEventStore::new(dir.path().join("events.json"));
        assert!(store
            .snapshots(&SnapshotKey::new("Drink", "t-1"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn undecodable_lines_are_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(
            file,
            "{}",
            json!({"kind": "snapshot", "entityTypeName": "Drink", "entityID": "t-1",
                   "value": {"drink": "Gimlet"}, "createdAt": "2024-05-01T10:00:01.000Z"})
        )
        .unwrap();
        writeln!(file, "{{\"kind\": \"snapshot\",").unwrap();

        let snapshots = LocalEventStore::new(file.path())
            .snapshots(&SnapshotKey::new("Drink", "t-1"))
            .await
            .unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].value["drink"], "Gimlet");
    }

    #[test]
    fn latest_by_creation_time() {
        let at = |s: &str| s.parse::<DateTime<Utc>>().unwrap();
        let envelopes = vec![
            SnapshotEnvelope::new(json!({"n": 1}).as_object().unwrap().clone(), at("2024-05-01T10:00:02Z")),
            SnapshotEnvelope::new(json!({"n": 2}).as_object().unwrap().clone(), at("2024-05-01T10:00:05Z")),
            SnapshotEnvelope::new(json!({"n": 3}).as_object().unwrap().clone(), at("2024-05-01T10:00:01Z")),
        ];
        assert_eq!(SnapshotEnvelope::latest(&envelopes).unwrap().value["n"], 2);
        assert!(SnapshotEnvelope::latest(&[]).is_none());
    }
}
