//! Local filesystem store implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── incidents.json       # incident history, newest first, unique guid
//! ├── status.json          # current snapshot + bounded change history
//! ├── members.json         # membership table keyed by handle
//! ├── role_history.json    # append-only rank-change log
//! └── state.json           # poller state (last incident guid)
//! ```
//!
//! Writes go to a temp file and are renamed into place, so a crash or a
//! racing reader never observes a half-written file. A process-local
//! lock serializes read-modify-write cycles against concurrent pollers
//! and operator-triggered refreshes.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{IncidentRecord, LocalMember, RoleChangeEvent, StatusSnapshot};
use crate::store::Store;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StatusFile {
    current: Option<StatusSnapshot>,
    #[serde(default)]
    history: Vec<StatusSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StateFile {
    last_incident_guid: Option<String>,
}

/// Local filesystem store backend.
#[derive(Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
    history_limit: usize,
    write_lock: Arc<Mutex<()>>,
}

impl LocalStore {
    /// Create a store rooted at the given directory with a bounded
    /// status history.
    pub fn new(root_dir: impl Into<PathBuf>, history_limit: usize) -> Self {
        Self {
            root_dir: root_dir.into(),
            history_limit,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Store for LocalStore {
    async fn insert_incident(&self, incident: &IncidentRecord) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut incidents: Vec<IncidentRecord> =
            self.read_json("incidents.json").await?.unwrap_or_default();

        if incidents.iter().any(|i| i.guid == incident.guid) {
            return Ok(false);
        }

        incidents.insert(0, incident.clone());
        self.write_json("incidents.json", &incidents).await?;
        Ok(true)
    }

    async fn recent_incidents(&self, limit: usize) -> Result<Vec<IncidentRecord>> {
        let mut incidents: Vec<IncidentRecord> =
            self.read_json("incidents.json").await?.unwrap_or_default();
        incidents.truncate(limit);
        Ok(incidents)
    }

    async fn last_incident_guid(&self) -> Result<Option<String>> {
        let state: StateFile = self.read_json("state.json").await?.unwrap_or_default();
        Ok(state.last_incident_guid)
    }

    async fn set_last_incident_guid(&self, guid: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut state: StateFile = self.read_json("state.json").await?.unwrap_or_default();
        state.last_incident_guid = Some(guid.to_string());
        self.write_json("state.json", &state).await
    }

    async fn load_status(&self) -> Result<Option<StatusSnapshot>> {
        let file: StatusFile = self.read_json("status.json").await?.unwrap_or_default();
        Ok(file.current)
    }

    async fn save_status(&self, snapshot: &StatusSnapshot) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut file: StatusFile = self.read_json("status.json").await?.unwrap_or_default();
        file.current = Some(snapshot.clone());
        file.history.insert(0, snapshot.clone());
        file.history.truncate(self.history_limit);
        self.write_json("status.json", &file).await
    }

    async fn status_history(&self, limit: usize) -> Result<Vec<StatusSnapshot>> {
        let file: StatusFile = self.read_json("status.json").await?.unwrap_or_default();
        let mut history = file.history;
        history.truncate(limit);
        Ok(history)
    }

    async fn members(&self) -> Result<Vec<LocalMember>> {
        Ok(self.read_json("members.json").await?.unwrap_or_default())
    }

    async fn upsert_member(&self, member: &LocalMember) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut members: Vec<LocalMember> =
            self.read_json("members.json").await?.unwrap_or_default();

        let key = member.handle.to_lowercase();
        match members
            .iter_mut()
            .find(|m| m.handle.to_lowercase() == key)
        {
            Some(existing) => *existing = member.clone(),
            None => members.push(member.clone()),
        }

        self.write_json("members.json", &members).await
    }

    async fn append_role_history(&self, event: &RoleChangeEvent) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut history: Vec<RoleChangeEvent> = self
            .read_json("role_history.json")
            .await?
            .unwrap_or_default();
        history.insert(0, event.clone());
        self.write_json("role_history.json", &history).await
    }

    async fn role_history(&self, limit: usize) -> Result<Vec<RoleChangeEvent>> {
        let mut history: Vec<RoleChangeEvent> = self
            .read_json("role_history.json")
            .await?
            .unwrap_or_default();
        history.truncate(limit);
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChangeReason, SystemStatus};
    use chrono::Utc;

    fn make_store(dir: &tempfile::TempDir) -> LocalStore {
        LocalStore::new(dir.path(), 5)
    }

    fn make_incident(guid: &str) -> IncidentRecord {
        IncidentRecord {
            guid: guid.to_string(),
            title: format!("Incident {guid}"),
            description: String::new(),
            status: "major-outage".to_string(),
            components: vec!["Platform".to_string()],
            link: String::new(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn incident_insert_is_idempotent_on_guid() {
        let dir = tempfile::tempdir().unwrap();
        let store = make_store(&dir);

        assert!(store.insert_incident(&make_incident("X1")).await.unwrap());
        assert!(!store.insert_incident(&make_incident("X1")).await.unwrap());

        let incidents = store.recent_incidents(10).await.unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].guid, "X1");
    }

    #[tokio::test]
    async fn incidents_are_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = make_store(&dir);

        store.insert_incident(&make_incident("older")).await.unwrap();
        store.insert_incident(&make_incident("newer")).await.unwrap();

        let incidents = store.recent_incidents(10).await.unwrap();
        assert_eq!(incidents[0].guid, "newer");
        assert_eq!(incidents[1].guid, "older");
    }

    #[tokio::test]
    async fn last_incident_guid_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = make_store(&dir);

        assert_eq!(store.last_incident_guid().await.unwrap(), None);
        store.set_last_incident_guid("X9").await.unwrap();
        assert_eq!(
            store.last_incident_guid().await.unwrap().as_deref(),
            Some("X9")
        );
    }

    #[tokio::test]
    async fn status_history_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = make_store(&dir);

        for _ in 0..8 {
            let snapshot = StatusSnapshot::uniform(SystemStatus::Operational, Utc::now());
            store.save_status(&snapshot).await.unwrap();
        }

        assert_eq!(store.status_history(100).await.unwrap().len(), 5);
        assert!(store.load_status().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn member_upsert_is_keyed_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let store = make_store(&dir);

        store
            .upsert_member(&LocalMember {
                id: "1".into(),
                handle: "SpaceAce".into(),
                rank: "Employee".into(),
            })
            .await
            .unwrap();
        store
            .upsert_member(&LocalMember {
                id: "1".into(),
                handle: "spaceace".into(),
                rank: "Executive".into(),
            })
            .await
            .unwrap();

        let members = store.members().await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].rank, "Executive");
    }

    #[tokio::test]
    async fn role_history_appends_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = make_store(&dir);

        for (i, reason) in [ChangeReason::NotInOrg, ChangeReason::Affiliate]
            .iter()
            .enumerate()
        {
            store
                .append_role_history(&RoleChangeEvent {
                    member_id: i.to_string(),
                    handle: format!("member{i}"),
                    old_rank: "Executive".into(),
                    new_rank: "Employee".into(),
                    reason: *reason,
                    changed_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let history = store.role_history(10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].handle, "member1");
    }
}
