// src/store/mod.rs

//! Persistence abstractions for engine state.
//!
//! The store keeps everything that must survive restarts: incident
//! history keyed by guid (idempotent insert), the current status
//! snapshot plus its bounded history log, the local membership table
//! keyed by external handle, and the append-only rank-change log.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{IncidentRecord, LocalMember, RoleChangeEvent, StatusSnapshot};

// Re-export for convenience
pub use local::LocalStore;

/// Trait for persistent store backends.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert an incident; a duplicate guid is a silent no-op.
    ///
    /// Returns whether the record was new.
    async fn insert_incident(&self, incident: &IncidentRecord) -> Result<bool>;

    /// Most recent incidents, newest first.
    async fn recent_incidents(&self, limit: usize) -> Result<Vec<IncidentRecord>>;

    /// Guid of the last incident seen by the poller.
    async fn last_incident_guid(&self) -> Result<Option<String>>;

    /// Persist the last-seen incident guid.
    async fn set_last_incident_guid(&self, guid: &str) -> Result<()>;

    /// Last persisted status snapshot.
    async fn load_status(&self) -> Result<Option<StatusSnapshot>>;

    /// Persist the current status snapshot and append it to the bounded
    /// history log.
    async fn save_status(&self, snapshot: &StatusSnapshot) -> Result<()>;

    /// Status change history, newest first.
    async fn status_history(&self, limit: usize) -> Result<Vec<StatusSnapshot>>;

    /// All local members.
    async fn members(&self) -> Result<Vec<LocalMember>>;

    /// Insert or replace a member, keyed by lowercased handle.
    async fn upsert_member(&self, member: &LocalMember) -> Result<()>;

    /// Append one rank change to the history log.
    async fn append_role_history(&self, event: &RoleChangeEvent) -> Result<()>;

    /// Rank-change history, newest first.
    async fn role_history(&self, limit: usize) -> Result<Vec<RoleChangeEvent>>;
}
