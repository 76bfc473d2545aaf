//! Events emitted by the engine.
//!
//! These four shapes are the entire contract the surrounding application
//! consumes; delivery and authorization are the caller's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::incident::IncidentRecord;
use super::member::MemberRecord;
use super::status::StatusSnapshot;

/// Why a member's rank was changed by reconciliation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    /// Handle not found on the organization roster
    NotInOrg,
    /// Affiliate holding a rank above the configured cap
    Affiliate,
}

impl ChangeReason {
    pub fn describe(&self) -> &'static str {
        match self {
            ChangeReason::NotInOrg => "Not found in organization",
            ChangeReason::Affiliate => "Affiliate status incompatible with leadership rank",
        }
    }
}

/// The sole output of reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleChangeEvent {
    /// Local member id
    pub member_id: String,

    /// External handle
    pub handle: String,

    /// Rank before the change
    pub old_rank: String,

    /// Rank after the change
    pub new_rank: String,

    /// Reason code for the change
    pub reason: ChangeReason,

    /// When the change was computed
    pub changed_at: DateTime<Utc>,
}

/// Engine output events, consumed by the notification layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EngineEvent {
    /// At least one monitored system changed status
    StatusChanged(StatusSnapshot),

    /// A new incident appeared on the feed; `urgent` requests broader
    /// notification and pinning from the consumer
    NewIncident {
        record: IncidentRecord,
        urgent: bool,
    },

    /// A roster sync completed with a fresh member list
    RosterSynced(Vec<MemberRecord>),

    /// Reconciliation derived one rank change
    MemberReconciled(RoleChangeEvent),
}
