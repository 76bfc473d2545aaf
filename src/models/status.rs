//! Platform status structures.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Names of the systems tracked on the status page.
///
/// A snapshot always carries an entry for every one of these, never a
/// subset.
pub const MONITORED_SYSTEMS: [&str; 3] = ["platform", "persistent-universe", "electronic-access"];

/// Status of one monitored system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SystemStatus {
    Operational,
    Degraded,
    Partial,
    Major,
    Maintenance,
    #[default]
    Unknown,
}

impl SystemStatus {
    /// Parse a status tag as published on the status page.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "operational" => SystemStatus::Operational,
            "degraded" | "degraded-performance" => SystemStatus::Degraded,
            "partial" | "partial-outage" => SystemStatus::Partial,
            "major" | "major-outage" => SystemStatus::Major,
            "maintenance" | "under-maintenance" => SystemStatus::Maintenance,
            _ => SystemStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::Operational => "operational",
            SystemStatus::Degraded => "degraded",
            SystemStatus::Partial => "partial",
            SystemStatus::Major => "major",
            SystemStatus::Maintenance => "maintenance",
            SystemStatus::Unknown => "unknown",
        }
    }
}

/// Point-in-time view of every monitored system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// System name -> status, one entry per monitored system
    pub systems: BTreeMap<String, SystemStatus>,

    /// When the snapshot was taken
    pub checked_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// Snapshot with every monitored system set to the same status.
    pub fn uniform(status: SystemStatus, checked_at: DateTime<Utc>) -> Self {
        Self {
            systems: MONITORED_SYSTEMS
                .iter()
                .map(|name| (name.to_string(), status))
                .collect(),
            checked_at,
        }
    }

    /// Whether any system differs from `other`. Timestamps are ignored;
    /// only per-system statuses count.
    pub fn differs_from(&self, other: &StatusSnapshot) -> bool {
        self.systems != other.systems
    }
}
