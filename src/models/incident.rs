//! Incident feed structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity derived from an incident's structured metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Resolved,
    Major,
    Partial,
    Degraded,
    Unknown,
}

impl Severity {
    /// Major incidents drive broader notification and pinning semantics
    /// in the consumer.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Severity::Major)
    }
}

/// One entry from the incident feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncidentRecord {
    /// Globally unique feed entry id; primary key for dedup
    pub guid: String,

    /// Incident title
    pub title: String,

    /// Incident body (HTML as published)
    #[serde(default)]
    pub description: String,

    /// Status tag from the entry's metadata ("unknown" when absent)
    pub status: String,

    /// Affected components from the entry's metadata
    #[serde(default)]
    pub components: Vec<String>,

    /// Link to the incident page
    #[serde(default)]
    pub link: String,

    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
}

impl IncidentRecord {
    /// Derive a severity from the structured status tag, falling back to
    /// title keywords, then `Unknown`.
    pub fn severity(&self) -> Severity {
        let tag = self.status.to_lowercase();
        if tag.contains("resolved") {
            return Severity::Resolved;
        }
        if tag.contains("major") {
            return Severity::Major;
        }
        if tag.contains("partial") {
            return Severity::Partial;
        }
        if tag.contains("degraded") {
            return Severity::Degraded;
        }

        // Fallback when the feed carried no usable status tag.
        let title = self.title.to_lowercase();
        if title.contains("resolved") {
            Severity::Resolved
        } else if title.contains("major") {
            Severity::Major
        } else if title.contains("partial") {
            Severity::Partial
        } else if title.contains("degraded") {
            Severity::Degraded
        } else {
            Severity::Unknown
        }
    }
}
