//! Organization profile structures.

use serde::{Deserialize, Serialize};

/// One focus area of an organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OrgFocus {
    /// Focus name (empty if the page shows none)
    #[serde(default)]
    pub name: String,

    /// Focus icon URL
    #[serde(default)]
    pub image_url: String,
}

/// An organization's public profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrganizationProfile {
    /// Organization short-code
    pub sid: String,

    /// Organization display name
    pub name: String,

    /// Member count as reported by the search endpoint (0 if unavailable)
    #[serde(default)]
    pub member_count: u32,

    /// Primary focus
    #[serde(default)]
    pub primary_focus: OrgFocus,

    /// Secondary focus
    #[serde(default)]
    pub secondary_focus: OrgFocus,

    /// Logo image URL
    #[serde(default)]
    pub logo_url: String,

    /// Banner image URL
    #[serde(default)]
    pub banner_url: String,
}
