//! Member record structures.

use serde::{Deserialize, Serialize};

/// Whether the organization is the member's primary org or a secondary one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OrgAffiliation {
    /// The organization is the member's main org
    #[default]
    Main,
    /// The member's primary membership is elsewhere
    Affiliate,
}

impl OrgAffiliation {
    pub fn is_affiliate(&self) -> bool {
        matches!(self, OrgAffiliation::Affiliate)
    }
}

/// One member as published on the organization's roster.
///
/// A roster sync produces a fresh list of these; records are never
/// mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberRecord {
    /// External unique identifier, compared case-insensitively
    pub handle: String,

    /// Display name shown on the roster (falls back to the handle)
    pub display: String,

    /// Rank label as published by the organization
    pub rank: String,

    /// Star rating, 0-5
    #[serde(default)]
    pub stars: u8,

    /// Role tags listed for the member
    #[serde(default)]
    pub roles: Vec<String>,

    /// Organization status for this member
    #[serde(default)]
    pub affiliation: OrgAffiliation,

    /// Avatar image URL, if shown
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl MemberRecord {
    /// Canonical key for dedup and lookups.
    pub fn key(&self) -> String {
        self.handle.to_lowercase()
    }
}

/// A member as known to the local membership store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalMember {
    /// Local identifier (opaque to the engine)
    pub id: String,

    /// External handle this member is linked to
    pub handle: String,

    /// Current local rank label
    pub rank: String,
}

/// A user's membership in one organization, as shown on their profile page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserOrgMembership {
    /// Organization short-code
    pub sid: String,

    /// Organization display name
    pub name: String,

    /// The user's rank within that organization
    pub rank: String,

    /// Star rating, 0-5
    #[serde(default)]
    pub stars: u8,
}

/// A user profile with organization affiliations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// External handle
    pub handle: String,

    /// Display name
    pub display: String,

    /// Enlistment date string as published
    #[serde(default)]
    pub enlisted: String,

    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,

    /// The user's main organization, if any
    #[serde(default)]
    pub main_org: Option<UserOrgMembership>,

    /// Secondary organizations
    #[serde(default)]
    pub affiliates: Vec<UserOrgMembership>,
}
