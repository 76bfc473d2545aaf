// src/models/mod.rs

//! Domain models for the sync engine.
//!
//! This module contains all data structures used throughout the
//! application, organized by their primary purpose.

mod config;
mod events;
mod incident;
mod member;
mod organization;
mod status;

// Re-export all public types
pub use config::{
    CacheConfig, Config, EndpointsConfig, FetcherConfig, MaintenanceConfig, PollConfig,
    RankConfig, RosterConfig,
};
pub use events::{ChangeReason, EngineEvent, RoleChangeEvent};
pub use incident::{IncidentRecord, Severity};
pub use member::{LocalMember, MemberRecord, OrgAffiliation, UserOrgMembership, UserProfile};
pub use organization::{OrgFocus, OrganizationProfile};
pub use status::{MONITORED_SYSTEMS, StatusSnapshot, SystemStatus};
