// src/sync/mod.rs

//! On-demand synchronization against the external organization pages.

mod reconcile;
mod roster;

pub use reconcile::{apply_changes, reconcile};
pub use roster::OrgRosterSync;
