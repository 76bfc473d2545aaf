// src/lib.rs

//! orgwatch: external-data synchronization and monitoring engine.
//!
//! Keeps a local membership model synchronized with an organization's
//! public web presence and raises typed events when the platform's
//! status or incident feed changes. Data flows one way: fetch ->
//! extract -> cache -> {roster sync, pollers} -> reconciliation and
//! event consumers.

pub mod cache;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod poll;
pub mod store;
pub mod sync;
pub mod utils;
