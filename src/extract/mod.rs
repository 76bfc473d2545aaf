// src/extract/mod.rs

//! Typed extraction of raw HTML/feed payloads.
//!
//! Each page type has a fixed schema of required and optional fields.
//! A missing required field is an [`AppError::Extract`] (structure
//! drift), never a panic; callers treat it as "no data this cycle".
//! Missing optional fields take defaults.

mod incidents;
mod organization;
mod profile;
mod roster;
mod status;

pub use incidents::{extract_incidents, extract_latest_incident};
pub use organization::{extract_member_count, extract_org_profile};
pub use profile::extract_user_profile;
pub use roster::{RosterPage, extract_roster_page};
pub use status::extract_status;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};

/// Parse a CSS selector, surfacing the selector text on failure.
fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Text content of the first match, whitespace-trimmed.
fn select_text(root: &ElementRef, selector: &Selector) -> Option<String> {
    root.select(selector).next().map(|el| {
        let text: String = el.text().collect();
        text.trim().to_string()
    })
}

/// Attribute of the first match.
fn select_attr(root: &ElementRef, selector: &Selector, attr: &str) -> Option<String> {
    root.select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
}

/// Parse a star rating from a CSS width style (`width: 60%` -> 3).
///
/// The page renders 0-5 stars as a fill percentage in 20% steps.
/// Anything malformed rates 0.
fn parse_stars(style: &str) -> u8 {
    let re = match Regex::new(r":\s*([0-9]+)\s*%") {
        Ok(re) => re,
        Err(_) => return 0,
    };
    re.captures(style)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|percent| (percent / 20).min(5) as u8)
        .unwrap_or(0)
}
