//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP fetch behavior
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// External endpoint locations
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Roster crawl behavior
    #[serde(default)]
    pub roster: RosterConfig,

    /// Periodic poller intervals
    #[serde(default)]
    pub poll: PollConfig,

    /// Daily maintenance window (UTC)
    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    /// Cache TTLs and capacity
    #[serde(default)]
    pub cache: CacheConfig,

    /// Rank hierarchy and reconciliation targets
    #[serde(default)]
    pub ranks: RankConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.fetcher.connect_timeout_secs == 0 {
            return Err(AppError::validation(
                "fetcher.connect_timeout_secs must be > 0",
            ));
        }
        if self.fetcher.max_attempts == 0 {
            return Err(AppError::validation("fetcher.max_attempts must be > 0"));
        }
        if self.roster.page_size == 0 {
            return Err(AppError::validation("roster.page_size must be > 0"));
        }
        if self.roster.max_pages == 0 {
            return Err(AppError::validation("roster.max_pages must be > 0"));
        }
        if self.poll.status_interval_secs == 0 || self.poll.incident_interval_secs == 0 {
            return Err(AppError::validation("poll intervals must be > 0"));
        }
        if self.maintenance.parse_start().is_none() {
            return Err(AppError::validation(
                "maintenance.start_utc must be HH:MM (24h)",
            ));
        }
        self.ranks.validate()
    }
}

/// HTTP fetch behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Total per-attempt timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum attempts per fetch (first try included)
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds
    #[serde(default = "defaults::backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Hard cap on backoff delay in milliseconds
    #[serde(default = "defaults::backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            connect_timeout_secs: defaults::connect_timeout(),
            max_attempts: defaults::max_attempts(),
            backoff_base_ms: defaults::backoff_base_ms(),
            backoff_max_ms: defaults::backoff_max_ms(),
        }
    }
}

/// External endpoint locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Base URL of the main site
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Status page URL (HTML)
    #[serde(default = "defaults::status_url")]
    pub status_url: String,

    /// Incident feed URL (RSS/XML)
    #[serde(default = "defaults::feed_url")]
    pub feed_url: String,
}

impl EndpointsConfig {
    /// Organization profile page URL.
    pub fn org_url(&self, sid: &str) -> String {
        format!("{}/orgs/{}", self.base_url, sid)
    }

    /// Paginated member-listing endpoint URL.
    pub fn roster_url(&self) -> String {
        format!("{}/api/orgs/getOrgMembers", self.base_url)
    }

    /// Organization search endpoint URL (member counts).
    pub fn org_search_url(&self) -> String {
        format!("{}/api/orgs/getOrgs", self.base_url)
    }

    /// Per-user profile page URL.
    pub fn citizen_url(&self, handle: &str) -> String {
        format!("{}/citizens/{}", self.base_url, handle)
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            status_url: defaults::status_url(),
            feed_url: defaults::feed_url(),
        }
    }
}

/// Roster crawl behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Organization short-code to sync
    #[serde(default = "defaults::org_sid")]
    pub org_sid: String,

    /// Records per roster page; a short page ends the crawl
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Upper bound on pages per crawl against runaway pagination
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,

    /// Fixed delay between page fetches in milliseconds
    #[serde(default = "defaults::page_delay_ms")]
    pub page_delay_ms: u64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            org_sid: defaults::org_sid(),
            page_size: defaults::page_size(),
            max_pages: defaults::max_pages(),
            page_delay_ms: defaults::page_delay_ms(),
        }
    }
}

/// Periodic poller intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Status poll interval in seconds
    #[serde(default = "defaults::poll_interval")]
    pub status_interval_secs: u64,

    /// Incident poll interval in seconds
    #[serde(default = "defaults::poll_interval")]
    pub incident_interval_secs: u64,

    /// Bounded status history length
    #[serde(default = "defaults::history_limit")]
    pub history_limit: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: defaults::poll_interval(),
            incident_interval_secs: defaults::poll_interval(),
            history_limit: defaults::history_limit(),
        }
    }
}

/// Daily maintenance window settings (UTC).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Window start, "HH:MM" 24-hour UTC
    #[serde(default = "defaults::maintenance_start")]
    pub start_utc: String,

    /// Window duration in hours (may wrap past midnight)
    #[serde(default = "defaults::maintenance_duration")]
    pub duration_hours: u32,
}

impl MaintenanceConfig {
    /// Parse `start_utc` into a time of day, `None` when malformed.
    pub fn parse_start(&self) -> Option<chrono::NaiveTime> {
        chrono::NaiveTime::parse_from_str(&self.start_utc, "%H:%M").ok()
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            start_utc: defaults::maintenance_start(),
            duration_hours: defaults::maintenance_duration(),
        }
    }
}

/// Cache TTLs and capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum cached entries
    #[serde(default = "defaults::cache_capacity")]
    pub capacity: u64,

    /// TTL for status snapshots in seconds
    #[serde(default = "defaults::status_ttl")]
    pub status_ttl_secs: u64,

    /// TTL for member/user data in seconds
    #[serde(default = "defaults::member_ttl")]
    pub member_ttl_secs: u64,

    /// TTL for organization data (profile, full roster) in seconds
    #[serde(default = "defaults::org_ttl")]
    pub org_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::cache_capacity(),
            status_ttl_secs: defaults::status_ttl(),
            member_ttl_secs: defaults::member_ttl(),
            org_ttl_secs: defaults::org_ttl(),
        }
    }
}

/// Rank hierarchy and reconciliation targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankConfig {
    /// Rank labels ordered lowest to highest
    #[serde(default = "defaults::hierarchy")]
    pub hierarchy: Vec<String>,

    /// Highest rank an affiliate may hold
    #[serde(default = "defaults::max_affiliate_rank")]
    pub max_affiliate_rank: String,

    /// Rank affiliates above the cap are demoted to
    #[serde(default = "defaults::default_demotion_rank")]
    pub default_demotion_rank: String,

    /// Rank for members not found on the roster
    #[serde(default = "defaults::unaffiliated_rank")]
    pub unaffiliated_rank: String,
}

impl RankConfig {
    /// Position of a rank in the hierarchy, `None` when unknown.
    pub fn index_of(&self, rank: &str) -> Option<usize> {
        self.hierarchy.iter().position(|r| r == rank)
    }

    fn validate(&self) -> Result<()> {
        if self.hierarchy.is_empty() {
            return Err(AppError::validation("ranks.hierarchy is empty"));
        }
        for (field, rank) in [
            ("ranks.max_affiliate_rank", &self.max_affiliate_rank),
            ("ranks.default_demotion_rank", &self.default_demotion_rank),
            ("ranks.unaffiliated_rank", &self.unaffiliated_rank),
        ] {
            if self.index_of(rank).is_none() {
                return Err(AppError::validation(format!(
                    "{field} '{rank}' is not in ranks.hierarchy"
                )));
            }
        }
        Ok(())
    }
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            hierarchy: defaults::hierarchy(),
            max_affiliate_rank: defaults::max_affiliate_rank(),
            default_demotion_rank: defaults::default_demotion_rank(),
            unaffiliated_rank: defaults::unaffiliated_rank(),
        }
    }
}

mod defaults {
    // Fetcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; orgwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn connect_timeout() -> u64 {
        10
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn backoff_base_ms() -> u64 {
        1000
    }
    pub fn backoff_max_ms() -> u64 {
        30_000
    }

    // Endpoint defaults
    pub fn base_url() -> String {
        "https://robertsspaceindustries.com".into()
    }
    pub fn status_url() -> String {
        "https://status.robertsspaceindustries.com/".into()
    }
    pub fn feed_url() -> String {
        "https://status.robertsspaceindustries.com/index.xml".into()
    }

    // Roster defaults
    pub fn org_sid() -> String {
        "DRAXON".into()
    }
    pub fn page_size() -> usize {
        32
    }
    pub fn max_pages() -> usize {
        64
    }
    pub fn page_delay_ms() -> u64 {
        1000
    }

    // Poll defaults
    pub fn poll_interval() -> u64 {
        300
    }
    pub fn history_limit() -> usize {
        100
    }

    // Maintenance defaults
    pub fn maintenance_start() -> String {
        "22:00".into()
    }
    pub fn maintenance_duration() -> u32 {
        3
    }

    // Cache defaults
    pub fn cache_capacity() -> u64 {
        4096
    }
    pub fn status_ttl() -> u64 {
        300
    }
    pub fn member_ttl() -> u64 {
        3600
    }
    pub fn org_ttl() -> u64 {
        7200
    }

    // Rank defaults
    pub fn hierarchy() -> Vec<String> {
        vec![
            "Screening".into(),
            "Applicant".into(),
            "Employee".into(),
            "Team Leader".into(),
            "Executive".into(),
            "Chairman".into(),
            "Magnate".into(),
        ]
    }
    pub fn max_affiliate_rank() -> String {
        "Team Leader".into()
    }
    pub fn default_demotion_rank() -> String {
        "Employee".into()
    }
    pub fn unaffiliated_rank() -> String {
        "Screening".into()
    }
}
