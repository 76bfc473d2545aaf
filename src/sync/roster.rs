//! Paginated roster crawl.
//!
//! Walks the member-listing endpoint page by page through the cache,
//! stopping on the first short page. A fixed delay between page fetches
//! keeps the crawl polite; it is not adaptive.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::cache::{Cache, keys};
use crate::error::Result;
use crate::extract;
use crate::fetch::HttpFetcher;
use crate::models::{
    CacheConfig, EndpointsConfig, EngineEvent, MemberRecord, OrganizationProfile, RosterConfig,
    UserProfile,
};

/// Service for syncing an organization's roster and profile data.
pub struct OrgRosterSync {
    fetcher: HttpFetcher,
    cache: Cache,
    endpoints: EndpointsConfig,
    config: RosterConfig,
    member_ttl: Duration,
    org_ttl: Duration,
    events: mpsc::Sender<EngineEvent>,
}

impl OrgRosterSync {
    pub fn new(
        fetcher: HttpFetcher,
        cache: Cache,
        endpoints: EndpointsConfig,
        config: RosterConfig,
        cache_config: &CacheConfig,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            endpoints,
            config,
            member_ttl: Duration::from_secs(cache_config.member_ttl_secs),
            org_ttl: Duration::from_secs(cache_config.org_ttl_secs),
            events,
        }
    }

    /// Sync the configured organization's roster.
    pub async fn sync(&self) -> Result<Vec<MemberRecord>> {
        let sid = self.config.org_sid.clone();
        self.sync_org(&sid).await
    }

    /// Crawl the full roster for an organization.
    ///
    /// Pages are fetched sequentially from page 1 and the crawl ends on
    /// the first short page (or at the configured page cap against
    /// runaway pagination). The result is de-duplicated by handle and
    /// cached whole under a roster-level key.
    pub async fn sync_org(&self, sid: &str) -> Result<Vec<MemberRecord>> {
        let roster_key = keys::roster(sid);
        if let Some(cached) = self.cache.get_json::<Vec<MemberRecord>>(&roster_key).await {
            log::debug!("Roster for {sid} served from cache ({} members)", cached.len());
            self.emit(EngineEvent::RosterSynced(cached.clone())).await;
            return Ok(cached);
        }

        let delay = Duration::from_millis(self.config.page_delay_ms);
        let mut seen = HashSet::new();
        let mut members = Vec::new();

        for page in 1..=self.config.max_pages {
            if page > 1 && delay.as_millis() > 0 {
                tokio::time::sleep(delay).await;
            }

            let result = self.fetch_page(sid, page).await?;
            for member in result.members {
                if seen.insert(member.key()) {
                    members.push(member);
                }
            }

            if !result.full_page {
                break;
            }
            if page == self.config.max_pages {
                log::warn!(
                    "Roster crawl for {sid} hit the {}-page cap; result may be truncated",
                    self.config.max_pages
                );
            }
        }

        log::info!("Synced {} members for {sid}", members.len());
        self.cache
            .set_json(&roster_key, &members, self.org_ttl)
            .await;
        self.emit(EngineEvent::RosterSynced(members.clone())).await;

        Ok(members)
    }

    /// Fetch and extract one roster page, via the per-page cache.
    async fn fetch_page(&self, sid: &str, page: usize) -> Result<extract::RosterPage> {
        let page_key = keys::roster_page(sid, page);
        if let Some(members) = self
            .cache
            .get_json::<Vec<MemberRecord>>(&page_key)
            .await
        {
            let full_page = members.len() == self.config.page_size;
            return Ok(extract::RosterPage { members, full_page });
        }

        let body = serde_json::json!({
            "symbol": sid,
            "search": "",
            "pagesize": self.config.page_size,
            "page": page,
        });
        let payload = self
            .fetcher
            .fetch_with_body(&self.endpoints.roster_url(), &body)
            .await?;
        let result =
            extract::extract_roster_page(&payload, self.config.page_size, &self.endpoints.base_url)?;

        self.cache
            .set_json(&page_key, &result.members, self.member_ttl)
            .await;
        Ok(result)
    }

    /// Fetch an organization's profile, enriched with the member count
    /// from the search endpoint. Cached with the org TTL.
    pub async fn org_profile(&self, sid: &str) -> Result<OrganizationProfile> {
        let cache_key = keys::org(sid);
        if let Some(profile) = self.cache.get_json::<OrganizationProfile>(&cache_key).await {
            return Ok(profile);
        }

        let html = self.fetcher.fetch(&self.endpoints.org_url(sid)).await?;
        let mut profile = extract::extract_org_profile(&html, sid, &self.endpoints.base_url)?;

        // The profile page itself doesn't carry a member count; the
        // search endpoint does. Losing it is not worth failing the fetch.
        let search_body = serde_json::json!({
            "search": sid,
            "pagesize": 1,
            "page": 1,
        });
        match self
            .fetcher
            .fetch_with_body(&self.endpoints.org_search_url(), &search_body)
            .await
        {
            Ok(payload) => {
                let fragment = serde_json::from_str::<serde_json::Value>(&payload)
                    .ok()
                    .and_then(|envelope| {
                        envelope
                            .get("data")
                            .and_then(|d| d.get("html"))
                            .and_then(|h| h.as_str())
                            .map(|s| s.to_string())
                    });
                if let Some(fragment) = fragment {
                    if let Ok(Some(count)) = extract::extract_member_count(&fragment, sid) {
                        profile.member_count = count;
                    }
                }
            }
            Err(e) => log::warn!("Member count lookup failed for {sid}: {e}"),
        }

        self.cache
            .set_json(&cache_key, &profile, self.org_ttl)
            .await;
        Ok(profile)
    }

    /// Fetch a user's profile with org affiliations. Cached with the
    /// member TTL, keyed case-insensitively.
    pub async fn user_profile(&self, handle: &str) -> Result<UserProfile> {
        let cache_key = keys::user(handle);
        if let Some(profile) = self.cache.get_json::<UserProfile>(&cache_key).await {
            return Ok(profile);
        }

        let html = self
            .fetcher
            .fetch(&self.endpoints.citizen_url(handle))
            .await?;
        let profile = extract::extract_user_profile(&html, handle, &self.endpoints.base_url)?;

        self.cache
            .set_json(&cache_key, &profile, self.member_ttl)
            .await;
        Ok(profile)
    }

    async fn emit(&self, event: EngineEvent) {
        if self.events.send(event).await.is_err() {
            log::warn!("Event channel closed; dropping roster event");
        }
    }
}
