//! Platform status poller.
//!
//! Each tick moves through fetch -> diff -> notify: inside the
//! maintenance window the fetch is skipped and an all-maintenance
//! snapshot takes its place. Only a snapshot that differs from the
//! last-known one is persisted and emitted, so unchanged input produces
//! nothing.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cache::{Cache, keys};
use crate::error::Result;
use crate::extract;
use crate::fetch::HttpFetcher;
use crate::models::{CacheConfig, Config, EngineEvent, StatusSnapshot, SystemStatus};
use crate::poll::MaintenanceWindow;
use crate::store::Store;

/// What one poll cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTick {
    /// Snapshot matches the last-known one; nothing persisted or emitted
    Unchanged,
    /// At least one system differs; snapshot persisted and emitted
    Changed(StatusSnapshot),
}

/// Periodic status page monitor.
pub struct StatusPoller {
    fetcher: HttpFetcher,
    cache: Cache,
    store: Arc<dyn Store>,
    events: mpsc::Sender<EngineEvent>,
    status_url: String,
    interval: Duration,
    window: MaintenanceWindow,
    status_ttl: Duration,
    last: Option<StatusSnapshot>,
}

impl StatusPoller {
    pub fn new(
        fetcher: HttpFetcher,
        cache: Cache,
        store: Arc<dyn Store>,
        config: &Config,
        cache_config: &CacheConfig,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<Self> {
        Ok(Self {
            fetcher,
            cache,
            store,
            events,
            status_url: config.endpoints.status_url.clone(),
            interval: Duration::from_secs(config.poll.status_interval_secs),
            window: MaintenanceWindow::from_config(&config.maintenance)?,
            status_ttl: Duration::from_secs(cache_config.status_ttl_secs),
            last: None,
        })
    }

    /// Run the poll loop until the token is cancelled.
    ///
    /// Individual tick failures are logged and the loop continues on the
    /// next interval; a bad cycle never terminates the poller.
    pub async fn run(mut self, token: CancellationToken) {
        self.last = match self.store.load_status().await {
            Ok(last) => last,
            Err(e) => {
                log::warn!("Could not restore last status snapshot: {e}");
                None
            }
        };

        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        log::info!("Status poller started ({}s interval)", self.interval.as_secs());

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    log::info!("Status poller stopping");
                    return;
                }
                _ = timer.tick() => {
                    match self.tick(Utc::now()).await {
                        Ok(StatusTick::Changed(snapshot)) => {
                            log::info!("Status changed: {:?}", snapshot.systems);
                        }
                        Ok(StatusTick::Unchanged) => {}
                        Err(e) => log::warn!("Status tick failed, no update this cycle: {e}"),
                    }
                }
            }
        }
    }

    /// One poll cycle at the given instant.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<StatusTick> {
        let snapshot = if self.window.contains(now) {
            log::debug!("Inside maintenance window; skipping status fetch");
            StatusSnapshot::uniform(SystemStatus::Maintenance, now)
        } else {
            let html = self.fetcher.fetch(&self.status_url).await?;
            extract::extract_status(&html, now)?
        };

        self.apply(snapshot).await
    }

    /// Diff a fresh snapshot against the last-known one, persisting and
    /// emitting only on change.
    async fn apply(&mut self, snapshot: StatusSnapshot) -> Result<StatusTick> {
        let changed = match &self.last {
            Some(last) => snapshot.differs_from(last),
            None => true,
        };
        if !changed {
            return Ok(StatusTick::Unchanged);
        }

        self.store.save_status(&snapshot).await?;
        self.cache
            .set_json(&keys::status(), &snapshot, self.status_ttl)
            .await;
        if self
            .events
            .send(EngineEvent::StatusChanged(snapshot.clone()))
            .await
            .is_err()
        {
            log::warn!("Event channel closed; dropping status event");
        }

        self.last = Some(snapshot.clone());
        Ok(StatusTick::Changed(snapshot))
    }

    /// One-shot status check for on-demand callers: maintenance window
    /// first, then cache, then a live fetch. Emits nothing.
    pub async fn current_status(&self, now: DateTime<Utc>) -> Result<StatusSnapshot> {
        if self.window.contains(now) {
            return Ok(StatusSnapshot::uniform(SystemStatus::Maintenance, now));
        }
        if let Some(snapshot) = self.cache.get_json::<StatusSnapshot>(&keys::status()).await {
            return Ok(snapshot);
        }

        let html = self.fetcher.fetch(&self.status_url).await?;
        let snapshot = extract::extract_status(&html, now)?;
        self.cache
            .set_json(&keys::status(), &snapshot, self.status_ttl)
            .await;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use chrono::TimeZone;

    const STATUS_PAGE: &str = r#"
        <div class="component">
          <span class="name">Platform</span>
          <span class="component-status" data-status="operational">Up</span>
        </div>
        <div class="component">
          <span class="name">Persistent Universe</span>
          <span class="component-status" data-status="operational">Up</span>
        </div>
        <div class="component">
          <span class="name">Arena Commander</span>
          <span class="component-status" data-status="operational">Up</span>
        </div>
    "#;

    fn make_poller(
        dir: &tempfile::TempDir,
    ) -> (StatusPoller, mpsc::Receiver<EngineEvent>) {
        let config = Config::default();
        let (tx, rx) = mpsc::channel(16);
        let fetcher =
            HttpFetcher::new(&config.fetcher, CancellationToken::new()).unwrap();
        let poller = StatusPoller::new(
            fetcher,
            Cache::new(&config.cache),
            Arc::new(LocalStore::new(dir.path(), 100)),
            &config,
            &config.cache,
            tx,
        )
        .unwrap();
        (poller, rx)
    }

    fn outside_window() -> DateTime<Utc> {
        // 06:00 UTC, well clear of the default 22:00+3h window
        Utc.with_ymd_and_hms(2024, 10, 26, 6, 0, 0).unwrap()
    }

    fn inside_window() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 26, 23, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn identical_content_emits_exactly_one_event() {
        let dir = tempfile::tempdir().unwrap();
        let (mut poller, mut rx) = make_poller(&dir);
        let now = outside_window();

        let snapshot = extract::extract_status(STATUS_PAGE, now).unwrap();
        let first = poller.apply(snapshot.clone()).await.unwrap();
        assert!(matches!(first, StatusTick::Changed(_)));
        assert!(matches!(
            rx.try_recv(),
            Ok(EngineEvent::StatusChanged(_))
        ));

        let second = poller.apply(snapshot).await.unwrap();
        assert_eq!(second, StatusTick::Unchanged);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn maintenance_window_tick_makes_no_network_call() {
        let dir = tempfile::tempdir().unwrap();
        let (mut poller, _rx) = make_poller(&dir);
        // The default endpoints point at real hosts; a fetch attempt
        // would not produce a clean all-maintenance snapshot.
        poller.status_url = "http://127.0.0.1:1/unreachable".to_string();

        let tick = poller.tick(inside_window()).await.unwrap();
        let StatusTick::Changed(snapshot) = tick else {
            panic!("first maintenance tick should report a change");
        };
        assert!(
            snapshot
                .systems
                .values()
                .all(|s| *s == SystemStatus::Maintenance)
        );
    }

    #[tokio::test]
    async fn changed_snapshot_is_persisted_with_history() {
        let dir = tempfile::tempdir().unwrap();
        let (mut poller, _rx) = make_poller(&dir);
        let store = Arc::clone(&poller.store);

        let snapshot = extract::extract_status(STATUS_PAGE, outside_window()).unwrap();
        poller.apply(snapshot).await.unwrap();

        assert!(store.load_status().await.unwrap().is_some());
        assert_eq!(store.status_history(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn restored_snapshot_suppresses_duplicate_event() {
        let dir = tempfile::tempdir().unwrap();
        let now = outside_window();

        {
            let (mut poller, _rx) = make_poller(&dir);
            let snapshot = extract::extract_status(STATUS_PAGE, now).unwrap();
            poller.apply(snapshot).await.unwrap();
        }

        // A fresh poller restores last-known state from the store.
        let (mut poller, mut rx) = make_poller(&dir);
        poller.last = poller.store.load_status().await.unwrap();

        let snapshot = extract::extract_status(STATUS_PAGE, now).unwrap();
        let tick = poller.apply(snapshot).await.unwrap();
        assert_eq!(tick, StatusTick::Unchanged);
        assert!(rx.try_recv().is_err());
    }
}
