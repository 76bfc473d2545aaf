//! Incident feed poller.
//!
//! Watches the newest feed entry only. A new guid is classified,
//! inserted idempotently into incident history, and emitted; an
//! unchanged guid produces nothing. The last-seen guid is restored from
//! the store at startup so restarts don't re-announce old incidents.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::extract;
use crate::fetch::HttpFetcher;
use crate::models::{Config, EngineEvent, IncidentRecord};
use crate::poll::MaintenanceWindow;
use crate::store::Store;

/// What one poll cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentTick {
    /// Inside the maintenance window; no fetch attempted
    Skipped,
    /// Feed empty or newest guid already seen
    Unchanged,
    /// A new incident was recorded and emitted
    New(IncidentRecord),
}

/// Periodic incident feed monitor.
pub struct IncidentPoller {
    fetcher: HttpFetcher,
    store: Arc<dyn Store>,
    events: mpsc::Sender<EngineEvent>,
    feed_url: String,
    interval: Duration,
    window: MaintenanceWindow,
    last_guid: Option<String>,
}

impl IncidentPoller {
    pub fn new(
        fetcher: HttpFetcher,
        store: Arc<dyn Store>,
        config: &Config,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<Self> {
        Ok(Self {
            fetcher,
            store,
            events,
            feed_url: config.endpoints.feed_url.clone(),
            interval: Duration::from_secs(config.poll.incident_interval_secs),
            window: MaintenanceWindow::from_config(&config.maintenance)?,
            last_guid: None,
        })
    }

    /// Run the poll loop until the token is cancelled.
    pub async fn run(mut self, token: CancellationToken) {
        self.last_guid = match self.store.last_incident_guid().await {
            Ok(guid) => guid,
            Err(e) => {
                log::warn!("Could not restore last incident guid: {e}");
                None
            }
        };

        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        log::info!(
            "Incident poller started ({}s interval)",
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    log::info!("Incident poller stopping");
                    return;
                }
                _ = timer.tick() => {
                    match self.tick(Utc::now()).await {
                        Ok(IncidentTick::New(incident)) => {
                            log::info!("New incident: {}", incident.title);
                        }
                        Ok(_) => {}
                        Err(e) => log::warn!("Incident tick failed, no update this cycle: {e}"),
                    }
                }
            }
        }
    }

    /// One poll cycle at the given instant.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<IncidentTick> {
        if self.window.contains(now) {
            log::debug!("Inside maintenance window; skipping incident check");
            return Ok(IncidentTick::Skipped);
        }

        let xml = self.fetcher.fetch(&self.feed_url).await?;
        let Some(incident) = extract::extract_latest_incident(&xml, now)? else {
            return Ok(IncidentTick::Unchanged);
        };

        self.apply(incident).await
    }

    /// Record a freshly extracted newest entry, emitting only when its
    /// guid is new.
    async fn apply(&mut self, incident: IncidentRecord) -> Result<IncidentTick> {
        if self.last_guid.as_deref() == Some(incident.guid.as_str()) {
            return Ok(IncidentTick::Unchanged);
        }

        // Duplicate guid from a racing poller or manual refresh is a
        // no-op, not an error.
        let inserted = self.store.insert_incident(&incident).await?;
        if !inserted {
            log::debug!("Incident {} already stored", incident.guid);
        }
        self.store.set_last_incident_guid(&incident.guid).await?;
        self.last_guid = Some(incident.guid.clone());

        let urgent = incident.severity().is_urgent();
        if self
            .events
            .send(EngineEvent::NewIncident {
                record: incident.clone(),
                urgent,
            })
            .await
            .is_err()
        {
            log::warn!("Event channel closed; dropping incident event");
        }

        Ok(IncidentTick::New(incident))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use chrono::TimeZone;

    fn make_incident(guid: &str, title: &str, status: &str) -> IncidentRecord {
        IncidentRecord {
            guid: guid.to_string(),
            title: title.to_string(),
            description: String::new(),
            status: status.to_string(),
            components: vec!["Persistent Universe".to_string()],
            link: String::new(),
            timestamp: Utc::now(),
        }
    }

    fn make_poller(
        dir: &tempfile::TempDir,
    ) -> (IncidentPoller, mpsc::Receiver<EngineEvent>) {
        let config = Config::default();
        let (tx, rx) = mpsc::channel(16);
        let fetcher =
            HttpFetcher::new(&config.fetcher, CancellationToken::new()).unwrap();
        let poller = IncidentPoller::new(
            fetcher,
            Arc::new(LocalStore::new(dir.path(), 100)),
            &config,
            tx,
        )
        .unwrap();
        (poller, rx)
    }

    #[tokio::test]
    async fn new_guid_is_stored_and_emitted_with_urgency() {
        let dir = tempfile::tempdir().unwrap();
        let (mut poller, mut rx) = make_poller(&dir);

        let incident = make_incident("X1", "Major PU outage", "major-outage");
        let tick = poller.apply(incident).await.unwrap();
        assert!(matches!(tick, IncidentTick::New(_)));

        match rx.try_recv().unwrap() {
            EngineEvent::NewIncident { record, urgent } => {
                assert_eq!(record.guid, "X1");
                assert_eq!(record.status, "major-outage");
                assert!(urgent);
            }
            other => panic!("unexpected event {other:?}"),
        }

        let stored = poller.store.recent_incidents(10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(
            poller.store.last_incident_guid().await.unwrap().as_deref(),
            Some("X1")
        );
    }

    #[tokio::test]
    async fn unchanged_guid_emits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut poller, mut rx) = make_poller(&dir);

        poller
            .apply(make_incident("X1", "Outage", "partial-outage"))
            .await
            .unwrap();
        let _ = rx.try_recv();

        let tick = poller
            .apply(make_incident("X1", "Outage", "partial-outage"))
            .await
            .unwrap();
        assert_eq!(tick, IncidentTick::Unchanged);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn duplicate_store_insert_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (mut poller, _rx) = make_poller(&dir);

        // Another writer (e.g. a manual refresh) already stored the
        // incident; the poller still hasn't seen the guid.
        let incident = make_incident("X2", "Degraded login", "degraded");
        poller.store.insert_incident(&incident).await.unwrap();

        let tick = poller.apply(incident).await.unwrap();
        assert!(matches!(tick, IncidentTick::New(_)));
        assert_eq!(poller.store.recent_incidents(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn maintenance_window_skips_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let (mut poller, _rx) = make_poller(&dir);
        poller.feed_url = "http://127.0.0.1:1/unreachable".to_string();

        let inside = Utc.with_ymd_and_hms(2024, 10, 26, 23, 30, 0).unwrap();
        let tick = poller.tick(inside).await.unwrap();
        assert_eq!(tick, IncidentTick::Skipped);
    }

    #[tokio::test]
    async fn non_major_incident_is_not_urgent() {
        let dir = tempfile::tempdir().unwrap();
        let (mut poller, mut rx) = make_poller(&dir);

        poller
            .apply(make_incident("X3", "Login slowness", "degraded"))
            .await
            .unwrap();

        match rx.try_recv().unwrap() {
            EngineEvent::NewIncident { urgent, .. } => assert!(!urgent),
            other => panic!("unexpected event {other:?}"),
        }
    }
}
