//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio::sync::Mutex;

use hazardwatch::engine::{Advisor, DisabledAdvisor};
use hazardwatch::error::{AlertError, Result};
use hazardwatch::feeds::{HotspotFeed, RainfallFeed, SeismicFeed};
use hazardwatch::history::{AlertHistory, MemoryAlertHistory};
use hazardwatch::models::{FireRegion, Hotspot};
use hazardwatch::notify::Notifier;
use hazardwatch::{
    Advisory, AdvisoryResult, AlertRecord, Collaborators, HazardEvent, HazardKind,
    ImpactAssessment, MonitoredLocation,
};

// ---

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 28, 6, 21, 30).unwrap()
}

/// M7.2 roughly 250 km due north of Bangkok.
pub fn strong_quake() -> HazardEvent {
    HazardEvent {
        id: "us7000pn9s".to_string(),
        magnitude: 7.2,
        epicenter_lat: 16.0063,
        epicenter_lon: 100.5018,
        depth_km: 10.0,
        occurred_at: Utc.with_ymd_and_hms(2025, 3, 28, 6, 20, 52).unwrap(),
        source_url: "https://earthquake.usgs.gov/earthquakes/eventpage/us7000pn9s".to_string(),
        place: "Central Myanmar".to_string(),
    }
}

/// M4.2 roughly 600 km from Bangkok: outside every relevance tier.
pub fn distant_small_quake() -> HazardEvent {
    HazardEvent {
        id: "us6000small".to_string(),
        magnitude: 4.2,
        epicenter_lat: 19.1563,
        epicenter_lon: 100.5018,
        depth_km: 35.0,
        occurred_at: Utc.with_ymd_and_hms(2025, 3, 28, 6, 15, 0).unwrap(),
        source_url: "https://earthquake.usgs.gov/earthquakes/eventpage/us6000small".to_string(),
        place: "Laos".to_string(),
    }
}

// --- feeds

#[derive(Default)]
pub struct StaticSeismicFeed {
    pub events: Vec<HazardEvent>,
    pub fail: bool,
}

#[async_trait]
impl SeismicFeed for StaticSeismicFeed {
    async fn fetch_events(&self, _: DateTime<Utc>, _: DateTime<Utc>) -> Result<Vec<HazardEvent>> {
        if self.fail {
            return Err(AlertError::upstream(HazardKind::Seismic, "status 503"));
        }
        Ok(self.events.clone())
    }
}

/// Hourly rainfall keyed by location name; unknown locations are dry.
#[derive(Default)]
pub struct StaticRainfallFeed {
    pub forecasts: HashMap<String, Vec<Option<f64>>>,
    pub fail: bool,
}

#[async_trait]
impl RainfallFeed for StaticRainfallFeed {
    async fn hourly_rainfall(&self, location: &MonitoredLocation) -> Result<Vec<Option<f64>>> {
        if self.fail {
            return Err(AlertError::upstream(HazardKind::Flood, "status 401"));
        }
        Ok(self.forecasts.get(&location.name).cloned().unwrap_or_default())
    }
}

/// Hotspots keyed by region code; unknown regions have none.
#[derive(Default)]
pub struct StaticHotspotFeed {
    pub hotspots: HashMap<String, Vec<Hotspot>>,
}

#[async_trait]
impl HotspotFeed for StaticHotspotFeed {
    async fn hotspots(&self, region: &FireRegion, _: NaiveDate) -> Result<Vec<Hotspot>> {
        Ok(self.hotspots.get(&region.code).cloned().unwrap_or_default())
    }
}

pub fn hotspots_in(district: &str, count: usize) -> Vec<Hotspot> {
    (0..count)
        .map(|_| Hotspot {
            district: district.to_string(),
        })
        .collect()
}

// --- advisor

pub struct FixedAdvisor(pub AdvisoryResult);

#[async_trait]
impl Advisor for FixedAdvisor {
    async fn assess(&self, _: &HazardEvent, _: &[ImpactAssessment]) -> Result<Advisory> {
        Ok(Advisory::Present(self.0.clone()))
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

// --- notifier

/// Records every delivered message; the first `failures` sends fail.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, bool)>>,
    failures: AtomicUsize,
}

impl RecordingNotifier {
    pub fn failing(failures: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(failures),
        }
    }

    pub async fn messages(&self) -> Vec<(String, bool)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str, high_priority: bool) -> Result<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AlertError::Transport("status 500".to_string()));
        }
        self.sent.lock().await.push((text.to_string(), high_priority));
        Ok(())
    }
}

// --- history

/// History whose reads always fail; appends succeed and are counted.
#[derive(Default)]
pub struct UnreadableHistory {
    pub appended: AtomicUsize,
}

#[async_trait]
impl AlertHistory for UnreadableHistory {
    async fn exists(&self, _: HazardKind, _: &str, _: DateTime<Utc>) -> Result<bool> {
        Err(AlertError::HistoryRead("connection refused".to_string()))
    }

    async fn append(&self, _: AlertRecord) -> Result<()> {
        self.appended.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// --- wiring

pub struct Harness {
    pub notifier: Arc<RecordingNotifier>,
    pub history: Arc<MemoryAlertHistory>,
    pub collab: Collaborators,
}

impl Harness {
    pub fn new(seismic: StaticSeismicFeed) -> Self {
        Self::with_notifier(seismic, RecordingNotifier::default())
    }

    pub fn with_notifier(seismic: StaticSeismicFeed, notifier: RecordingNotifier) -> Self {
        let notifier = Arc::new(notifier);
        let history = Arc::new(MemoryAlertHistory::default());
        let collab = Collaborators {
            seismic_feed: Arc::new(seismic),
            rainfall_feed: Arc::new(StaticRainfallFeed::default()),
            hotspot_feed: Arc::new(StaticHotspotFeed::default()),
            advisor: Arc::new(DisabledAdvisor),
            notifier: notifier.clone(),
            history: history.clone(),
        };
        Self {
            notifier,
            history,
            collab,
        }
    }
}
