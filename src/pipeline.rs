//! Per-kind evaluation cycles.
//!
//! A cycle fetches everything it needs from its feed first, then evaluates,
//! renders, sends and records alerts one at a time. Feed failures abort the
//! cycle before any alert is evaluated; a failure while handling one event
//! is logged and the remaining events are still processed. Only history read
//! failures (when failing closed) abort a cycle half way.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::engine::{self, Advisor};
use crate::error::Result;
use crate::feeds::{HotspotFeed, RainfallFeed, SeismicFeed};
use crate::geo;
use crate::history::AlertHistory;
use crate::models::{Advisory, AlertRecord, HazardEvent, HazardKind};
use crate::notify::Notifier;

// ---

/// External collaborators a [`Pipeline`] talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub seismic_feed: Arc<dyn SeismicFeed>,
    pub rainfall_feed: Arc<dyn RainfallFeed>,
    pub hotspot_feed: Arc<dyn HotspotFeed>,
    pub advisor: Arc<dyn Advisor>,
    pub notifier: Arc<dyn Notifier>,
    pub history: Arc<dyn AlertHistory>,
}

/// Summary of one cycle, returned by the trigger endpoint and logged by the
/// scheduler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    // ---
    pub kind: HazardKind,
    /// Records received from the feed: catalog events for seismic, one
    /// forecast per location for flood, hotspot detections for fire.
    pub fetched: usize,
    /// Events or assessments that crossed the relevance/threshold rules.
    pub evaluated: usize,
    pub sent: usize,
    pub duplicates: usize,
    pub suppressed: usize,
    pub failed: usize,
}

impl CycleReport {
    fn new(kind: HazardKind) -> Self {
        Self {
            kind,
            fetched: 0,
            evaluated: 0,
            sent: 0,
            duplicates: 0,
            suppressed: 0,
            failed: 0,
        }
    }

    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Sent => self.sent += 1,
            Outcome::Duplicate => self.duplicates += 1,
            Outcome::Suppressed => self.suppressed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Sent,
    Duplicate,
    Suppressed,
}

/// One in-process lock per kind so a kind's cycles never overlap, even when
/// a manual trigger arrives during a scheduled run.
#[derive(Debug, Default)]
struct CycleLocks {
    seismic: Mutex<()>,
    flood: Mutex<()>,
    fire: Mutex<()>,
}

impl CycleLocks {
    fn for_kind(&self, kind: HazardKind) -> &Mutex<()> {
        match kind {
            HazardKind::Seismic => &self.seismic,
            HazardKind::Flood => &self.flood,
            HazardKind::Fire => &self.fire,
        }
    }
}

pub struct Pipeline {
    // ---
    cfg: EngineConfig,
    collab: Collaborators,
    seismic_lookback: Duration,
    advisory_timeout: StdDuration,
    locks: CycleLocks,
}

impl Pipeline {
    pub fn new(cfg: EngineConfig, collab: Collaborators) -> Self {
        Self {
            cfg,
            collab,
            seismic_lookback: Duration::minutes(15),
            advisory_timeout: StdDuration::from_secs(10),
            locks: CycleLocks::default(),
        }
    }

    /// How far back each seismic cycle asks the catalog for events.
    pub fn with_seismic_lookback(mut self, lookback: Duration) -> Self {
        self.seismic_lookback = lookback;
        self
    }

    pub fn with_advisory_timeout(mut self, timeout: StdDuration) -> Self {
        self.advisory_timeout = timeout;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Run one cycle of `kind` evaluated at the current instant.
    pub async fn run_cycle(&self, kind: HazardKind) -> Result<CycleReport> {
        self.run_cycle_at(kind, Utc::now()).await
    }

    /// Run one cycle of `kind` as if the current instant were `now`.
    #[tracing::instrument(skip_all, fields(kind = %kind))]
    pub async fn run_cycle_at(&self, kind: HazardKind, now: DateTime<Utc>) -> Result<CycleReport> {
        // ---
        let _guard = self.locks.for_kind(kind).lock().await;
        info!("Starting {} cycle", kind);

        let report = match kind {
            HazardKind::Seismic => self.seismic_cycle(now).await,
            HazardKind::Flood => self.flood_cycle(now).await,
            HazardKind::Fire => self.fire_cycle(now).await,
        };

        match &report {
            Ok(r) => info!(
                "{} cycle complete: fetched={} evaluated={} sent={} duplicates={} suppressed={} failed={}",
                kind, r.fetched, r.evaluated, r.sent, r.duplicates, r.suppressed, r.failed
            ),
            Err(e) => error!("{} cycle aborted: {}", kind, e),
        }
        report
    }

    // --- seismic

    async fn seismic_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        // ---
        let mut report = CycleReport::new(HazardKind::Seismic);

        let events = self
            .collab
            .seismic_feed
            .fetch_events(now - self.seismic_lookback, now)
            .await?;
        report.fetched = events.len();

        let relevant = engine::filter_relevant(events, &self.cfg.seismic);
        report.evaluated = relevant.len();
        info!(
            "Found {} significant events that may affect {}",
            relevant.len(),
            self.cfg.seismic.reference.name
        );

        for event in &relevant {
            match self.process_seismic_event(event, now).await {
                Ok(outcome) => report.count(outcome),
                Err(e) if e.is_cycle_fatal() => return Err(e),
                Err(e) => {
                    error!(
                        kind = "seismic",
                        event_id = %event.id,
                        "event processing failed, left eligible for retry: {}",
                        e
                    );
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn process_seismic_event(&self, event: &HazardEvent, now: DateTime<Utc>) -> Result<Outcome> {
        // ---
        let kind = HazardKind::Seismic;
        let novel = engine::is_novel(
            self.collab.history.as_ref(),
            kind,
            &event.id,
            self.cfg.cooldowns.for_kind(kind),
            now,
            self.cfg.history_fail_open,
        )
        .await?;
        if !novel {
            return Ok(Outcome::Duplicate);
        }

        let assessments = engine::assess_impacts(event, &self.cfg.seismic, now);
        let decision = engine::decide(event, assessments, &self.cfg.seismic);
        let advisory = engine::consult(
            self.collab.advisor.as_ref(),
            event,
            &decision.assessments,
            self.advisory_timeout,
        )
        .await;
        let decision = engine::apply_advisory(decision, &advisory);

        if decision.suppressed {
            info!(
                kind = "seismic",
                event_id = %event.id,
                "Skipping alert for M{} at {} based on advisory analysis",
                event.magnitude,
                event.place
            );
            return Ok(Outcome::Suppressed);
        }

        let text = engine::render_seismic(
            event,
            &decision,
            &self.cfg.seismic,
            self.cfg.utc_offset,
            now,
        )?;

        let reference = &self.cfg.seismic.reference;
        let distance_from_reference = geo::distance_km(
            event.epicenter_lat,
            event.epicenter_lon,
            reference.latitude,
            reference.longitude,
        )
        .round();
        let advisory_json = match &advisory {
            Advisory::Present(result) => serde_json::to_value(result).unwrap_or_default(),
            Advisory::Absent => serde_json::Value::Null,
        };
        let payload = serde_json::json!({
            "event_id": event.id,
            "magnitude": event.magnitude,
            "place": event.place,
            "depth_km": event.depth_km,
            "occurred_at": event.occurred_at,
            "distance_from_reference_km": distance_from_reference,
            "alert_level": decision.alert_level,
            "is_high_priority": decision.is_high_priority,
            "assessments": decision.assessments,
            "advisory": advisory_json,
        });

        self.deliver(kind, &event.id, &text, decision.is_high_priority, payload, now)
            .await?;
        info!(
            kind = "seismic",
            event_id = %event.id,
            "Sent {} alert for M{} at {} ({} km from {})",
            decision.alert_level.label(),
            event.magnitude,
            event.place,
            distance_from_reference,
            reference.name
        );
        Ok(Outcome::Sent)
    }

    // --- flood

    async fn flood_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        // ---
        let kind = HazardKind::Flood;
        let mut report = CycleReport::new(kind);

        let mut forecasts = Vec::with_capacity(self.cfg.flood.locations.len());
        for location in &self.cfg.flood.locations {
            let hours = self.collab.rainfall_feed.hourly_rainfall(location).await?;
            forecasts.push((location, hours));
        }
        report.fetched = forecasts.len();

        for (location, hours) in forecasts {
            let Some(assessment) = engine::check_rainfall(location, &hours, &self.cfg.flood) else {
                debug!(kind = "flood", key = %location.name, "no heavy rain forecast");
                continue;
            };
            report.evaluated += 1;

            let key = assessment.location.clone();
            let result = self
                .deliver_if_novel(kind, &key, now, || {
                    let text = engine::render_flood(&assessment, &self.cfg.flood);
                    let payload = serde_json::json!({
                        "location": assessment.location,
                        "heavy_rain_hours": assessment.heavy_rain_hours,
                        "max_rainfall_mm": assessment.max_rainfall_mm,
                    });
                    (text, payload)
                })
                .await;
            self.tally(&mut report, kind, &key, result)?;
        }
        Ok(report)
    }

    // --- fire

    async fn fire_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        // ---
        let kind = HazardKind::Fire;
        let mut report = CycleReport::new(kind);
        let today = now.with_timezone(&self.cfg.utc_offset).date_naive();

        let mut detections = Vec::with_capacity(self.cfg.fire.regions.len());
        for region in &self.cfg.fire.regions {
            let hotspots = self.collab.hotspot_feed.hotspots(region, today).await?;
            report.fetched += hotspots.len();
            detections.push((region, hotspots));
        }

        for (region, hotspots) in detections {
            for assessment in engine::check_hotspots(region, today, &hotspots, &self.cfg.fire) {
                report.evaluated += 1;

                let key = assessment.dedup_key();
                let result = self
                    .deliver_if_novel(kind, &key, now, || {
                        let text = engine::render_fire(&assessment);
                        let payload = serde_json::json!({
                            "date": assessment.date,
                            "region": assessment.region,
                            "district": assessment.district,
                            "hotspot_count": assessment.hotspot_count,
                            "affected_area_km2": assessment.affected_area_km2,
                        });
                        (text, payload)
                    })
                    .await;
                self.tally(&mut report, kind, &key, result)?;
            }
        }
        Ok(report)
    }

    // --- shared

    /// Check novelty, then render with `build` and deliver.
    async fn deliver_if_novel<F>(
        &self,
        kind: HazardKind,
        key: &str,
        now: DateTime<Utc>,
        build: F,
    ) -> Result<Outcome>
    where
        F: FnOnce() -> (String, serde_json::Value),
    {
        // ---
        let novel = engine::is_novel(
            self.collab.history.as_ref(),
            kind,
            key,
            self.cfg.cooldowns.for_kind(kind),
            now,
            self.cfg.history_fail_open,
        )
        .await?;
        if !novel {
            info!(%kind, key, "Already alerted within cooldown, skipping");
            return Ok(Outcome::Duplicate);
        }

        let (text, payload) = build();
        self.deliver(kind, key, &text, false, payload, now).await?;
        info!(%kind, key, "Sent {} alert", kind);
        Ok(Outcome::Sent)
    }

    /// Send `text` and record it. A failed send is not recorded; the caller
    /// logs it with the event context.
    async fn deliver(
        &self,
        kind: HazardKind,
        key: &str,
        text: &str,
        high_priority: bool,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<()> {
        // ---
        self.collab.notifier.send(text, high_priority).await?;
        let record = AlertRecord::new(kind, key, payload, now);
        engine::record_sent(self.collab.history.as_ref(), record).await;
        Ok(())
    }

    fn tally(
        &self,
        report: &mut CycleReport,
        kind: HazardKind,
        key: &str,
        result: Result<Outcome>,
    ) -> Result<()> {
        // ---
        match result {
            Ok(outcome) => report.count(outcome),
            Err(e) if e.is_cycle_fatal() => return Err(e),
            Err(e) => {
                error!(%kind, key, "alert processing failed, left eligible for retry: {}", e);
                report.failed += 1;
            }
        }
        Ok(())
    }
}
