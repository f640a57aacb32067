mod common;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Duration;
use tokio_test::{assert_err, assert_ok};

use hazardwatch::models::SuggestedLevel;
use hazardwatch::{AdvisoryResult, AlertError, EngineConfig, HazardKind, Pipeline};

use common::*;

// ---

fn pipeline(collab: hazardwatch::Collaborators) -> Pipeline {
    Pipeline::new(EngineConfig::default(), collab)
}

#[tokio::test]
async fn strong_nearby_quake_sends_one_emergency_alert() {
    // ---
    let h = Harness::new(StaticSeismicFeed {
        events: vec![strong_quake(), distant_small_quake()],
        fail: false,
    });
    let p = pipeline(h.collab.clone());

    let report = assert_ok!(p.run_cycle_at(HazardKind::Seismic, now()).await);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.sent, 1);

    let messages = h.notifier.messages().await;
    assert_eq!(messages.len(), 1);
    let (text, high_priority) = &messages[0];
    assert!(text.starts_with("🚨 Emergency: Earthquake 🚨"), "{text}");
    assert!(text.contains("Central Myanmar"));
    assert!(*high_priority);

    let records = h.history.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].hazard_kind, HazardKind::Seismic);
    assert_eq!(records[0].dedup_key, "us7000pn9s");
    assert_eq!(records[0].payload["alert_level"], "Emergency");
}

#[tokio::test]
async fn repeated_cycles_do_not_resend() {
    // ---
    let h = Harness::new(StaticSeismicFeed {
        events: vec![strong_quake()],
        fail: false,
    });
    let p = pipeline(h.collab.clone());

    assert_ok!(p.run_cycle_at(HazardKind::Seismic, now()).await);
    let second = assert_ok!(
        p.run_cycle_at(HazardKind::Seismic, now() + Duration::minutes(1))
            .await
    );

    assert_eq!(second.sent, 0);
    assert_eq!(second.duplicates, 1);
    assert_eq!(h.notifier.messages().await.len(), 1);
    assert_eq!(h.history.len().await, 1);
}

#[tokio::test]
async fn quake_alerts_again_after_cooldown() {
    // ---
    let h = Harness::new(StaticSeismicFeed {
        events: vec![strong_quake()],
        fail: false,
    });
    let p = pipeline(h.collab.clone());

    assert_ok!(p.run_cycle_at(HazardKind::Seismic, now()).await);
    let later = assert_ok!(
        p.run_cycle_at(HazardKind::Seismic, now() + Duration::hours(3))
            .await
    );

    assert_eq!(later.sent, 1);
    assert_eq!(h.history.len().await, 2);
}

#[tokio::test]
async fn advisory_veto_suppresses_without_recording() {
    // ---
    let mut h = Harness::new(StaticSeismicFeed {
        events: vec![strong_quake()],
        fail: false,
    });
    h.collab.advisor = Arc::new(FixedAdvisor(AdvisoryResult {
        confidence: 0.3,
        should_alert: false,
        suggested_level: SuggestedLevel::Downgrade,
        additional_context: None,
    }));
    let p = pipeline(h.collab.clone());

    let report = assert_ok!(p.run_cycle_at(HazardKind::Seismic, now()).await);
    assert_eq!(report.suppressed, 1);
    assert_eq!(report.sent, 0);
    assert!(h.notifier.messages().await.is_empty());
    assert!(h.history.is_empty().await);
}

#[tokio::test]
async fn advisory_downgrade_is_noted_in_message() {
    // ---
    let mut h = Harness::new(StaticSeismicFeed {
        events: vec![strong_quake()],
        fail: false,
    });
    h.collab.advisor = Arc::new(FixedAdvisor(AdvisoryResult {
        confidence: 0.7,
        should_alert: true,
        suggested_level: SuggestedLevel::Downgrade,
        additional_context: None,
    }));
    let p = pipeline(h.collab.clone());

    assert_ok!(p.run_cycle_at(HazardKind::Seismic, now()).await);

    let messages = h.notifier.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].0.starts_with("⚠️ Warning: Earthquake ⚠️"));
    assert!(messages[0].0.contains("Emergency → Warning"));
}

#[tokio::test]
async fn failed_send_is_retried_next_cycle() {
    // ---
    let h = Harness::with_notifier(
        StaticSeismicFeed {
            events: vec![strong_quake()],
            fail: false,
        },
        RecordingNotifier::failing(1),
    );
    let p = pipeline(h.collab.clone());

    let first = assert_ok!(p.run_cycle_at(HazardKind::Seismic, now()).await);
    assert_eq!(first.failed, 1);
    assert_eq!(first.sent, 0);
    assert!(h.history.is_empty().await);

    let second = assert_ok!(
        p.run_cycle_at(HazardKind::Seismic, now() + Duration::minutes(1))
            .await
    );
    assert_eq!(second.sent, 1);
    assert_eq!(h.history.len().await, 1);
}

#[tokio::test]
async fn feed_failure_aborts_cycle_without_alerts() {
    // ---
    let h = Harness::new(StaticSeismicFeed {
        events: vec![strong_quake()],
        fail: true,
    });
    let p = pipeline(h.collab.clone());

    let err = assert_err!(p.run_cycle_at(HazardKind::Seismic, now()).await);
    assert!(matches!(
        err,
        AlertError::UpstreamFetch {
            kind: HazardKind::Seismic,
            ..
        }
    ));
    assert!(h.notifier.messages().await.is_empty());
    assert!(h.history.is_empty().await);
}

#[tokio::test]
async fn unreadable_history_fails_closed_by_default() {
    // ---
    let mut h = Harness::new(StaticSeismicFeed {
        events: vec![strong_quake()],
        fail: false,
    });
    h.collab.history = Arc::new(UnreadableHistory::default());
    let p = pipeline(h.collab.clone());

    let err = assert_err!(p.run_cycle_at(HazardKind::Seismic, now()).await);
    assert!(matches!(err, AlertError::HistoryRead(_)));
    assert!(h.notifier.messages().await.is_empty());
}

#[tokio::test]
async fn unreadable_history_can_fail_open() {
    // ---
    let mut h = Harness::new(StaticSeismicFeed {
        events: vec![strong_quake()],
        fail: false,
    });
    let history = Arc::new(UnreadableHistory::default());
    h.collab.history = history.clone();
    let cfg = EngineConfig {
        history_fail_open: true,
        ..EngineConfig::default()
    };
    let p = Pipeline::new(cfg, h.collab.clone());

    let report = assert_ok!(p.run_cycle_at(HazardKind::Seismic, now()).await);
    assert_eq!(report.sent, 1);
    assert_eq!(history.appended.load(Ordering::SeqCst), 1);
}

// --- flood

#[tokio::test]
async fn flood_alerts_only_where_heavy_rain_persists() {
    // ---
    let mut h = Harness::new(StaticSeismicFeed::default());
    let mut forecasts = HashMap::new();
    // Two heavy hours: below the three-hour requirement.
    forecasts.insert(
        "Bangkok".to_string(),
        [5.0, 12.0, 11.0, 3.0, 0.0, 0.0].map(Some).to_vec(),
    );
    forecasts.insert(
        "Nonthaburi".to_string(),
        vec![Some(12.0), None, Some(15.0), Some(10.5), Some(2.0)],
    );
    h.collab.rainfall_feed = Arc::new(StaticRainfallFeed {
        forecasts,
        fail: false,
    });
    let p = pipeline(h.collab.clone());

    let report = assert_ok!(p.run_cycle_at(HazardKind::Flood, now()).await);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.sent, 1);

    let messages = h.notifier.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].0.contains("Nonthaburi"));
    assert!(!messages[0].1);

    let records = h.history.records().await;
    assert_eq!(records[0].hazard_kind, HazardKind::Flood);
    assert_eq!(records[0].dedup_key, "Nonthaburi");

    let again = assert_ok!(
        p.run_cycle_at(HazardKind::Flood, now() + Duration::hours(1))
            .await
    );
    assert_eq!(again.duplicates, 1);
    assert_eq!(again.sent, 0);
}

#[tokio::test]
async fn flood_feed_failure_aborts_before_any_alert() {
    // ---
    let mut h = Harness::new(StaticSeismicFeed::default());
    h.collab.rainfall_feed = Arc::new(StaticRainfallFeed {
        forecasts: HashMap::new(),
        fail: true,
    });
    let p = pipeline(h.collab.clone());

    let err = assert_err!(p.run_cycle_at(HazardKind::Flood, now()).await);
    assert!(matches!(err, AlertError::UpstreamFetch { .. }));
    assert!(h.notifier.messages().await.is_empty());
}

// --- fire

#[tokio::test]
async fn fire_alerts_once_per_district_per_day() {
    // ---
    let mut h = Harness::new(StaticSeismicFeed::default());
    let mut hotspots = HashMap::new();
    let mut bangkok = hotspots_in("Bang Khen", 4);
    bangkok.extend(hotspots_in("Lat Krabang", 2));
    hotspots.insert("10".to_string(), bangkok);
    h.collab.hotspot_feed = Arc::new(StaticHotspotFeed { hotspots });
    let p = pipeline(h.collab.clone());

    let report = assert_ok!(p.run_cycle_at(HazardKind::Fire, now()).await);
    assert_eq!(report.fetched, 6);
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.sent, 1);

    let records = h.history.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].dedup_key, "2025-03-28_Bangkok_Bang Khen");
    assert_eq!(records[0].payload["hotspot_count"], 4);

    let again = assert_ok!(
        p.run_cycle_at(HazardKind::Fire, now() + Duration::hours(2))
            .await
    );
    assert_eq!(again.sent, 0);
    assert_eq!(again.duplicates, 1);
    assert_eq!(h.notifier.messages().await.len(), 1);
}
