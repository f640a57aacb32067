//! Advisory adjustment of seismic decisions.
//!
//! An [`Advisor`] scores an event and its assessments. Whatever happens to
//! the call (error, timeout) the pipeline receives an [`Advisory`], which is
//! `Absent` on any failure, so the decision can always proceed.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::SeismicConfig;
use crate::error::{AlertError, Result};
use crate::models::{
    Advisory, AdvisoryResult, AlertDecision, HazardEvent, ImpactAssessment, Intensity,
    SuggestedLevel,
};

// ---

/// Confidence scoring collaborator.
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Score `event` given its per-location assessments (nearest first).
    async fn assess(
        &self,
        event: &HazardEvent,
        assessments: &[ImpactAssessment],
    ) -> Result<Advisory>;

    fn name(&self) -> &str;
}

/// Advisor used when advisory scoring is switched off.
#[derive(Debug, Clone, Default)]
pub struct DisabledAdvisor;

#[async_trait]
impl Advisor for DisabledAdvisor {
    async fn assess(&self, _event: &HazardEvent, _assessments: &[ImpactAssessment]) -> Result<Advisory> {
        Ok(Advisory::Absent)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Local confidence heuristic standing in for an external scoring service.
#[derive(Debug, Clone)]
pub struct HeuristicAdvisor {
    active_regions: Vec<String>,
}

const BASE_CONFIDENCE: f64 = 0.85;
const ALERT_CONFIDENCE: f64 = 0.6;
const RECENT_ACTIVITY_CONTEXT: &str =
    "Seismic activity in this area has increased recently; aftershocks are possible.";

impl HeuristicAdvisor {
    pub fn new(cfg: &SeismicConfig) -> Self {
        Self {
            active_regions: cfg.active_regions.clone(),
        }
    }

    /// Score without any I/O.
    pub fn score(&self, event: &HazardEvent, assessments: &[ImpactAssessment]) -> AdvisoryResult {
        // ---
        let mut confidence = BASE_CONFIDENCE;

        if self
            .active_regions
            .iter()
            .any(|region| event.place.contains(region.as_str()))
        {
            confidence += 0.05;
        }
        if event.magnitude > 6.0 {
            confidence += 0.05;
        }
        if assessments
            .iter()
            .any(|a| a.expected_intensity >= Intensity::Severe)
        {
            confidence += 0.05;
        }
        // Small and far away: likely not felt.
        if event.magnitude < 4.5 && assessments.first().is_some_and(|a| a.distance_km > 300.0) {
            confidence -= 0.2;
        }

        let confidence = confidence.clamp(0.0, 1.0);
        AdvisoryResult {
            confidence,
            should_alert: confidence >= ALERT_CONFIDENCE,
            suggested_level: if confidence >= BASE_CONFIDENCE {
                SuggestedLevel::Keep
            } else {
                SuggestedLevel::Downgrade
            },
            additional_context: Some(RECENT_ACTIVITY_CONTEXT.to_string()),
        }
    }
}

#[async_trait]
impl Advisor for HeuristicAdvisor {
    async fn assess(&self, event: &HazardEvent, assessments: &[ImpactAssessment]) -> Result<Advisory> {
        Ok(Advisory::Present(self.score(event, assessments)))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

/// Ask `advisor` for an opinion, collapsing errors and timeouts to `Absent`.
pub async fn consult(
    advisor: &dyn Advisor,
    event: &HazardEvent,
    assessments: &[ImpactAssessment],
    timeout: Duration,
) -> Advisory {
    // ---
    let outcome = match tokio::time::timeout(timeout, advisor.assess(event, assessments)).await {
        Ok(result) => result,
        Err(_) => Err(AlertError::Advisory(format!(
            "{} advisor timed out after {:?}",
            advisor.name(),
            timeout
        ))),
    };

    match outcome {
        Ok(advisory) => {
            if let Advisory::Present(ref result) = advisory {
                tracing::debug!(
                    kind = "seismic",
                    event_id = %event.id,
                    advisor = advisor.name(),
                    confidence = result.confidence,
                    should_alert = result.should_alert,
                    suggested = ?result.suggested_level,
                    "advisory received"
                );
            }
            advisory
        }
        Err(e) => {
            tracing::warn!(
                kind = "seismic",
                event_id = %event.id,
                advisor = advisor.name(),
                "advisory unavailable, continuing without it: {}",
                e
            );
            Advisory::Absent
        }
    }
}

/// Apply `advisory` to a pre-advisory decision.
///
/// `should_alert = false` suppresses the decision. A downgrade lowers the
/// level by exactly one step (floor `Info`) and records the transition in
/// the advisory note together with any additional context.
pub fn apply_advisory(mut decision: AlertDecision, advisory: &Advisory) -> AlertDecision {
    // ---
    let Advisory::Present(result) = advisory else {
        return decision;
    };

    let mut note = Vec::new();
    if result.suggested_level == SuggestedLevel::Downgrade {
        let before = decision.alert_level;
        decision.alert_level = before.downgraded();
        note.push(format!(
            "Note: advisory analysis indicates the impact may be lower than initially assessed ({} → {})",
            before.label(),
            decision.alert_level.label()
        ));
    }
    if let Some(context) = result.additional_context.as_deref().filter(|c| !c.is_empty()) {
        note.push(context.to_string());
    }
    if !note.is_empty() {
        decision.advisory_note = Some(note.join("\n"));
    }
    if !result.should_alert {
        decision.suppressed = true;
    }
    decision
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::{AlertLevel, HazardKind};
    use chrono::{TimeZone, Utc};

    fn decision(level: AlertLevel) -> AlertDecision {
        AlertDecision {
            event_key: "ev-1".to_string(),
            hazard_kind: HazardKind::Seismic,
            alert_level: level,
            is_high_priority: true,
            assessments: Vec::new(),
            advisory_note: None,
            suppressed: false,
        }
    }

    fn advisory(should_alert: bool, suggested_level: SuggestedLevel) -> Advisory {
        Advisory::Present(AdvisoryResult {
            confidence: 0.7,
            should_alert,
            suggested_level,
            additional_context: None,
        })
    }

    fn event(magnitude: f64, place: &str) -> HazardEvent {
        HazardEvent {
            id: "ev-1".to_string(),
            magnitude,
            epicenter_lat: 0.0,
            epicenter_lon: 0.0,
            depth_km: 10.0,
            occurred_at: Utc.with_ymd_and_hms(2025, 3, 28, 6, 20, 52).unwrap(),
            source_url: String::new(),
            place: place.to_string(),
        }
    }

    #[test]
    fn test_absent_passes_through() {
        // ---
        let before = decision(AlertLevel::Warning);
        assert_eq!(apply_advisory(before.clone(), &Advisory::Absent), before);
    }

    #[test]
    fn test_should_not_alert_suppresses() {
        // ---
        let out = apply_advisory(
            decision(AlertLevel::Warning),
            &advisory(false, SuggestedLevel::Keep),
        );
        assert!(out.suppressed);
        assert_eq!(out.alert_level, AlertLevel::Warning);
    }

    #[test]
    fn test_downgrade_one_step_with_floor() {
        // ---
        let down = advisory(true, SuggestedLevel::Downgrade);
        let cases = [
            (AlertLevel::Emergency, AlertLevel::Warning),
            (AlertLevel::Warning, AlertLevel::Watch),
            (AlertLevel::Watch, AlertLevel::Info),
            (AlertLevel::Info, AlertLevel::Info),
        ];
        for (from, to) in cases {
            let out = apply_advisory(decision(from), &down);
            assert_eq!(out.alert_level, to);
            assert!(!out.suppressed);
        }
    }

    #[test]
    fn test_downgrade_note_records_transition_and_context() {
        // ---
        let adv = Advisory::Present(AdvisoryResult {
            confidence: 0.7,
            should_alert: true,
            suggested_level: SuggestedLevel::Downgrade,
            additional_context: Some("Aftershocks likely".to_string()),
        });
        let note = apply_advisory(decision(AlertLevel::Emergency), &adv)
            .advisory_note
            .unwrap();
        assert!(note.contains("Emergency → Warning"));
        assert!(note.ends_with("\nAftershocks likely"));
    }

    #[test]
    fn test_heuristic_keeps_strong_events() {
        // ---
        let advisor = HeuristicAdvisor::new(&SeismicConfig::default());
        let result = advisor.score(&event(6.4, "10 km N of Mandalay, Myanmar"), &[]);
        assert!((result.confidence - 0.95).abs() < 1e-9);
        assert!(result.should_alert);
        assert_eq!(result.suggested_level, SuggestedLevel::Keep);
    }

    #[test]
    fn test_heuristic_downgrades_small_distant_events() {
        // ---
        let cfg = SeismicConfig {
            locations: vec![crate::models::MonitoredLocation::new("Far", 4.0, 0.0)],
            ..SeismicConfig::default()
        };
        let ev = event(4.2, "Andaman Sea");
        let assessments = crate::engine::wave::assess_impacts(&ev, &cfg, ev.occurred_at);
        let result = HeuristicAdvisor::new(&cfg).score(&ev, &assessments);

        // 0.85 - 0.20
        assert!((result.confidence - 0.65).abs() < 1e-9);
        assert!(result.should_alert);
        assert_eq!(result.suggested_level, SuggestedLevel::Downgrade);
    }

    struct FailingAdvisor;

    #[async_trait]
    impl Advisor for FailingAdvisor {
        async fn assess(&self, _: &HazardEvent, _: &[ImpactAssessment]) -> Result<Advisory> {
            Err(AlertError::Advisory("service unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct SlowAdvisor;

    #[async_trait]
    impl Advisor for SlowAdvisor {
        async fn assess(&self, _: &HazardEvent, _: &[ImpactAssessment]) -> Result<Advisory> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(advisory(false, SuggestedLevel::Keep))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_failure_collapses_to_absent() {
        // ---
        let out = consult(&FailingAdvisor, &event(6.0, "x"), &[], Duration::from_secs(1)).await;
        assert_eq!(out, Advisory::Absent);
    }

    #[tokio::test]
    async fn test_timeout_collapses_to_absent() {
        // ---
        let out = consult(&SlowAdvisor, &event(6.0, "x"), &[], Duration::from_millis(20)).await;
        assert_eq!(out, Advisory::Absent);
    }

    #[tokio::test]
    async fn test_disabled_is_absent() {
        // ---
        let out = consult(&DisabledAdvisor, &event(6.0, "x"), &[], Duration::from_secs(1)).await;
        assert_eq!(out, Advisory::Absent);
    }
}
