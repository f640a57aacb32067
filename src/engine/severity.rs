//! Severity aggregation: worst-case intensity across locations and the
//! resulting alert level and priority of the decision.

use crate::config::{LevelRule, SeismicConfig};
use crate::models::{AlertDecision, AlertLevel, HazardEvent, HazardKind, ImpactAssessment, Intensity};

// ---

/// Entry with the highest intensity. Ties keep the first entry, which is the
/// nearest location for distance-ordered input. `None` for empty input.
pub fn worst_assessment(assessments: &[ImpactAssessment]) -> Option<&ImpactAssessment> {
    // ---
    assessments.iter().fold(None, |worst, current| match worst {
        Some(w) if current.expected_intensity.rank() <= w.expected_intensity.rank() => Some(w),
        _ => Some(current),
    })
}

/// First rule whose magnitude or intensity trigger fires; `Info` otherwise.
pub fn alert_level(magnitude: f64, worst: Intensity, rules: &[LevelRule]) -> AlertLevel {
    // ---
    rules
        .iter()
        .find(|rule| magnitude >= rule.min_magnitude || worst >= rule.min_intensity)
        .map_or(AlertLevel::Info, |rule| rule.level)
}

pub fn is_high_priority(magnitude: f64, worst: Intensity, cfg: &SeismicConfig) -> bool {
    magnitude >= cfg.high_priority_magnitude || worst >= cfg.high_priority_intensity
}

/// Build the pre-advisory decision for `event` from its assessments.
///
/// Empty assessments mean "no data": the worst intensity is taken as `Minor`
/// and only the magnitude triggers apply.
pub fn decide(
    event: &HazardEvent,
    assessments: Vec<ImpactAssessment>,
    cfg: &SeismicConfig,
) -> AlertDecision {
    // ---
    let worst = worst_assessment(&assessments)
        .map_or(Intensity::Minor, |a| a.expected_intensity);

    AlertDecision {
        event_key: event.id.clone(),
        hazard_kind: HazardKind::Seismic,
        alert_level: alert_level(event.magnitude, worst, &cfg.level_rules),
        is_high_priority: is_high_priority(event.magnitude, worst, cfg),
        assessments,
        advisory_note: None,
        suppressed: false,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{TimeZone, Utc};

    fn assessment(location: &str, distance_km: f64, intensity: Intensity) -> ImpactAssessment {
        // ---
        let t = Utc.with_ymd_and_hms(2025, 3, 28, 6, 20, 52).unwrap();
        ImpactAssessment {
            location: location.to_string(),
            distance_km,
            primary_wave_eta_secs: 0,
            secondary_wave_eta_secs: 0,
            surface_wave_eta_secs: 0,
            primary_arrival: t,
            secondary_arrival: t,
            surface_arrival: t,
            has_primary_arrived: false,
            has_secondary_arrived: false,
            has_surface_arrived: false,
            expected_intensity: intensity,
        }
    }

    fn event(magnitude: f64) -> HazardEvent {
        HazardEvent {
            id: "ev-1".to_string(),
            magnitude,
            epicenter_lat: 0.0,
            epicenter_lon: 0.0,
            depth_km: 10.0,
            occurred_at: Utc.with_ymd_and_hms(2025, 3, 28, 6, 20, 52).unwrap(),
            source_url: String::new(),
            place: "test".to_string(),
        }
    }

    #[test]
    fn test_worst_picks_highest_rank() {
        // ---
        let list = vec![
            assessment("A", 100.0, Intensity::Moderate),
            assessment("B", 200.0, Intensity::Severe),
            assessment("C", 300.0, Intensity::Minor),
        ];
        assert_eq!(worst_assessment(&list).unwrap().location, "B");
    }

    #[test]
    fn test_worst_tie_keeps_nearest() {
        // ---
        let list = vec![
            assessment("Near", 100.0, Intensity::Severe),
            assessment("Far", 200.0, Intensity::Severe),
        ];
        assert_eq!(worst_assessment(&list).unwrap().location, "Near");
    }

    #[test]
    fn test_worst_is_order_independent_without_ties() {
        // ---
        let mut list = vec![
            assessment("A", 100.0, Intensity::Minor),
            assessment("B", 200.0, Intensity::Extreme),
            assessment("C", 300.0, Intensity::Moderate),
        ];
        let forward = worst_assessment(&list).unwrap().location.clone();
        list.reverse();
        assert_eq!(worst_assessment(&list).unwrap().location, forward);
    }

    #[test]
    fn test_worst_of_empty() {
        assert!(worst_assessment(&[]).is_none());
    }

    #[test]
    fn test_alert_level_triggers() {
        // ---
        let rules = SeismicConfig::default().level_rules;
        assert_eq!(alert_level(7.0, Intensity::Minor, &rules), AlertLevel::Emergency);
        assert_eq!(alert_level(4.5, Intensity::Extreme, &rules), AlertLevel::Emergency);
        assert_eq!(alert_level(6.2, Intensity::Minor, &rules), AlertLevel::Warning);
        assert_eq!(alert_level(4.5, Intensity::Severe, &rules), AlertLevel::Warning);
        assert_eq!(alert_level(5.0, Intensity::Minor, &rules), AlertLevel::Watch);
        assert_eq!(alert_level(4.0, Intensity::Moderate, &rules), AlertLevel::Watch);
        assert_eq!(alert_level(4.9, Intensity::Minor, &rules), AlertLevel::Info);
    }

    #[test]
    fn test_high_priority() {
        // ---
        let cfg = SeismicConfig::default();
        assert!(is_high_priority(5.5, Intensity::Minor, &cfg));
        assert!(is_high_priority(4.0, Intensity::Severe, &cfg));
        assert!(is_high_priority(4.0, Intensity::Extreme, &cfg));
        assert!(!is_high_priority(5.4, Intensity::Moderate, &cfg));
    }

    #[test]
    fn test_decide_without_data_uses_magnitude() {
        // ---
        let decision = decide(&event(6.1), Vec::new(), &SeismicConfig::default());
        assert_eq!(decision.alert_level, AlertLevel::Warning);
        assert!(decision.is_high_priority);
        assert!(!decision.suppressed);
        assert_eq!(decision.event_key, "ev-1");
    }
}
