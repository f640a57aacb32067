//! Wave timing model: per-location arrival estimates and expected intensity.
//!
//! Velocities are coarse constants, not a travel-time curve. Distances are
//! rounded to whole kilometres before ETAs and intensity are derived, so the
//! thresholds in the intensity table compare against the same figure that is
//! shown in the rendered alert.

use chrono::{DateTime, Duration, Utc};

use crate::config::{IntensityRule, SeismicConfig};
use crate::geo;
use crate::models::{HazardEvent, ImpactAssessment, Intensity};

// ---

/// Assess `event` at every monitored location of `cfg`, nearest first.
///
/// Arrival flags are relative to `now`. An empty location list yields an
/// empty vector.
pub fn assess_impacts(
    event: &HazardEvent,
    cfg: &SeismicConfig,
    now: DateTime<Utc>,
) -> Vec<ImpactAssessment> {
    // ---
    let v = &cfg.velocities;
    let mut assessments: Vec<ImpactAssessment> = cfg
        .locations
        .iter()
        .map(|location| {
            let distance_km = geo::distance_km(
                event.epicenter_lat,
                event.epicenter_lon,
                location.latitude,
                location.longitude,
            )
            .round();

            let primary_eta = eta_secs(distance_km, v.primary);
            let secondary_eta = eta_secs(distance_km, v.secondary);
            let surface_eta = eta_secs(distance_km, v.surface);

            let primary_arrival = event.occurred_at + Duration::seconds(primary_eta);
            let secondary_arrival = event.occurred_at + Duration::seconds(secondary_eta);
            let surface_arrival = event.occurred_at + Duration::seconds(surface_eta);

            ImpactAssessment {
                location: location.name.clone(),
                distance_km,
                primary_wave_eta_secs: primary_eta,
                secondary_wave_eta_secs: secondary_eta,
                surface_wave_eta_secs: surface_eta,
                primary_arrival,
                secondary_arrival,
                surface_arrival,
                has_primary_arrived: now > primary_arrival,
                has_secondary_arrived: now > secondary_arrival,
                has_surface_arrived: now > surface_arrival,
                expected_intensity: classify_intensity(
                    event.magnitude,
                    distance_km,
                    &cfg.intensity_rules,
                ),
            }
        })
        .collect();

    // Stable: equidistant locations keep their configured order.
    assessments.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    assessments
}

/// First matching rule wins; `Minor` when nothing matches.
pub fn classify_intensity(magnitude: f64, distance_km: f64, rules: &[IntensityRule]) -> Intensity {
    // ---
    rules
        .iter()
        .find(|rule| magnitude >= rule.min_magnitude && distance_km < rule.max_distance_km)
        .map_or(Intensity::Minor, |rule| rule.intensity)
}

fn eta_secs(distance_km: f64, velocity_km_s: f64) -> i64 {
    (distance_km / velocity_km_s).round() as i64
}
