//! Relevance filter: narrows a worldwide event batch to events that matter
//! for the protected reference region.
//!
//! Two independent checks run in sequence: a radius cut in degrees, then the
//! ranked magnitude tiers with km caps. The checks are not dimensionally
//! aligned and both are kept as they are.

use crate::config::{RelevanceTier, SeismicConfig};
use crate::geo;
use crate::models::{HazardEvent, MonitoredLocation};

// ---

/// Keep the events of `events` that pass the radius check and a magnitude tier.
pub fn filter_relevant(events: Vec<HazardEvent>, cfg: &SeismicConfig) -> Vec<HazardEvent> {
    // ---
    events
        .into_iter()
        .filter(|event| {
            is_relevant(
                event,
                &cfg.reference,
                cfg.search_radius_deg,
                &cfg.relevance_tiers,
            )
        })
        .collect()
}

pub fn is_relevant(
    event: &HazardEvent,
    reference: &MonitoredLocation,
    radius_deg: f64,
    tiers: &[RelevanceTier],
) -> bool {
    // ---
    let degrees = geo::distance_degrees(
        event.epicenter_lat,
        event.epicenter_lon,
        reference.latitude,
        reference.longitude,
    );
    if degrees > radius_deg {
        tracing::trace!(event_id = %event.id, degrees, "outside search radius");
        return false;
    }

    let distance_km = degrees * geo::KM_PER_DEGREE;
    match matching_tier(event.magnitude, tiers) {
        Some(tier) => tier
            .max_distance_km
            .map_or(true, |cap| distance_km <= cap),
        None => false,
    }
}

/// First tier, in configured order, whose magnitude floor the event reaches.
fn matching_tier(magnitude: f64, tiers: &[RelevanceTier]) -> Option<&RelevanceTier> {
    tiers.iter().find(|tier| magnitude >= tier.min_magnitude)
}
