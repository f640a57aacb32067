//! Alert rendering. Pure formatting, no side effects.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Utc};

use crate::config::{FloodConfig, SeismicConfig};
use crate::error::{AlertError, Result};
use crate::geo;
use crate::models::{AlertDecision, FireAssessment, FloodAssessment, HazardEvent, ImpactAssessment};

// ---

const STRONG_GUIDANCE: [&str; 3] = [
    "If indoors, take cover under a sturdy table or stand next to a structural column",
    "Be prepared for aftershocks",
    "Stay away from objects that could fall or topple",
];

const LIGHT_GUIDANCE: [&str; 2] = [
    "Watch for shaking and stay away from objects that could fall",
    "Follow announcements from the authorities closely",
];

/// Render the seismic alert text for `decision`.
///
/// Fails with [`AlertError::MalformedInput`] when the decision carries no
/// assessments, since there are no arrival lines to format.
pub fn render_seismic(
    event: &HazardEvent,
    decision: &AlertDecision,
    cfg: &SeismicConfig,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<String> {
    // ---
    if decision.assessments.is_empty() {
        return Err(AlertError::MalformedInput(format!(
            "decision for event {} has no impact assessments",
            decision.event_key
        )));
    }

    let level = decision.alert_level;
    let reference_km = geo::distance_km(
        event.epicenter_lat,
        event.epicenter_lon,
        cfg.reference.latitude,
        cfg.reference.longitude,
    )
    .round();

    let mut msg = String::new();
    let _ = writeln!(msg, "{0} {1}: Earthquake {0}", level.emoji(), level.label());
    let _ = writeln!(msg, "Magnitude: {}", event.magnitude);
    let _ = writeln!(msg, "Location: {}", event.place);
    let _ = writeln!(msg, "Depth: {} km", event.depth_km);
    let _ = writeln!(
        msg,
        "Time: {}",
        event.occurred_at.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(
        msg,
        "Distance from {}: about {} km",
        cfg.reference.name, reference_km
    );

    msg.push_str("\nArrival status:");
    for assessment in &decision.assessments {
        let _ = write!(msg, "\n- {}", arrival_line(assessment, now));
    }

    msg.push_str("\n\nSafety guidance:");
    let guidance: &[&str] = if event.magnitude >= cfg.strong_guidance_magnitude {
        &STRONG_GUIDANCE
    } else {
        &LIGHT_GUIDANCE
    };
    for line in guidance {
        let _ = write!(msg, "\n- {}", line);
    }

    if let Some(note) = &decision.advisory_note {
        let _ = write!(msg, "\n\n{}", note);
    }
    if !event.source_url.is_empty() {
        let _ = write!(msg, "\n\nDetails: {}", event.source_url);
    }

    Ok(msg)
}

fn arrival_line(assessment: &ImpactAssessment, now: DateTime<Utc>) -> String {
    // ---
    let intensity = assessment.expected_intensity.label();
    if assessment.has_surface_arrived {
        return format!(
            "{}: seismic waves have passed (expected intensity: {})",
            assessment.location, intensity
        );
    }

    let remaining = (assessment.surface_arrival - now).num_seconds();
    if remaining > 0 {
        format!(
            "{}: expected to be affected in {} seconds (expected intensity: {})",
            assessment.location, remaining, intensity
        )
    } else {
        format!(
            "{}: seismic waves are arriving now (expected intensity: {})",
            assessment.location, intensity
        )
    }
}

pub fn render_flood(assessment: &FloodAssessment, cfg: &FloodConfig) -> String {
    // ---
    let mut forecast = String::from("heavy rain");
    if assessment.heavy_rain_hours >= cfg.heavy_hours_required {
        let _ = write!(forecast, " for {} hours", assessment.heavy_rain_hours);
    }
    if assessment.max_rainfall_mm >= cfg.extreme_hourly_mm {
        let _ = write!(
            forecast,
            ", peak rainfall {:.1} mm/h",
            assessment.max_rainfall_mm
        );
    }

    format!(
        "🌧️ Flash flood alert 🌧️\n\
         Area: {}\n\
         Forecast: {}\n\
         Guidance: prepare for flash flooding and avoid low-lying areas",
        assessment.location, forecast
    )
}

pub fn render_fire(assessment: &FireAssessment) -> String {
    // ---
    format!(
        "🔥 Fire alert 🔥\n\
         Area: {}, {}\n\
         Hotspots: {}\n\
         Estimated affected area: {:.2} km²\n\
         Detected on: {}\n\
         Guidance: avoid the area and follow instructions from officials",
        assessment.district,
        assessment.region,
        assessment.hotspot_count,
        assessment.affected_area_km2,
        assessment.date
    )
}
