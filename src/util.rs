use std::time::Duration;

use time_humanize::{Accuracy, HumanTime, Tense};

use crate::route::Coordinate;

pub fn kmh_to_mps(kmh: f64) -> f64 {
    kmh / 3.6
}

/// "850 m" below a kilometer, "1.2 km" above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

pub fn format_eta(eta: Duration) -> String {
    if eta < Duration::from_secs(1) {
        return "moments".to_string();
    }
    HumanTime::from(eta).to_text_en(Accuracy::Rough, Tense::Present)
}

/// OpenStreetMap link centered on `at`.
pub fn osm_url(at: &Coordinate) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={lat:.6}&mlon={lng:.6}#map=18/{lat:.6}/{lng:.6}",
        lat = at.lat,
        lng = at.lng
    )
}
