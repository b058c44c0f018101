//! Great-circle helpers for pedestrian-scale routes.

use crate::route::Coordinate;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Initial compass bearing in degrees, `[0, 360)`, travelling from `a` to `b`.
///
/// Meaningless for coincident points; callers check for a zero-length span first.
pub fn bearing(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();

    wrap_360(y.atan2(x).to_degrees())
}

pub fn wrap_360(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed difference `to - from` folded into `(-180, 180]`. Positive is clockwise.
pub fn bearing_delta(from: f64, to: f64) -> f64 {
    let delta = wrap_360(to - from);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Compass {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Compass {
    const ALL: [Compass; 8] = [
        Compass::N,
        Compass::NE,
        Compass::E,
        Compass::SE,
        Compass::S,
        Compass::SW,
        Compass::W,
        Compass::NW,
    ];

    /// Buckets a bearing by rounding `bearing / 45` to the nearest point, modulo 8.
    pub fn from_bearing(bearing: f64) -> Self {
        let idx = (wrap_360(bearing) / 45.0).round() as usize % 8;
        Self::ALL[idx]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Compass::N => "north",
            Compass::NE => "northeast",
            Compass::E => "east",
            Compass::SE => "southeast",
            Compass::S => "south",
            Compass::SW => "southwest",
            Compass::W => "west",
            Compass::NW => "northwest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Turn {
    Left,
    Right,
}

/// Turn hint between an incoming and an outgoing bearing, if the change exceeds `threshold_deg`.
pub fn turn_between(incoming: f64, outgoing: f64, threshold_deg: f64) -> Option<Turn> {
    let delta = bearing_delta(incoming, outgoing);
    if delta.abs() <= threshold_deg {
        None
    } else if delta > 0.0 {
        Some(Turn::Right)
    } else {
        Some(Turn::Left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lng: f64) -> Coordinate {
        Coordinate { lat, lng }
    }

    #[test]
    fn distance_same_point_is_zero() {
        let p = pt(48.2082, 16.3738);
        assert_eq!(distance(&p, &p), 0.0);
    }

    #[test]
    fn distance_known_value() {
        // Vienna to Bratislava ~55 km
        let vienna = pt(48.2082, 16.3738);
        let bratislava = pt(48.1486, 17.1077);
        let d = distance(&vienna, &bratislava);
        assert!(d > 50_000.0 && d < 60_000.0, "Expected ~55 km, got {d:.0} m");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = pt(51.5007, -0.1246);
        let b = pt(51.5033, -0.1195);
        assert!((distance(&a, &b) - distance(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn thousandth_of_a_degree_at_equator() {
        let d = distance(&pt(0.0, 0.0), &pt(0.0, 0.001));
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn bearing_cardinals() {
        let origin = pt(0.0, 0.0);
        assert!(bearing(&origin, &pt(1.0, 0.0)).abs() < 0.1);
        assert!((bearing(&origin, &pt(0.0, 1.0)) - 90.0).abs() < 0.1);
        assert!((bearing(&origin, &pt(-1.0, 0.0)) - 180.0).abs() < 0.1);
        assert!((bearing(&origin, &pt(0.0, -1.0)) - 270.0).abs() < 0.1);
    }

    #[test]
    fn bearing_stays_in_range() {
        let b = bearing(&pt(10.0, 10.0), &pt(10.0001, 9.9999));
        assert!((0.0..360.0).contains(&b), "got {b}");
    }

    #[test]
    fn compass_buckets() {
        assert_eq!(Compass::from_bearing(0.0), Compass::N);
        assert_eq!(Compass::from_bearing(22.4), Compass::N);
        assert_eq!(Compass::from_bearing(22.6), Compass::NE);
        assert_eq!(Compass::from_bearing(90.0), Compass::E);
        assert_eq!(Compass::from_bearing(200.0), Compass::S);
        assert_eq!(Compass::from_bearing(337.6), Compass::N);
        assert_eq!(Compass::from_bearing(315.0), Compass::NW);
    }

    #[test]
    fn compass_display() {
        assert_eq!(Compass::SW.to_string(), "SW");
        assert_eq!(Compass::SW.name(), "southwest");
    }

    #[test]
    fn delta_wraps_around_north() {
        assert!((bearing_delta(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((bearing_delta(10.0, 350.0) + 20.0).abs() < 1e-9);
        assert!((bearing_delta(0.0, 180.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn turns() {
        assert_eq!(turn_between(0.0, 90.0, 30.0), Some(Turn::Right));
        assert_eq!(turn_between(90.0, 0.0, 30.0), Some(Turn::Left));
        assert_eq!(turn_between(350.0, 60.0, 30.0), Some(Turn::Right));
        assert_eq!(turn_between(10.0, 300.0, 30.0), Some(Turn::Left));
        assert_eq!(turn_between(0.0, 25.0, 30.0), None);
        assert_eq!(turn_between(0.0, 30.0, 30.0), None);
        assert_eq!(Turn::Left.to_string(), "left");
    }
}
