use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::WalkError;
use crate::geo;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, WalkError> {
        let c = Self { lat, lng };
        if c.is_valid() {
            Ok(c)
        } else {
            Err(WalkError::InvalidCoordinate { lat, lng })
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Component-wise linear interpolation; fine over a few hundred meters.
    pub fn lerp(&self, other: &Coordinate, t: f64) -> Coordinate {
        Coordinate {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

/// Parses `"lat,lng"`, as typed on the command line.
impl FromStr for Coordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("expected LAT,LNG but got '{s}'"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;
        Coordinate::new(lat, lng).map_err(|e| e.to_string())
    }
}

/// An immutable polyline to walk along, with distances computed once up front.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    points: Vec<Coordinate>,
    segments: Vec<f64>,
    // cumulative[i] is the distance from the start to vertex i
    cumulative: Vec<f64>,
}

#[allow(clippy::len_without_is_empty)]
impl Route {
    pub fn new(points: Vec<Coordinate>) -> Result<Self, WalkError> {
        if points.len() < 2 {
            return Err(WalkError::InvalidRoute {
                points: points.len(),
            });
        }
        if let Some(bad) = points.iter().find(|p| !p.is_valid()) {
            return Err(WalkError::InvalidCoordinate {
                lat: bad.lat,
                lng: bad.lng,
            });
        }

        let segments: Vec<f64> = points
            .iter()
            .tuple_windows()
            .map(|(a, b)| geo::distance(a, b))
            .collect();

        let mut cumulative = Vec::with_capacity(points.len());
        cumulative.push(0.0);
        for seg in &segments {
            let last = cumulative.last().copied().unwrap_or(0.0);
            cumulative.push(last + seg);
        }

        Ok(Self {
            points,
            segments,
            cumulative,
        })
    }

    /// Vertex count.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn total_distance(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn vertex_at(&self, i: usize) -> Option<&Coordinate> {
        self.points.get(i)
    }

    /// Length of the span between vertex `i` and `i + 1`.
    pub fn segment_distance(&self, i: usize) -> Option<f64> {
        self.segments.get(i).copied()
    }

    pub fn distance_to_vertex(&self, i: usize) -> Option<f64> {
        self.cumulative.get(i).copied()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn first(&self) -> Coordinate {
        self.points[0]
    }

    pub fn last(&self) -> Coordinate {
        self.points[self.points.len() - 1]
    }

    /// Bearing of segment `i`, or `None` when the segment has zero length.
    pub fn segment_bearing(&self, i: usize) -> Option<f64> {
        match self.segment_distance(i) {
            Some(d) if d > 0.0 => Some(geo::bearing(&self.points[i], &self.points[i + 1])),
            _ => None,
        }
    }
}
