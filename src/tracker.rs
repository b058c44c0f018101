use crate::route::{Coordinate, Route};

/// Where a given distance along a route lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPosition {
    pub coordinate: Coordinate,
    /// Vertex immediately preceding the position; `len - 2` once complete.
    pub segment_index: usize,
    /// Set when the distance reached or passed the end of the route.
    pub complete: bool,
}

/// Maps "meters walked since the start" onto the route.
#[derive(Debug, Clone, Copy)]
pub struct PositionTracker<'a> {
    route: &'a Route,
}

impl<'a> PositionTracker<'a> {
    pub fn new(route: &'a Route) -> Self {
        Self { route }
    }

    pub fn locate(&self, distance_traveled: f64) -> TrackedPosition {
        let route = self.route;
        let total = route.total_distance();

        if distance_traveled.is_nan() || distance_traveled <= 0.0 {
            return TrackedPosition {
                coordinate: route.first(),
                segment_index: 0,
                complete: total <= 0.0,
            };
        }

        if distance_traveled >= total {
            return TrackedPosition {
                coordinate: route.last(),
                segment_index: route.len() - 2,
                complete: true,
            };
        }

        // first segment whose far end reaches the distance
        let mut cumulative = 0.0;
        for i in 0..route.segment_count() {
            let seg = route.segment_distance(i).unwrap_or(0.0);
            if cumulative + seg >= distance_traveled {
                let t = if seg > 0.0 {
                    ((distance_traveled - cumulative) / seg).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let from = route.points()[i];
                let to = route.points()[i + 1];
                return TrackedPosition {
                    coordinate: from.lerp(&to, t),
                    segment_index: i,
                    complete: false,
                };
            }
            cumulative += seg;
        }

        // float drift: the summed segments fell just short of the cached total
        TrackedPosition {
            coordinate: route.last(),
            segment_index: route.len() - 2,
            complete: true,
        }
    }
}
