//! # Route store
//!
//! An ordered sequence of waypoints. Insertion order is traversal order, and
//! the only supported edits are appends and a full clear, so waypoint indices
//! held by the follower stay valid for the lifetime of the route.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use veh_if::pose::PosPoint;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The ordered waypoint sequence the follower drives along.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Route {
    points: Vec<PosPoint>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Route {
    /// Discard all waypoints.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Append a single waypoint to the end of the route.
    pub fn add_waypoint(&mut self, point: PosPoint) {
        self.points.push(point);
    }

    /// Append a sequence of waypoints to the end of the route, preserving
    /// their order.
    pub fn add_points(&mut self, points: &[PosPoint]) {
        self.points.extend_from_slice(points);
    }

    /// Number of waypoints in the route.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the route holds no waypoints.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The waypoint at the given index, or `None` if the index is out of
    /// range.
    pub fn get(&self, index: usize) -> Option<&PosPoint> {
        self.points.get(index)
    }

    /// Read-only view of all waypoints.
    pub fn points(&self) -> &[PosPoint] {
        &self.points
    }

    /// Index of the waypoint nearest to the given point (by horizontal
    /// distance), or `None` if the route is empty.
    pub fn nearest_index(&self, point: &PosPoint) -> Option<usize> {
        let mut nearest: Option<(usize, f64)> = None;

        for (i, wp) in self.points.iter().enumerate() {
            let dist = wp.distance_2d_to(point);

            match nearest {
                Some((_, best)) if dist >= best => (),
                _ => nearest = Some((i, dist)),
            }
        }

        nearest.map(|(i, _)| i)
    }

    /// Sum of the segment lengths from the waypoint at `from_index` to the
    /// end of the route.
    ///
    /// Units: meters
    pub fn remaining_length_m(&self, from_index: usize) -> f64 {
        if from_index >= self.points.len() {
            return 0.0;
        }

        self.points[from_index..]
            .windows(2)
            .map(|w| w[0].distance_2d_to(&w[1]))
            .sum()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn wp(x_m: f64, y_m: f64) -> PosPoint {
        PosPoint {
            x_m,
            y_m,
            ..Default::default()
        }
    }

    #[test]
    fn test_append_and_clear() {
        let mut route = Route::default();
        assert!(route.is_empty());

        route.add_waypoint(wp(0.0, 0.0));
        route.add_points(&[wp(1.0, 0.0), wp(2.0, 0.0)]);

        assert_eq!(route.len(), 3);
        assert_eq!(route.get(1).unwrap().x_m, 1.0);
        assert!(route.get(3).is_none());

        route.clear();
        assert!(route.is_empty());
    }

    #[test]
    fn test_nearest_index() {
        let mut route = Route::default();
        assert_eq!(route.nearest_index(&wp(0.0, 0.0)), None);

        route.add_points(&[wp(0.0, 0.0), wp(2.0, 0.0), wp(4.0, 0.0)]);

        assert_eq!(route.nearest_index(&wp(1.9, 0.5)), Some(1));
        assert_eq!(route.nearest_index(&wp(100.0, 0.0)), Some(2));

        // Ties go to the earlier waypoint
        assert_eq!(route.nearest_index(&wp(1.0, 0.0)), Some(0));
    }

    #[test]
    fn test_remaining_length() {
        let mut route = Route::default();
        route.add_points(&[wp(0.0, 0.0), wp(3.0, 0.0), wp(3.0, 4.0)]);

        assert!((route.remaining_length_m(0) - 7.0).abs() < 1e-9);
        assert!((route.remaining_length_m(1) - 4.0).abs() < 1e-9);
        assert_eq!(route.remaining_length_m(2), 0.0);
        assert_eq!(route.remaining_length_m(10), 0.0);
    }
}
