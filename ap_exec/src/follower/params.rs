//! Parameters structure for the Follower

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::FollowerError;
use veh_if::kin::VehicleKin;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the Follower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- ROUTE FOLLOWING ----
    /// The radius of the pursuit circle, used both to select goals on the
    /// route and to judge a waypoint as reached.
    ///
    /// Units: meters
    pub pursuit_radius_m: f64,

    /// The maximum number of waypoints scanned ahead of the current one when
    /// advancing along the route and when selecting a goal.
    pub num_waypoints_lookahead: usize,

    /// Whether to restart the route from the first waypoint once the final
    /// one has been passed.
    pub repeat_route: bool,

    // ---- FOLLOW POINT ----
    /// The speed at which to approach a follow-point target.
    ///
    /// Units: meters/second
    pub follow_point_speed_ms: f64,

    /// The standoff distance to hold from a follow-point target.
    ///
    /// Units: meters
    pub follow_point_distance_m: f64,

    /// The age beyond which a follow-point target is considered stale and
    /// must not be pursued.
    ///
    /// Units: milliseconds
    pub follow_point_timeout_ms: u64,

    // ---- VEHICLE ----
    /// Kinematic description of the vehicle being driven.
    pub vehicle_kin: VehicleKin,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Params {
    /// Check the parameters against their valid ranges.
    pub fn validate(&self) -> Result<(), FollowerError> {
        if self.pursuit_radius_m <= 0.0 {
            return Err(FollowerError::InvalidParam(format!(
                "pursuit_radius_m must be positive, got {}",
                self.pursuit_radius_m
            )));
        }

        if self.num_waypoints_lookahead < 1 {
            return Err(FollowerError::InvalidParam(
                "num_waypoints_lookahead must be at least 1".into(),
            ));
        }

        if self.follow_point_speed_ms < 0.0 {
            return Err(FollowerError::InvalidParam(format!(
                "follow_point_speed_ms must not be negative, got {}",
                self.follow_point_speed_ms
            )));
        }

        if self.follow_point_distance_m < 0.0 {
            return Err(FollowerError::InvalidParam(format!(
                "follow_point_distance_m must not be negative, got {}",
                self.follow_point_distance_m
            )));
        }

        if self.follow_point_timeout_ms == 0 {
            return Err(FollowerError::InvalidParam(
                "follow_point_timeout_ms must be positive".into(),
            ));
        }

        if let Some(wheelbase_m) = self.vehicle_kin.wheelbase_m() {
            if wheelbase_m <= 0.0 {
                return Err(FollowerError::InvalidParam(format!(
                    "vehicle_kin.wheelbase_m must be positive, got {}",
                    wheelbase_m
                )));
            }
        }

        if let Some(trailer_wheelbase_m) = self.vehicle_kin.trailer_wheelbase_m() {
            if trailer_wheelbase_m <= 0.0 {
                return Err(FollowerError::InvalidParam(format!(
                    "vehicle_kin.trailer_wheelbase_m must be positive, got {}",
                    trailer_wheelbase_m
                )));
            }
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Params {
            pursuit_radius_m: 1.0,
            num_waypoints_lookahead: 8,
            repeat_route: false,
            follow_point_speed_ms: 1.0,
            follow_point_distance_m: 3.0,
            follow_point_timeout_ms: 1000,
            vehicle_kin: VehicleKin::default(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut params = Params::default();
        params.pursuit_radius_m = 0.0;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.num_waypoints_lookahead = 0;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.follow_point_timeout_ms = 0;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.vehicle_kin = VehicleKin::Trailered {
            wheelbase_m: 0.32,
            trailer_wheelbase_m: 0.0,
        };
        assert!(params.validate().is_err());
    }
}
