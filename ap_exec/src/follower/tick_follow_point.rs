//! Follow-point tick processing for the Follower

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use nalgebra::Point2;
use std::time::Duration;

// Internal
use super::{Demand, Follower, InputData, Phase, GOAL_COINCIDENT_LIMIT_M};
use crate::pursuit;
use veh_if::{dems::VehicleDems, pose::PosPoint};

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Follower {
    /// Pursue the follow-point target, holding position while it is absent
    /// or stale.
    ///
    /// Staleness is re-evaluated on every tick so that a stale target is
    /// never pursued. The slower operator-facing staleness warning lives in
    /// the executive.
    pub(crate) fn tick_follow_point(&mut self, input_data: &InputData) -> Demand {
        let target = match self.fresh_follow_point_target() {
            Some(t) => t,
            None => {
                self.current_goal = None;
                self.phase = Phase::FollowPointWaiting;
                return Demand::Hold;
            }
        };

        self.phase = Phase::FollowPointFollowing;
        self.current_goal = Some(target);

        // The target is already expressed in the vehicle frame
        let target_xy = Point2::new(target.x_m, target.y_m);
        let distance_m = target_xy.coords.norm();

        if distance_m < GOAL_COINCIDENT_LIMIT_M {
            return Demand::Hold;
        }

        let speed_ms = pursuit::follow_point_speed(
            distance_m,
            self.params.follow_point_distance_m,
            self.params.follow_point_speed_ms,
        );

        let curv_m = pursuit::curv_to_goal(
            &self.params.vehicle_kin,
            &target_xy,
            input_data.trailer_hitch_angle_rad,
            self.params.pursuit_radius_m,
            speed_ms,
        );

        Demand::Drive(VehicleDems { speed_ms, curv_m })
    }

    /// The follow-point target if it is fresh, `None` when it is absent or
    /// older than the staleness timeout.
    pub(crate) fn fresh_follow_point_target(&self) -> Option<PosPoint> {
        let (target, arrived) = self.follow_point_target?;

        if arrived.elapsed() >= Duration::from_millis(self.params.follow_point_timeout_ms) {
            return None;
        }

        Some(target)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
