//! Commands and accessors for driving the Follower from outside

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use std::time::Instant;

// Internal
use super::{Follower, FollowerError, Phase};
use crate::route::Route;
use veh_if::kin::VehicleKin;
use veh_if::pose::PosPoint;

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Follower {
    /// Append a single waypoint to the route. Always safe, including during
    /// an active traversal.
    pub fn add_waypoint(&mut self, point: PosPoint) {
        self.route.add_waypoint(point);
    }

    /// Append a sequence of waypoints to the route. Always safe, including
    /// during an active traversal.
    pub fn add_route(&mut self, points: &[PosPoint]) {
        self.route.add_points(points);
    }

    /// Clear the route. If a route is being followed the state machine is
    /// reset to idle, issuing a hold demand first.
    pub fn clear_route(&mut self) {
        self.route.clear();

        match self.phase {
            Phase::FollowRouteInit
            | Phase::FollowRouteGotoBegin
            | Phase::FollowRouteFollowing
            | Phase::FollowRouteFinished => {
                self.stop();
                self.current_wp_index = 0;
                self.current_goal = None;
            }
            _ => (),
        }
    }

    /// Begin following the stored route, either from the first waypoint or
    /// from the one nearest to the vehicle.
    ///
    /// Only valid when idle, and the route must not be empty.
    pub fn start_following_route(&mut self, from_beginning: bool) -> Result<(), FollowerError> {
        if self.phase != Phase::None {
            return Err(FollowerError::NotIdle(self.phase));
        }

        if self.route.is_empty() {
            return Err(FollowerError::EmptyRoute);
        }

        self.start_from_beginning = from_beginning;
        self.current_wp_index = 0;
        self.current_goal = None;
        self.phase = Phase::FollowRouteInit;

        Ok(())
    }

    /// Begin the follow-point behaviour. Any previous target is discarded,
    /// the follower holds position until the first update arrives.
    ///
    /// Only valid when idle.
    pub fn start_follow_point(&mut self) -> Result<(), FollowerError> {
        if self.phase != Phase::None {
            return Err(FollowerError::NotIdle(self.phase));
        }

        self.follow_point_target = None;
        self.current_goal = None;
        self.phase = Phase::FollowPointWaiting;

        Ok(())
    }

    /// Update the follow-point target with a new point in the vehicle frame.
    ///
    /// Only valid while the follow-point behaviour is active.
    pub fn update_follow_point(&mut self, point: PosPoint) -> Result<(), FollowerError> {
        match self.phase {
            Phase::FollowPointWaiting | Phase::FollowPointFollowing => {
                self.follow_point_target = Some((point, Instant::now()));
                Ok(())
            }
            _ => Err(FollowerError::NotFollowingPoint),
        }
    }

    /// Stop any active behaviour. Valid from any state. At least one hold
    /// demand is issued on the next tick before the follower goes idle.
    pub fn stop(&mut self) {
        self.phase = Phase::None;
        self.stop_pending = true;
    }

    /// Stop and additionally clear the route progress, the current goal and
    /// the follow-point target. The route itself is kept.
    pub fn reset_state(&mut self) {
        self.stop();
        self.current_wp_index = 0;
        self.current_goal = None;
        self.follow_point_target = None;
    }

    /// Whether the follower is actively controlling the vehicle.
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::None | Phase::FollowRouteFinished)
    }

    /// The goal currently being pursued. Route goals are in the local frame,
    /// follow-point goals in the vehicle frame.
    pub fn current_goal(&self) -> Option<PosPoint> {
        self.current_goal
    }

    /// Read-only view of the stored route.
    pub fn current_route(&self) -> &Route {
        &self.route
    }

    /// The vehicle kinematics the follower is steering for.
    pub fn vehicle_kin(&self) -> VehicleKin {
        self.params.vehicle_kin
    }

    /// Set the pursuit radius, which must be strictly positive.
    pub fn set_pursuit_radius(&mut self, radius_m: f64) -> Result<(), FollowerError> {
        if radius_m <= 0.0 {
            return Err(FollowerError::InvalidParam(format!(
                "pursuit_radius_m must be positive, got {}",
                radius_m
            )));
        }

        self.params.pursuit_radius_m = radius_m;
        Ok(())
    }

    /// Set the follow-point approach speed, which must not be negative.
    pub fn set_follow_point_speed(&mut self, speed_ms: f64) -> Result<(), FollowerError> {
        if speed_ms < 0.0 {
            return Err(FollowerError::InvalidParam(format!(
                "follow_point_speed_ms must not be negative, got {}",
                speed_ms
            )));
        }

        self.params.follow_point_speed_ms = speed_ms;
        Ok(())
    }

    /// Set whether the route repeats once its final waypoint is passed.
    pub fn set_repeat_route(&mut self, repeat: bool) {
        self.params.repeat_route = repeat;
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::{Demand, InputData};
    use super::*;
    use util::module::State;

    fn wp(x_m: f64, y_m: f64, speed_ms: f64) -> PosPoint {
        PosPoint {
            x_m,
            y_m,
            speed_ms,
            ..Default::default()
        }
    }

    fn input_at(x_m: f64, y_m: f64) -> InputData {
        InputData {
            pose: Some(PosPoint {
                x_m,
                y_m,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_stop_issues_one_hold_then_idle() {
        let mut follower = Follower::default();
        follower.add_waypoint(wp(5.0, 0.0, 1.0));
        follower.start_following_route(true).unwrap();
        follower.proc(&input_at(0.0, 0.0)).unwrap();
        assert!(follower.is_active());

        follower.stop();
        assert!(!follower.is_active());

        // Exactly one hold demand, then idle
        let (demand, _) = follower.proc(&input_at(0.0, 0.0)).unwrap();
        assert_eq!(demand, Demand::Hold);
        let (demand, _) = follower.proc(&input_at(0.0, 0.0)).unwrap();
        assert_eq!(demand, Demand::Idle);
    }

    #[test]
    fn test_start_rejected_while_active() {
        let mut follower = Follower::default();
        follower.add_waypoint(wp(5.0, 0.0, 1.0));
        follower.start_following_route(true).unwrap();

        assert!(matches!(
            follower.start_following_route(true),
            Err(FollowerError::NotIdle(_))
        ));
        assert!(matches!(
            follower.start_follow_point(),
            Err(FollowerError::NotIdle(_))
        ));
    }

    #[test]
    fn test_start_rejected_on_empty_route() {
        let mut follower = Follower::default();

        assert!(matches!(
            follower.start_following_route(true),
            Err(FollowerError::EmptyRoute)
        ));
        assert_eq!(follower.phase, Phase::None);
    }

    #[test]
    fn test_clear_route_while_following_resets() {
        let mut follower = Follower::default();
        follower.add_route(&[wp(5.0, 0.0, 1.0), wp(10.0, 0.0, 1.0)]);
        follower.start_following_route(true).unwrap();
        follower.proc(&input_at(0.0, 0.0)).unwrap();

        follower.clear_route();
        assert!(!follower.is_active());
        assert!(follower.current_route().is_empty());

        // The reset behaves like a stop: one hold, then idle
        let (demand, _) = follower.proc(&input_at(0.0, 0.0)).unwrap();
        assert_eq!(demand, Demand::Hold);
        let (demand, _) = follower.proc(&input_at(0.0, 0.0)).unwrap();
        assert_eq!(demand, Demand::Idle);
    }

    #[test]
    fn test_appends_are_safe_while_following() {
        let mut follower = Follower::default();
        follower.add_route(&[wp(2.0, 0.0, 1.0), wp(4.0, 0.0, 1.0)]);
        follower.start_following_route(true).unwrap();
        follower.proc(&input_at(0.0, 0.0)).unwrap();
        let phase = follower.phase;

        follower.add_waypoint(wp(6.0, 0.0, 1.0));
        assert_eq!(follower.phase, phase);
        assert_eq!(follower.current_route().len(), 3);
    }

    #[test]
    fn test_update_follow_point_needs_mode() {
        let mut follower = Follower::default();

        assert!(matches!(
            follower.update_follow_point(wp(1.0, 0.0, 0.0)),
            Err(FollowerError::NotFollowingPoint)
        ));

        follower.start_follow_point().unwrap();
        assert!(follower.update_follow_point(wp(1.0, 0.0, 0.0)).is_ok());
    }

    #[test]
    fn test_reset_state_clears_progress_but_keeps_route() {
        let mut follower = Follower::default();
        follower.add_route(&[wp(1.0, 0.0, 1.0), wp(2.0, 0.0, 1.0)]);
        follower.start_following_route(true).unwrap();
        follower.proc(&input_at(1.8, 0.0)).unwrap();

        follower.reset_state();
        assert_eq!(follower.current_wp_index, 0);
        assert!(follower.current_goal().is_none());
        assert_eq!(follower.current_route().len(), 2);
    }

    #[test]
    fn test_setters_validate() {
        let mut follower = Follower::default();

        assert!(follower.set_pursuit_radius(0.0).is_err());
        assert!(follower.set_pursuit_radius(-1.0).is_err());
        follower.set_pursuit_radius(2.5).unwrap();
        assert!((follower.params.pursuit_radius_m - 2.5).abs() < 1e-12);

        assert!(follower.set_follow_point_speed(-0.1).is_err());
        follower.set_follow_point_speed(0.0).unwrap();
        assert_eq!(follower.params.follow_point_speed_ms, 0.0);

        follower.set_repeat_route(true);
        assert!(follower.params.repeat_route);
    }
}
