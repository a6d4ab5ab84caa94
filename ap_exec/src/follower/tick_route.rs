//! Route-following tick processing for the Follower

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::debug;

// Internal
use super::{Demand, Follower, FollowerError, InputData, Phase};
use crate::pursuit;
use veh_if::pose::PosPoint;

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Follower {
    /// Initialise route following by selecting the starting waypoint, then
    /// fall through to the goto-begin tick in the same cycle.
    pub(crate) fn tick_route_init(
        &mut self,
        input_data: &InputData,
    ) -> Result<Demand, FollowerError> {
        if self.route.is_empty() {
            // start_following_route rejects empty routes, reaching this
            // state with one means the machine's invariant is broken
            return Err(FollowerError::EmptyRoute);
        }

        self.current_wp_index = if self.start_from_beginning {
            0
        } else {
            // Starting from the nearest waypoint needs a pose, hold until
            // one arrives
            match input_data.pose {
                Some(pose) => self.route.nearest_index(&pose).unwrap_or(0),
                None => return Ok(Demand::Hold),
            }
        };

        debug!(
            "Route following started at waypoint {} of {}",
            self.current_wp_index,
            self.route.len()
        );

        self.phase = Phase::FollowRouteGotoBegin;

        Ok(self.tick_goto_begin(input_data))
    }

    /// Drive towards the starting waypoint at that waypoint's own speed.
    pub(crate) fn tick_goto_begin(&mut self, input_data: &InputData) -> Demand {
        let pose = match input_data.pose {
            Some(p) => p,
            None => return Demand::Hold,
        };

        let wp = match self.route.get(self.current_wp_index) {
            Some(wp) => *wp,
            None => return Demand::Hold,
        };

        // Once inside the pursuit radius of the waypoint, following proper
        // begins in the same cycle
        if pose.distance_2d_to(&wp) <= self.params.pursuit_radius_m {
            self.phase = Phase::FollowRouteFollowing;
            return self.tick_following(input_data);
        }

        self.drive_to_goal(&pose, wp, input_data.trailer_hitch_angle_rad)
    }

    /// Follow the route: advance past reached waypoints, pick a pursuit
    /// goal and drive at it with an interpolated speed.
    pub(crate) fn tick_following(&mut self, input_data: &InputData) -> Demand {
        let pose = match input_data.pose {
            Some(p) => p,
            None => return Demand::Hold,
        };

        self.advance_past_waypoints(&pose);

        // Past the final waypoint the route either wraps or finishes
        if self.current_wp_index >= self.route.len() {
            if self.params.repeat_route {
                debug!("Route finished, repeating from the first waypoint");

                self.current_wp_index = 0;
                self.phase = Phase::FollowRouteGotoBegin;

                // Not falling through to the goto-begin tick here: a route
                // lying entirely inside the pursuit circle would recurse
                // forever
                return match self.route.get(0) {
                    Some(wp) => {
                        let wp = *wp;
                        self.drive_to_goal(&pose, wp, input_data.trailer_hitch_angle_rad)
                    }
                    None => Demand::Hold,
                };
            }

            debug!("Route finished");

            self.current_goal = None;
            self.phase = Phase::FollowRouteFinished;

            return Demand::Hold;
        }

        let start_segment = self.current_wp_index.saturating_sub(1);

        match pursuit::goal_on_route(
            self.route.points(),
            start_segment,
            self.params.num_waypoints_lookahead,
            &pursuit::xy(&pose),
            self.params.pursuit_radius_m,
        ) {
            Some((goal, segment)) => {
                // Blend the target speed between the waypoints bounding the
                // goal's segment
                let last_wp = self.route.points()[segment];
                let next_wp = self.route.points()[segment + 1];

                let goal = PosPoint {
                    x_m: goal.x,
                    y_m: goal.y,
                    speed_ms: pursuit::interpolated_speed(&goal, &last_wp, &next_wp),
                    ..Default::default()
                };

                self.drive_to_goal(&pose, goal, input_data.trailer_hitch_angle_rad)
            }
            // The pursuit circle misses the route, head for the current
            // waypoint directly
            None => match self.route.get(self.current_wp_index) {
                Some(wp) => {
                    let wp = *wp;
                    self.drive_to_goal(&pose, wp, input_data.trailer_hitch_angle_rad)
                }
                None => Demand::Hold,
            },
        }
    }

    /// Advance the current waypoint index past every waypoint already passed
    /// within the lookahead window, the furthest match winning.
    fn advance_past_waypoints(&mut self, pose: &PosPoint) {
        let window_end = (self.current_wp_index + self.params.num_waypoints_lookahead)
            .min(self.route.len());

        let mut furthest_passed = None;

        for i in self.current_wp_index..window_end {
            if self.waypoint_passed(pose, i) {
                furthest_passed = Some(i);
            }
        }

        if let Some(i) = furthest_passed {
            self.current_wp_index = i + 1;
        }
    }

    /// A waypoint counts as passed when the vehicle is within the pursuit
    /// radius of it, or has crossed the plane through it perpendicular to
    /// the route direction there.
    fn waypoint_passed(&self, pose: &PosPoint, index: usize) -> bool {
        let points = self.route.points();
        let wp = &points[index];

        if pose.distance_2d_to(wp) <= self.params.pursuit_radius_m {
            return true;
        }

        // Route direction at the waypoint: towards the next one, or out of
        // the previous one at the final waypoint
        let direction = if index + 1 < points.len() {
            pursuit::xy(&points[index + 1]) - pursuit::xy(wp)
        } else if index > 0 {
            pursuit::xy(wp) - pursuit::xy(&points[index - 1])
        } else {
            // A single-waypoint route has no direction, the radius test is
            // all there is
            return false;
        };

        direction.dot(&(pursuit::xy(pose) - pursuit::xy(wp))) > 0.0
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
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

    fn follower_with_route(points: &[PosPoint]) -> Follower {
        let mut follower = Follower::default();
        follower.add_route(points);
        follower
    }

    #[test]
    fn test_route_start_falls_through_to_goto_begin() {
        let mut follower = follower_with_route(&[wp(5.0, 0.0, 1.0), wp(10.0, 0.0, 1.0)]);
        follower.start_following_route(true).unwrap();
        assert_eq!(follower.phase, Phase::FollowRouteInit);

        // Far from the first waypoint, one tick lands in goto-begin driving
        // at it
        let (demand, report) = follower.proc(&input_at(0.0, 0.0)).unwrap();
        assert_eq!(follower.phase, Phase::FollowRouteGotoBegin);
        assert!(report.active);

        match demand {
            Demand::Drive(d) => {
                assert!((d.speed_ms - 1.0).abs() < 1e-9);
                // Goal dead ahead, no turn
                assert!(d.curv_m.abs() < 1e-9);
            }
            d => panic!("expected a drive demand, got {:?}", d),
        }
    }

    #[test]
    fn test_route_start_from_nearest_waypoint() {
        let mut follower = follower_with_route(&[
            wp(0.0, 0.0, 1.0),
            wp(5.0, 0.0, 1.0),
            wp(10.0, 0.0, 1.0),
        ]);
        follower.start_following_route(false).unwrap();

        let (_, report) = follower.proc(&input_at(5.4, 3.0)).unwrap();

        // The middle waypoint is the nearest
        assert_eq!(report.current_wp_index, 1);
        assert_eq!(follower.phase, Phase::FollowRouteGotoBegin);
    }

    #[test]
    fn test_goto_begin_reaches_following_same_tick() {
        let mut follower = follower_with_route(&[wp(1.0, 0.0, 1.0), wp(5.0, 0.0, 2.0)]);
        follower.start_following_route(true).unwrap();

        // Within the pursuit radius of the first waypoint: init, goto-begin
        // and following all happen in one tick, and the first waypoint is
        // already passed
        let (demand, report) = follower.proc(&input_at(0.5, 0.0)).unwrap();
        assert_eq!(follower.phase, Phase::FollowRouteFollowing);
        assert_eq!(report.current_wp_index, 1);

        // The goal lands on the pursuit circle at (1.5, 0), with the speed
        // blended 1/8th of the way into the segment
        match demand {
            Demand::Drive(d) => {
                assert!((d.speed_ms - 1.125).abs() < 1e-9);
                assert!(d.curv_m.abs() < 1e-9);
            }
            d => panic!("expected a drive demand, got {:?}", d),
        }
        assert!((report.goal_x_m.unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_following_falls_back_to_waypoint_goal() {
        let mut follower = follower_with_route(&[wp(0.0, 0.0, 1.0), wp(10.0, 0.0, 2.0)]);
        follower.start_following_route(true).unwrap();

        // The first tick from the route start transitions straight into
        // following
        follower.proc(&input_at(0.0, 0.0)).unwrap();
        assert_eq!(follower.phase, Phase::FollowRouteFollowing);

        // Pushed well off the route the pursuit circle misses it, so the
        // goal falls back to the current waypoint itself
        let (demand, report) = follower.proc(&input_at(0.5, 3.0)).unwrap();
        assert_eq!(report.current_wp_index, 1);
        assert_eq!(report.goal_x_m, Some(10.0));

        match demand {
            Demand::Drive(d) => assert!((d.speed_ms - 2.0).abs() < 1e-9),
            d => panic!("expected a drive demand, got {:?}", d),
        }
    }

    #[test]
    fn test_advance_by_projection() {
        let mut follower = follower_with_route(&[wp(0.0, 0.0, 1.0), wp(4.0, 0.0, 1.0)]);
        follower.phase = Phase::FollowRouteFollowing;

        // Outside the radius of the first waypoint but past it along the
        // route direction
        let (_, report) = follower.proc(&input_at(1.5, 0.0)).unwrap();
        assert_eq!(report.current_wp_index, 1);
    }

    #[test]
    fn test_advance_respects_lookahead() {
        let mut follower = follower_with_route(&[
            wp(0.0, 0.0, 1.0),
            wp(0.5, 0.0, 1.0),
            wp(1.0, 0.0, 1.0),
            wp(20.0, 0.0, 1.0),
        ]);
        follower.params.num_waypoints_lookahead = 1;
        follower.phase = Phase::FollowRouteFollowing;

        // With a lookahead of one only the first waypoint is scanned, even
        // though the next two are also within the pursuit radius
        let (_, report) = follower.proc(&input_at(0.0, 0.0)).unwrap();
        assert_eq!(report.current_wp_index, 1);
    }

    #[test]
    fn test_route_finish_and_hold() {
        let mut follower = follower_with_route(&[wp(1.0, 0.0, 1.0), wp(2.0, 0.0, 1.0)]);
        follower.start_following_route(true).unwrap();

        // On top of the final waypoint both waypoints count as passed and
        // the route finishes in one tick
        let (demand, report) = follower.proc(&input_at(2.0, 0.0)).unwrap();
        assert_eq!(follower.phase, Phase::FollowRouteFinished);
        assert_eq!(demand, Demand::Hold);
        assert_eq!(report.remaining_route_dist_m, Some(0.0));
        assert!(!report.active);

        // Finished keeps holding until told otherwise
        let (demand, _) = follower.proc(&input_at(2.0, 0.0)).unwrap();
        assert_eq!(demand, Demand::Hold);
        assert_eq!(follower.phase, Phase::FollowRouteFinished);
    }

    #[test]
    fn test_route_repeat_wraps_to_goto_begin() {
        let mut follower = follower_with_route(&[wp(1.0, 0.0, 1.0), wp(2.0, 0.0, 1.0)]);
        follower.params.repeat_route = true;
        follower.start_following_route(true).unwrap();

        let (demand, report) = follower.proc(&input_at(2.0, 0.0)).unwrap();

        // Wrapped back to the first waypoint instead of finishing
        assert_eq!(follower.phase, Phase::FollowRouteGotoBegin);
        assert_eq!(report.current_wp_index, 0);
        assert!(matches!(demand, Demand::Drive(_)));
    }

    #[test]
    fn test_no_pose_holds_and_keeps_state() {
        let mut follower = follower_with_route(&[wp(5.0, 0.0, 1.0)]);
        follower.start_following_route(true).unwrap();

        let (demand, report) = follower.proc(&InputData::default()).unwrap();
        assert_eq!(demand, Demand::Hold);
        assert!(!report.pose_valid);
        assert_eq!(follower.phase, Phase::FollowRouteGotoBegin);

        // Control resumes as soon as a pose arrives again
        let (demand, _) = follower.proc(&input_at(0.0, 0.0)).unwrap();
        assert!(matches!(demand, Demand::Drive(_)));
    }

    #[test]
    fn test_following_empty_route_errors() {
        let mut follower = Follower::default();
        follower.phase = Phase::FollowRouteInit;

        assert!(follower.proc(&input_at(0.0, 0.0)).is_err());
    }

    #[test]
    fn test_remaining_distance_reported() {
        let mut follower = follower_with_route(&[wp(3.0, 4.0, 1.0), wp(3.0, 10.0, 1.0)]);
        follower.start_following_route(true).unwrap();

        // 5 m to the first waypoint plus the 6 m segment after it
        let (_, report) = follower.proc(&input_at(0.0, 0.0)).unwrap();
        assert!((report.remaining_route_dist_m.unwrap() - 11.0).abs() < 1e-9);
    }
}
