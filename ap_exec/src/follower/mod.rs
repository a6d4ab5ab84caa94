//! # Follower state machine
//!
//! The follower is the autopilot's nucleus. Once per cycle it selects the
//! current goal (a point on the route or an externally supplied follow-point
//! target), computes the demanded speed and steering curvature, and issues a
//! single actuation demand. It also manages the lifecycle transitions
//! between idle, goto-begin, following, finished and the follow-point
//! behaviour with its staleness timeout.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod cmd;
mod params;
mod state;
mod tick_follow_point;
mod tick_route;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Distance below which a goal is treated as coincident with the vehicle.
/// The curvature law is singular there, so such a goal yields a hold demand.
///
/// Units: meters
pub(crate) const GOAL_COINCIDENT_LIMIT_M: f64 = 1e-3;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during Follower operation.
#[derive(Debug, thiserror::Error)]
pub enum FollowerError {
    #[error("Cannot load the follower parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Cannot start following an empty route")]
    EmptyRoute,

    #[error("Cannot start a new behaviour while another is active ({0:?}), stop first")]
    NotIdle(Phase),

    #[error("No follow-point behaviour is active to update")]
    NotFollowingPoint,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(all(test, feature = "sim"))]
mod sim_test {
    use super::*;
    use crate::actuation::MotionController;
    use crate::sim::SimVehicle;
    use util::module::State;
    use veh_if::{kin::VehicleKin, pose::PosPoint};

    fn wp(x_m: f64, y_m: f64, speed_ms: f64) -> PosPoint {
        PosPoint {
            x_m,
            y_m,
            speed_ms,
            ..Default::default()
        }
    }

    /// Run one closed-loop control cycle: follower tick against the sim
    /// pose, demand applied to the sim, sim integrated forward.
    fn cycle(follower: &mut Follower, sim: &SimVehicle, dt_s: f64) -> Demand {
        let input = InputData {
            pose: sim.pose(),
            trailer_hitch_angle_rad: sim.trailer_hitch_angle_rad(),
        };

        let (demand, _) = follower.proc(&input).unwrap();

        match demand {
            Demand::Drive(d) => {
                sim.set_speed(d.speed_ms).unwrap();
                sim.set_steering_curvature(d.curv_m).unwrap();
            }
            Demand::Hold | Demand::Idle => {
                sim.set_speed(0.0).unwrap();
                sim.set_steering_curvature(0.0).unwrap();
            }
        }

        sim.step(dt_s);

        demand
    }

    #[test]
    fn test_route_traversal_closed_loop() {
        let mut follower = Follower::default();
        follower.add_route(&[
            wp(2.0, 0.0, 1.0),
            wp(4.0, 1.0, 1.0),
            wp(6.0, 0.0, 1.0),
        ]);
        follower.start_following_route(true).unwrap();

        let sim = SimVehicle::new(VehicleKin::Ackermann { wheelbase_m: 0.32 });

        // 60 s of sim time at 50 ms ticks is plenty for a 7 m route at 1 m/s
        for _ in 0..1200 {
            cycle(&mut follower, &sim, 0.05);

            if follower.phase == Phase::FollowRouteFinished {
                break;
            }
        }

        assert_eq!(follower.phase, Phase::FollowRouteFinished);

        // The vehicle ends up near the final waypoint
        let pose = sim.pose().unwrap();
        assert!(pose.distance_2d_to(&wp(6.0, 0.0, 0.0)) < 1.5);
    }

    #[test]
    fn test_trailered_traversal_stays_stable() {
        let kin = VehicleKin::Trailered {
            wheelbase_m: 0.32,
            trailer_wheelbase_m: 0.715,
        };

        let mut follower = Follower::default();
        follower.params.vehicle_kin = kin;
        follower.add_route(&[
            wp(3.0, 0.0, 1.0),
            wp(6.0, 1.0, 1.0),
            wp(9.0, 0.0, 1.0),
        ]);
        follower.start_following_route(true).unwrap();

        let sim = SimVehicle::new(kin);

        let mut max_hitch_rad: f64 = 0.0;
        for _ in 0..2400 {
            cycle(&mut follower, &sim, 0.05);
            max_hitch_rad = max_hitch_rad.max(sim.trailer_hitch_angle_rad().unwrap().abs());

            if follower.phase == Phase::FollowRouteFinished {
                break;
            }
        }

        assert_eq!(follower.phase, Phase::FollowRouteFinished);

        // The trailer never approaches a jack-knife on gentle curves
        assert!(max_hitch_rad < 0.8);
    }

    #[test]
    fn test_repeat_route_wraps_closed_loop() {
        let mut follower = Follower::default();
        follower.params.repeat_route = true;
        follower.add_route(&[wp(2.0, 0.0, 1.0), wp(4.0, 1.0, 1.0)]);
        follower.start_following_route(true).unwrap();

        let sim = SimVehicle::new(VehicleKin::Ackermann { wheelbase_m: 0.32 });

        // A repeating route never finishes, and the index wraps back
        let mut saw_wrap = false;
        let mut last_index = 0;
        for _ in 0..2400 {
            cycle(&mut follower, &sim, 0.05);

            let index = follower.report.current_wp_index;
            if index < last_index {
                saw_wrap = true;
            }
            last_index = index;

            assert_ne!(follower.phase, Phase::FollowRouteFinished);
        }

        assert!(saw_wrap);
    }
}
