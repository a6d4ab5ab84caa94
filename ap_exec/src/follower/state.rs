//! Implementations for the Follower state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use std::time::Instant;

// Internal
use super::{FollowerError, Params, GOAL_COINCIDENT_LIMIT_M};
use crate::pursuit;
use crate::route::Route;
use util::{
    archive::{Archived, Archiver},
    module::State,
    params, session,
    session::Session,
};
use veh_if::{dems::VehicleDems, pose::PosPoint};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Follower state machine module state
#[derive(Default)]
pub struct Follower {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    /// The route being followed.
    pub(crate) route: Route,

    /// Current lifecycle phase.
    pub(crate) phase: Phase,

    /// Index of the waypoint currently headed for. Equal to the route length
    /// once the final waypoint has been passed.
    pub(crate) current_wp_index: usize,

    /// The goal currently being pursued. Route goals are in the local frame,
    /// follow-point goals in the vehicle frame.
    pub(crate) current_goal: Option<PosPoint>,

    /// The latest follow-point target (vehicle frame) and the instant it
    /// arrived.
    pub(crate) follow_point_target: Option<(PosPoint, Instant)>,

    /// Whether the next route start shall begin at the first waypoint rather
    /// than the nearest one.
    pub(crate) start_from_beginning: bool,

    /// Set by `stop`, guarantees a single hold demand before going idle.
    pub(crate) stop_pending: bool,

    pub(crate) output: Option<Demand>,
    arch_dems: Archiver,
}

/// Input data to the Follower.
#[derive(Clone, Copy, Default, Debug)]
pub struct InputData {
    /// The vehicle pose to follow routes against, or `None` if no valid
    /// pose is available this cycle.
    pub pose: Option<PosPoint>,

    /// The measured trailer hitch angle, `None` when the vehicle has no
    /// trailer or the measurement is unavailable.
    ///
    /// Units: radians
    pub trailer_hitch_angle_rad: Option<f64>,
}

/// Status report for Follower processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Lifecycle phase at the end of the tick.
    pub phase: Phase,

    /// Whether the follower is actively controlling the vehicle.
    pub active: bool,

    /// Whether a pose was available this tick.
    pub pose_valid: bool,

    /// Index of the waypoint currently headed for.
    pub current_wp_index: usize,

    /// Number of waypoints in the route.
    pub route_len: usize,

    /// Distance left to drive to the end of the route, reported in the
    /// route-following phases while a pose is available.
    ///
    /// Units: meters
    pub remaining_route_dist_m: Option<f64>,

    /// Whether the follow-point target is stale or absent, meaningful in the
    /// follow-point phases.
    pub follow_point_stale: bool,

    /// x position of the current goal, if one is set.
    ///
    /// Units: meters
    pub goal_x_m: Option<f64>,

    /// y position of the current goal, if one is set.
    ///
    /// Units: meters
    pub goal_y_m: Option<f64>,
}

/// A timestamped record of an issued demand, written to the demand archive.
#[derive(Clone, Copy, Serialize, Debug)]
struct DemsRecord {
    /// Session time at which the demand was issued.
    ///
    /// Units: seconds
    time_s: f64,

    /// The demanded vehicle speed.
    ///
    /// Units: meters/second
    speed_ms: f64,

    /// The demanded steering curvature.
    ///
    /// Units: 1/meters
    curv_m: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Lifecycle phase of the Follower.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Idle, the autopilot is not controlling the vehicle.
    None,

    /// A route start has been commanded, the starting waypoint is selected
    /// on the next tick.
    FollowRouteInit,

    /// Driving towards the starting waypoint at that waypoint's speed.
    FollowRouteGotoBegin,

    /// Following the route by pure pursuit.
    FollowRouteFollowing,

    /// The final waypoint has been passed, holding position.
    FollowRouteFinished,

    /// Follow-point behaviour active but no fresh target, holding position.
    FollowPointWaiting,

    /// Pursuing the follow-point target.
    FollowPointFollowing,
}

/// Output demand from the Follower that the actuation sink must execute.
#[derive(Clone, Copy, Serialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Demand {
    /// Drive with the given speed and steering curvature.
    Drive(VehicleDems),

    /// Actively hold position: zero speed, neutral steering.
    Hold,

    /// No actuation at all, the vehicle is not under autopilot control.
    Idle,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for Phase {
    fn default() -> Self {
        Phase::None
    }
}

impl Default for Demand {
    fn default() -> Self {
        Demand::Idle
    }
}

impl State for Follower {
    type InitData = &'static str;
    type InitError = FollowerError;

    type InputData = InputData;
    type OutputData = Demand;
    type StatusReport = StatusReport;
    type ProcError = FollowerError;

    /// Initialise the Follower module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        // Load the parameters
        self.params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(FollowerError::ParamLoadError(e)),
        };

        self.params.validate()?;

        // Snapshot the as-run parameters into the session
        session.save("follower_params.json", self.params.clone());

        // Create the arch folder for the follower
        let mut arch_path = session.arch_root.clone();
        arch_path.push("follower");
        std::fs::create_dir_all(arch_path).unwrap();

        // Initialise the archivers
        self.arch_report = Archiver::from_path(session, "follower/status_report.csv").unwrap();
        self.arch_dems = Archiver::from_path(session, "follower/dems.csv").unwrap();

        Ok(())
    }

    /// Perform cyclic processing of the Follower.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        let output = if self.stop_pending {
            // A stop promises at least one hold demand before going idle
            self.stop_pending = false;
            Demand::Hold
        } else {
            match self.phase {
                Phase::None => Demand::Idle,
                Phase::FollowRouteInit => self.tick_route_init(input_data)?,
                Phase::FollowRouteGotoBegin => self.tick_goto_begin(input_data),
                Phase::FollowRouteFollowing => self.tick_following(input_data),
                Phase::FollowRouteFinished => Demand::Hold,
                Phase::FollowPointWaiting | Phase::FollowPointFollowing => {
                    self.tick_follow_point(input_data)
                }
            }
        };

        self.fill_report(input_data);

        trace!("Follower phase {:?}, demand {:?}", self.phase, output);

        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for Follower {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;

        // Idle produces no demand record, holds are recorded as zero demands
        let dems = match self.output {
            Some(Demand::Drive(d)) => Some(d),
            Some(Demand::Hold) => Some(VehicleDems::hold()),
            Some(Demand::Idle) | None => None,
        };

        if let Some(d) = dems {
            self.arch_dems.serialise(DemsRecord {
                time_s: session::get_elapsed_seconds(),
                speed_ms: d.speed_ms,
                curv_m: d.curv_m,
            })?;
        }

        Ok(())
    }
}

impl Follower {
    /// Issue a drive demand taking the vehicle to a goal in the local frame.
    ///
    /// The goal becomes the current goal and its `speed_ms` is the demanded
    /// speed. A goal coincident with the vehicle yields a hold demand, the
    /// curvature law is singular there.
    pub(crate) fn drive_to_goal(
        &mut self,
        pose: &PosPoint,
        goal: PosPoint,
        trailer_hitch_angle_rad: Option<f64>,
    ) -> Demand {
        self.current_goal = Some(goal);

        let goal_vf = pursuit::enu_to_vehicle_frame(pose, &pursuit::xy(&goal));

        if goal_vf.coords.norm() < GOAL_COINCIDENT_LIMIT_M {
            return Demand::Hold;
        }

        let curv_m = pursuit::curv_to_goal(
            &self.params.vehicle_kin,
            &goal_vf,
            trailer_hitch_angle_rad,
            self.params.pursuit_radius_m,
            goal.speed_ms,
        );

        Demand::Drive(VehicleDems {
            speed_ms: goal.speed_ms,
            curv_m,
        })
    }

    /// Fill the status report from the post-tick state.
    fn fill_report(&mut self, input_data: &InputData) {
        self.report = StatusReport {
            phase: self.phase,
            active: self.is_active(),
            pose_valid: input_data.pose.is_some(),
            current_wp_index: self.current_wp_index,
            route_len: self.route.len(),
            remaining_route_dist_m: self.remaining_route_dist_m(&input_data.pose),
            follow_point_stale: match self.phase {
                Phase::FollowPointWaiting | Phase::FollowPointFollowing => {
                    self.fresh_follow_point_target().is_none()
                }
                _ => false,
            },
            goal_x_m: self.current_goal.map(|g| g.x_m),
            goal_y_m: self.current_goal.map(|g| g.y_m),
        };
    }

    /// Distance left to the end of the route, through the current waypoint.
    fn remaining_route_dist_m(&self, pose: &Option<PosPoint>) -> Option<f64> {
        match self.phase {
            Phase::FollowRouteGotoBegin | Phase::FollowRouteFollowing => {
                let pose = (*pose)?;
                let wp = self.route.get(self.current_wp_index)?;

                Some(pose.distance_2d_to(wp) + self.route.remaining_length_m(self.current_wp_index))
            }
            Phase::FollowRouteFinished => Some(0.0),
            _ => None,
        }
    }
}
