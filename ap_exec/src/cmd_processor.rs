//! # Command processor module
//!
//! The command processor handles commands coming from the command server and
//! routes them to the follower.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use ap_lib::data_store::DataStore;
use ap_lib::follower::FollowerError;
use veh_if::cmd::{AutopilotCmd, CmdResponse};

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Execute a command.
///
/// Mutates the datastore to send commands to the follower, and returns the
/// response to send back to the operator.
pub(crate) fn exec(ds: &mut DataStore, cmd: &AutopilotCmd) -> CmdResponse {
    // Handle the different commands
    match cmd {
        AutopilotCmd::AddWaypoint { point } => {
            debug!("Recieved AddWaypoint command");
            ds.follower.add_waypoint(*point);
            CmdResponse::Ok
        }
        AutopilotCmd::AddRoute { points } => {
            debug!("Recieved AddRoute command ({} points)", points.len());
            ds.follower.add_route(points);
            CmdResponse::Ok
        }
        AutopilotCmd::ClearRoute => {
            debug!("Recieved ClearRoute command");
            ds.follower.clear_route();
            CmdResponse::Ok
        }
        AutopilotCmd::StartFollowingRoute { from_beginning } => {
            debug!("Recieved StartFollowingRoute command");
            match ds.follower.start_following_route(*from_beginning) {
                Ok(()) => CmdResponse::Ok,
                Err(e) => reject(e),
            }
        }
        AutopilotCmd::StartFollowPoint => {
            debug!("Recieved StartFollowPoint command");
            match ds.follower.start_follow_point() {
                Ok(()) => CmdResponse::Ok,
                Err(e) => reject(e),
            }
        }
        // No log, target updates arrive at up to the cycle rate
        AutopilotCmd::UpdateFollowPoint { point } => {
            match ds.follower.update_follow_point(*point) {
                Ok(()) => CmdResponse::Ok,
                Err(e) => reject(e),
            }
        }
        AutopilotCmd::Stop => {
            debug!("Recieved Stop command");
            ds.follower.stop();
            CmdResponse::Ok
        }
        AutopilotCmd::ResetState => {
            debug!("Recieved ResetState command");
            ds.follower.reset_state();
            CmdResponse::Ok
        }
        AutopilotCmd::SetPursuitRadius { radius_m } => {
            debug!("Recieved SetPursuitRadius command");
            match ds.follower.set_pursuit_radius(*radius_m) {
                Ok(()) => CmdResponse::Ok,
                Err(e) => reject(e),
            }
        }
        AutopilotCmd::SetFollowPointSpeed { speed_ms } => {
            debug!("Recieved SetFollowPointSpeed command");
            match ds.follower.set_follow_point_speed(*speed_ms) {
                Ok(()) => CmdResponse::Ok,
                Err(e) => reject(e),
            }
        }
        AutopilotCmd::SetRepeatRoute { repeat } => {
            debug!("Recieved SetRepeatRoute command");
            ds.follower.set_repeat_route(*repeat);
            CmdResponse::Ok
        }
        AutopilotCmd::SetPosTypeUsed { pos_type } => {
            debug!("Recieved SetPosTypeUsed command");
            ds.pos_type_used = *pos_type;
            CmdResponse::Ok
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Map a follower rejection onto the response sent back to the operator.
fn reject(e: FollowerError) -> CmdResponse {
    warn!("Command rejected: {}", e);

    match e {
        FollowerError::InvalidParam(_) => CmdResponse::Invalid,
        _ => CmdResponse::CannotExecute,
    }
}
