//! # Autopilot commands
//!
//! Commands are sent to the autopilot as JSON over the command socket. Each
//! command receives exactly one [`CmdResponse`] in reply.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pose::{PosPoint, PosType};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An instruction sent to the autopilot by an operator or companion process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AutopilotCmd {
    /// Append a single waypoint to the end of the route.
    ///
    /// Always accepted, including while the route is being followed.
    AddWaypoint {
        /// The waypoint to append. Its `speed_ms` is the target speed at the
        /// waypoint.
        point: PosPoint,
    },

    /// Append a sequence of waypoints to the end of the route, preserving
    /// their order.
    AddRoute {
        /// The waypoints to append
        points: Vec<PosPoint>,
    },

    /// Discard all waypoints.
    ///
    /// If the route is currently being followed the autopilot stops and
    /// returns to the idle state.
    ClearRoute,

    /// Begin following the stored route.
    ///
    /// Rejected with `CannotExecute` if the route is empty.
    StartFollowingRoute {
        /// If true traversal starts at waypoint 0, otherwise at the waypoint
        /// nearest the vehicle.
        from_beginning: bool,
    },

    /// Begin follow-point mode.
    ///
    /// The autopilot holds position until the first `UpdateFollowPoint`
    /// arrives, and resumes holding whenever the target goes stale.
    StartFollowPoint,

    /// Supply a new follow-point target.
    ///
    /// The point is expressed in the vehicle's own frame (vehicle at the
    /// origin, heading along +x), so follow-point mode works without any
    /// absolute positioning.
    UpdateFollowPoint {
        /// The target, in the vehicle frame
        point: PosPoint,
    },

    /// Stop the vehicle and return the autopilot to the idle state.
    ///
    /// Valid in every state. The route and its progress are retained.
    Stop,

    /// Stop the vehicle, return to idle and clear route progress, the
    /// current goal and the follow-point target. The route itself is kept.
    ResetState,

    /// Change the pursuit radius.
    ///
    /// Rejected with `Invalid` unless the radius is strictly positive.
    SetPursuitRadius {
        /// New pursuit radius.
        ///
        /// Units: meters
        radius_m: f64,
    },

    /// Change the follow-point approach speed.
    ///
    /// Rejected with `Invalid` if the speed is negative.
    SetFollowPointSpeed {
        /// New approach speed.
        ///
        /// Units: meters/second
        speed_ms: f64,
    },

    /// Enable or disable route repetition. When enabled, reaching the last
    /// waypoint restarts traversal at waypoint 0 instead of finishing.
    SetRepeatRoute {
        /// True to repeat the route indefinitely
        repeat: bool,
    },

    /// Select which position source the autopilot drives on.
    SetPosTypeUsed {
        /// The position source to use
        pos_type: PosType,
    },
}

/// Response to an [`AutopilotCmd`], sent back over the command socket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub enum CmdResponse {
    /// Command accepted and executed
    Ok,

    /// Command is well formed but cannot execute in the current state
    CannotExecute,

    /// Command is malformed or carries an out-of-range value
    Invalid,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum CmdParseError {
    #[error("Command contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AutopilotCmd {
    /// Parse a new command from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, CmdParseError> {
        serde_json::from_str(json_str).map_err(CmdParseError::InvalidJson)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cmd_from_json() {
        let cmd = AutopilotCmd::from_json(
            r#"{"StartFollowingRoute": {"from_beginning": true}}"#,
        )
        .unwrap();

        match cmd {
            AutopilotCmd::StartFollowingRoute { from_beginning } => {
                assert!(from_beginning)
            }
            c => panic!("Parsed the wrong command: {:?}", c),
        }

        let cmd = AutopilotCmd::from_json(
            r#"{"AddWaypoint": {"point": {
                "x_m": 1.0, "y_m": -2.5, "height_m": 0.0, "yaw_deg": 0.0,
                "sigma_m": 0.0, "speed_ms": 1.2, "timestamp_utc": null,
                "attributes": 0
            }}}"#,
        )
        .unwrap();

        match cmd {
            AutopilotCmd::AddWaypoint { point } => {
                assert_eq!(point.x_m, 1.0);
                assert_eq!(point.y_m, -2.5);
                assert_eq!(point.speed_ms, 1.2);
            }
            c => panic!("Parsed the wrong command: {:?}", c),
        }

        assert!(AutopilotCmd::from_json("{\"NotACommand\": 1}").is_err());
    }
}
