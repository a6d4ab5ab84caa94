//! # Autopilot library.
//!
//! This library exposes the autopilot's modules so that other crates in the
//! workspace (and the benches) can access items defined inside the autopilot
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuation dispatch - routes demands to a local controller or a remote vehicle server
pub mod actuation;

/// Command server - receives autopilot commands from an operator
pub mod cmd_server;

/// Global data store for the executable
pub mod data_store;

/// Demands client - sends actuation demands to a remote vehicle server
pub mod dems_client;

/// Follower module - the waypoint-following state machine
pub mod follower;

/// Executable-level parameters
pub mod params;

/// Pose client - receives pose telemetry from a pose provider
pub mod pose_client;

/// Pursuit geometry - pure curvature, goal and speed computations
pub mod pursuit;

/// Route store - the ordered waypoint sequence the follower drives along
pub mod route;

/// Simulation vehicle - kinematic model standing in for a real vehicle
#[cfg(feature = "sim")]
pub mod sim;

/// Telemetry server - publishes the autopilot state once per cycle
pub mod tm_server;
