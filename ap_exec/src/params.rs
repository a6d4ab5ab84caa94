//! # Autopilot Executable Parameters
//!
//! This module provides parameters for the autopilot executable. The
//! defaults run a self-contained sim session on localhost endpoints.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use veh_if::pose::PosType;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
pub struct ApExecParams {
    /// Network endpoint on which autopilot commands are served
    pub cmd_endpoint: String,

    /// Network endpoint of the vehicle actuation (demands) server
    pub dems_endpoint: String,

    /// Network endpoint of the pose provider's publisher
    pub pose_endpoint: String,

    /// Network endpoint on which telemetry is published
    pub tm_endpoint: String,

    /// Target period of one control cycle.
    ///
    /// Units: milliseconds
    pub cycle_period_ms: u64,

    /// Which pose source the follower drives against.
    pub pos_type_used: PosType,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ApExecParams {
    fn default() -> Self {
        ApExecParams {
            cmd_endpoint: String::from("tcp://*:5020"),
            dems_endpoint: String::from("tcp://localhost:5021"),
            pose_endpoint: String::from("tcp://localhost:5022"),
            tm_endpoint: String::from("tcp://*:5023"),
            cycle_period_ms: 50,
            pos_type_used: PosType::default(),
        }
    }
}
