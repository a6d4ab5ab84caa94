//! # Vehicle Actuation Demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands that are sent from the autopilot to a vehicle actuation server.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleDems {
    /// The demanded vehicle speed.
    ///
    /// Positive speeds are "forwards", negative speeds are "backwards".
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// The demanded steering curvature.
    ///
    /// Positive curvature is a turn to the right (clockwise viewed from
    /// above), negative curvature a turn to the left.
    ///
    /// Units: 1/meters
    pub curv_m: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Response from the vehicle actuation server based on the demands sent by
/// the client.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum DemsResponse {
    /// Demands were valid and will be executed
    DemsOk,

    /// Demands were invalid and have been rejected
    DemsInvalid,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VehicleDems {
    /// The hold-position demand: zero speed, neutral steering.
    pub fn hold() -> Self {
        Self {
            speed_ms: 0.0,
            curv_m: 0.0,
        }
    }
}
