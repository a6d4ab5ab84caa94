//! # Pose and position types
//!
//! Defines the pose types shared between the autopilot, the pose provider and
//! any telemetry consumers. All positions are expressed in a local ENU-like
//! metric frame with yaw measured anticlockwise from the frame's +x axis.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A timestamped position and attitude sample in the local frame.
///
/// A route waypoint is a `PosPoint` whose `speed_ms` field carries the target
/// speed at that point.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct PosPoint {
    /// Position along the local frame's x axis.
    ///
    /// Units: meters
    pub x_m: f64,

    /// Position along the local frame's y axis.
    ///
    /// Units: meters
    pub y_m: f64,

    /// Height above the local frame's origin.
    ///
    /// Units: meters
    pub height_m: f64,

    /// Yaw angle, anticlockwise from the frame's +x axis.
    ///
    /// Units: degrees
    pub yaw_deg: f64,

    /// One-sigma position uncertainty, zero if unknown.
    ///
    /// Units: meters
    pub sigma_m: f64,

    /// Speed over ground at this point, or the target speed if this point is
    /// a route waypoint. Positive speeds are forwards, negative backwards.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Time at which this sample was taken, `None` for synthetic points such
    /// as waypoints.
    pub timestamp_utc: Option<DateTime<Utc>>,

    /// Opaque per-point attribute bitmask, passed through untouched.
    pub attributes: u32,
}

/// Pose telemetry message published by a pose provider.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct PoseTm {
    /// The position source this sample came from
    pub pos_type: PosType,

    /// The pose sample itself
    pub pose: PosPoint,

    /// Current trailer hitch angle, `None` if the vehicle tows no trailer.
    ///
    /// Units: radians, positive when the trailer sits anticlockwise of the
    /// vehicle's heading.
    pub trailer_hitch_angle_rad: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Identifies which estimator a position sample came from.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "lowercase")]
pub enum PosType {
    /// Position from the simulation vehicle
    Simulated,

    /// Fused estimate combining odometry and absolute positioning
    Fused,

    /// Dead-reckoned odometry alone
    Odom,

    /// Raw GNSS fix
    Gnss,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PosPoint {
    /// Yaw angle in radians.
    pub fn yaw_rad(&self) -> f64 {
        self.yaw_deg.to_radians()
    }

    /// Horizontal (xy plane) distance to another point.
    ///
    /// Units: meters
    pub fn distance_2d_to(&self, other: &PosPoint) -> f64 {
        ((self.x_m - other.x_m).powi(2) + (self.y_m - other.y_m).powi(2)).sqrt()
    }
}

impl Default for PosType {
    fn default() -> Self {
        PosType::Fused
    }
}
