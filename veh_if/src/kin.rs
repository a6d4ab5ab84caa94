//! # Vehicle kinematic parameters
//!
//! Static description of the vehicle the autopilot is driving. The dynamic
//! trailer hitch angle is not part of this type, it is sampled each cycle
//! from the pose provider.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Kinematic class of the vehicle, with the static geometry each class needs.
///
/// The pursuit geometry selects its curvature law by matching on this enum.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VehicleKin {
    /// A car-like vehicle with front wheel steering.
    Ackermann {
        /// Distance between the front and rear axles.
        ///
        /// Units: meters
        wheelbase_m: f64,
    },

    /// A differential-drive vehicle, steered by wheel speed difference.
    Differential,

    /// A car-like vehicle towing a single-axle trailer.
    Trailered {
        /// Distance between the towing vehicle's front and rear axles.
        ///
        /// Units: meters
        wheelbase_m: f64,

        /// Distance from the hitch point to the trailer axle.
        ///
        /// Units: meters
        trailer_wheelbase_m: f64,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VehicleKin {
    /// True if the vehicle tows a trailer.
    pub fn has_trailer(&self) -> bool {
        matches!(self, VehicleKin::Trailered { .. })
    }

    /// The towing vehicle's wheelbase, `None` for classes without one.
    pub fn wheelbase_m(&self) -> Option<f64> {
        match self {
            VehicleKin::Ackermann { wheelbase_m } => Some(*wheelbase_m),
            VehicleKin::Differential => None,
            VehicleKin::Trailered { wheelbase_m, .. } => Some(*wheelbase_m),
        }
    }

    /// The trailer's hitch-to-axle distance, `None` if no trailer is towed.
    pub fn trailer_wheelbase_m(&self) -> Option<f64> {
        match self {
            VehicleKin::Trailered {
                trailer_wheelbase_m,
                ..
            } => Some(*trailer_wheelbase_m),
            _ => None,
        }
    }
}

impl Default for VehicleKin {
    fn default() -> Self {
        VehicleKin::Ackermann { wheelbase_m: 0.32 }
    }
}
