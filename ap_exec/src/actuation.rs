//! # Actuation dispatch
//!
//! Demands computed by the follower are dispatched to an actuation sink:
//! either an in-process motion controller (the sim vehicle) or the remote
//! vehicle server reached through the demands client. The sink is chosen at
//! construction and fixed for the life of the executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::dems_client::{DemsClient, DemsClientError};
use veh_if::dems::{DemsResponse, VehicleDems};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible errors in dispatching a demand to the actuation sink.
#[derive(thiserror::Error, Debug)]
pub enum ActuationError {
    #[error("Could not send the demands to the vehicle server: {0}")]
    SendError(DemsClientError),

    #[error("The vehicle server rejected the demands")]
    DemsRejected,

    #[error("The motion controller failed to execute the demand: {0}")]
    ControllerError(String),
}

/// The destination for actuation demands.
pub enum ActuationSink {
    /// Demands are executed by an in-process motion controller.
    Local(Box<dyn MotionController>),

    /// Demands are sent to the remote vehicle server.
    Remote(DemsClient),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An in-process controller which can execute speed and curvature demands.
pub trait MotionController {
    /// Demand a vehicle speed.
    ///
    /// Units: meters/second
    fn set_speed(&self, speed_ms: f64) -> Result<(), ActuationError>;

    /// Demand a steering curvature, positive turning to the right.
    ///
    /// Units: 1/meters
    fn set_steering_curvature(&self, curv_m: f64) -> Result<(), ActuationError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActuationSink {
    /// Execute a drive demand.
    ///
    /// A missing acknowledgement from the remote server is not an error,
    /// the next cycle re-issues a fresh demand anyway.
    pub fn apply_control(&mut self, dems: &VehicleDems) -> Result<(), ActuationError> {
        match self {
            ActuationSink::Local(controller) => {
                controller.set_speed(dems.speed_ms)?;
                controller.set_steering_curvature(dems.curv_m)
            }
            ActuationSink::Remote(client) => match client.send_demands(dems) {
                Ok(Some(DemsResponse::DemsInvalid)) => Err(ActuationError::DemsRejected),
                Ok(_) => Ok(()),
                Err(e) => Err(ActuationError::SendError(e)),
            },
        }
    }

    /// Bring the vehicle to a stop and keep it there.
    pub fn hold_position(&mut self) -> Result<(), ActuationError> {
        self.apply_control(&VehicleDems::hold())
    }
}
