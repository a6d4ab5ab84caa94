//! # Vehicle interface crate.
//!
//! Provides all common interfaces between the autopilot and its vehicle:
//! pose and kinematics types, autopilot commands and responses, actuation
//! demands, and the networking layer they travel over.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Autopilot command and response definitions
pub mod cmd;

/// Actuation demand definitions
pub mod dems;

/// Vehicle kinematic parameter definitions
pub mod kin;

/// Network module
pub mod net;

/// Pose and position types
pub mod pose;
