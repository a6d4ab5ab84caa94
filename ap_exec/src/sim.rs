//! # Simulated vehicle
//!
//! A kinematic simulation standing in for the real vehicle, enabled by the
//! `sim` feature. The executive steps it once per cycle, reads its pose in
//! place of the pose provider and drives it as the local actuation sink.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use chrono::Utc;
use std::sync::{Arc, Mutex};

// Internal
use crate::actuation::{ActuationError, MotionController};
use veh_if::{kin::VehicleKin, pose::PosPoint};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Kinematic state of the simulated vehicle in the local frame.
#[derive(Clone, Copy, Default, Debug)]
struct SimState {
    x_m: f64,
    y_m: f64,
    yaw_rad: f64,

    /// Hitch angle, vehicle yaw minus trailer yaw.
    hitch_rad: f64,

    speed_ms: f64,
    curv_m: f64,
}

/// A simulated vehicle integrating demanded speed and curvature into a pose.
///
/// Clones share the same underlying state: the executive keeps one clone as
/// the motion controller and another as the pose source.
#[derive(Clone)]
pub struct SimVehicle {
    state: Arc<Mutex<SimState>>,
    kin: VehicleKin,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimVehicle {
    /// Create a new simulated vehicle at the origin.
    pub fn new(kin: VehicleKin) -> Self {
        SimVehicle {
            state: Arc::new(Mutex::new(SimState::default())),
            kin,
        }
    }

    /// Advance the simulation by one timestep.
    pub fn step(&self, dt_s: f64) {
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(_) => return,
        };

        // Positive curvature turns the vehicle clockwise
        let yaw_rate_rads = -state.speed_ms * state.curv_m;

        state.x_m += state.speed_ms * state.yaw_rad.cos() * dt_s;
        state.y_m += state.speed_ms * state.yaw_rad.sin() * dt_s;
        state.yaw_rad += yaw_rate_rads * dt_s;

        // Single-axle trailer towed at the hitch
        if let VehicleKin::Trailered {
            trailer_wheelbase_m,
            ..
        } = self.kin
        {
            let trailer_yaw_rate_rads =
                state.speed_ms * state.hitch_rad.sin() / trailer_wheelbase_m;
            state.hitch_rad += (yaw_rate_rads - trailer_yaw_rate_rads) * dt_s;
        }
    }

    /// The simulated pose, as a pose provider would report it.
    pub fn pose(&self) -> Option<PosPoint> {
        let state = self.state.lock().ok()?;

        Some(PosPoint {
            x_m: state.x_m,
            y_m: state.y_m,
            yaw_deg: state.yaw_rad.to_degrees(),
            speed_ms: state.speed_ms,
            timestamp_utc: Some(Utc::now()),
            ..Default::default()
        })
    }

    /// The simulated hitch angle, `None` for vehicles without a trailer.
    pub fn trailer_hitch_angle_rad(&self) -> Option<f64> {
        if !self.kin.has_trailer() {
            return None;
        }

        self.state.lock().ok().map(|s| s.hitch_rad)
    }
}

impl MotionController for SimVehicle {
    fn set_speed(&self, speed_ms: f64) -> Result<(), ActuationError> {
        match self.state.lock() {
            Ok(mut s) => {
                s.speed_ms = speed_ms;
                Ok(())
            }
            Err(e) => Err(ActuationError::ControllerError(e.to_string())),
        }
    }

    fn set_steering_curvature(&self, curv_m: f64) -> Result<(), ActuationError> {
        match self.state.lock() {
            Ok(mut s) => {
                s.curv_m = curv_m;
                Ok(())
            }
            Err(e) => Err(ActuationError::ControllerError(e.to_string())),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_straight_line_integration() {
        let sim = SimVehicle::new(VehicleKin::Ackermann { wheelbase_m: 0.32 });
        sim.set_speed(1.0).unwrap();
        sim.set_steering_curvature(0.0).unwrap();

        for _ in 0..100 {
            sim.step(0.01);
        }

        let pose = sim.pose().unwrap();
        assert!((pose.x_m - 1.0).abs() < 1e-9);
        assert!(pose.y_m.abs() < 1e-9);
        assert!(pose.yaw_deg.abs() < 1e-9);
    }

    #[test]
    fn test_right_turn_decreases_yaw() {
        let sim = SimVehicle::new(VehicleKin::Ackermann { wheelbase_m: 0.32 });
        sim.set_speed(1.0).unwrap();
        sim.set_steering_curvature(1.0).unwrap();

        for _ in 0..50 {
            sim.step(0.01);
        }

        let pose = sim.pose().unwrap();
        assert!(pose.yaw_deg < 0.0);
        assert!(pose.y_m < 0.0);
    }

    #[test]
    fn test_trailer_hitch_follows_turns() {
        let sim = SimVehicle::new(VehicleKin::Trailered {
            wheelbase_m: 0.32,
            trailer_wheelbase_m: 0.715,
        });
        sim.set_speed(1.0).unwrap();
        sim.set_steering_curvature(0.5).unwrap();

        // In a steady right turn the hitch settles where the trailer's yaw
        // rate matches the vehicle's: sin(hitch) = -curv * wheelbase
        for _ in 0..2000 {
            sim.step(0.01);
        }
        let expected_rad = -(0.5f64 * 0.715).asin();
        assert!((sim.trailer_hitch_angle_rad().unwrap() - expected_rad).abs() < 1e-3);

        // Driving straight pulls the trailer back in line
        sim.set_steering_curvature(0.0).unwrap();
        for _ in 0..2000 {
            sim.step(0.01);
        }
        assert!(sim.trailer_hitch_angle_rad().unwrap().abs() < 1e-3);
    }

    #[test]
    fn test_no_trailer_reports_no_hitch() {
        let sim = SimVehicle::new(VehicleKin::Differential);
        assert!(sim.trailer_hitch_angle_rad().is_none());
    }
}
