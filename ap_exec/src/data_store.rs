//! # Data Store

use veh_if::pose::{PosPoint, PosType};

use crate::follower;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time
    pub session_time_s: f64,

    // Position
    /// The position source the autopilot is driving on
    pub pos_type_used: PosType,

    /// Latest pose of the vehicle, `None` if no estimate is available yet
    pub pose: Option<PosPoint>,

    /// Latest trailer hitch angle, `None` if the vehicle tows no trailer
    pub trailer_hitch_angle_rad: Option<f64>,

    // Follower
    pub follower: follower::Follower,
    pub follower_input: follower::InputData,
    pub follower_demand: follower::Demand,
    pub follower_status_rpt: follower::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive actuation errors
    pub num_consec_actuation_errors: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = is_1_hz_boundary(self.num_cycles, cycle_frequency_hz);

        self.follower_input = follower::InputData::default();
        self.follower_demand = follower::Demand::default();
        self.follower_status_rpt = follower::StatusReport::default();

        self.session_time_s = util::session::get_elapsed_seconds();
    }
}

/// True if the given cycle number falls on a 1Hz boundary.
///
/// Rates at or below 1Hz put every cycle on a boundary.
fn is_1_hz_boundary(num_cycles: u128, cycle_frequency_hz: f64) -> bool {
    num_cycles % (cycle_frequency_hz as u128).max(1) == 0
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_1_hz_boundary_at_20_hz() {
        let boundaries: Vec<u128> = (0..41).filter(|c| is_1_hz_boundary(*c, 20.0)).collect();

        assert_eq!(boundaries, vec![0, 20, 40]);
    }

    /// A cycle period longer than a second gives a fractional cycle rate, which must mark every
    /// cycle as a 1Hz boundary rather than faulting the cycle accounting.
    #[test]
    fn test_1_hz_boundary_below_1_hz() {
        for c in 0..5 {
            assert!(is_1_hz_boundary(c, 1.0 / 1.5));
            assert!(is_1_hz_boundary(c, 0.25));
        }
    }
}
