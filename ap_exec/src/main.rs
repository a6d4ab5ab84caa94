//! Main autopilot executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Pose acquisition
//!         - Command processing and handling
//!         - Follower processing
//!         - Actuation dispatch
//!         - Telemetry output
//!
//! # Modules
//!
//! All modules (e.g. `follower`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

#[cfg(not(feature = "sim"))]
use ap_lib::dems_client::DemsClient;
#[cfg(not(feature = "sim"))]
use ap_lib::pose_client::PoseClient;
#[cfg(feature = "sim")]
use ap_lib::sim::SimVehicle;
use ap_lib::{
    actuation::ActuationSink,
    cmd_server::{CmdServer, CmdServerError},
    data_store::DataStore,
    follower::{self, Phase},
    params::ApExecParams,
    tm_server::TmServer,
};

mod cmd_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{error, info, warn};
use std::thread;
use std::time::{Duration, Instant};
use veh_if::net::zmq;

// Internal
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Limit of the number of consecutive actuation errors before an error is
/// raised in the log.
const MAX_ACTUATION_ERROR_LIMIT: u64 = 5;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("ap_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Kestrel Autopilot Executable\n");
    info!("Running on: {}", host::get_platform());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ApExecParams =
        util::params::load("ap_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    if exec_params.cycle_period_ms == 0 {
        return Err(eyre!("Cycle period must be greater than zero"));
    }

    let cycle_period_s = exec_params.cycle_period_ms as f64 / 1000.0;
    let cycle_frequency_hz = 1.0 / cycle_period_s;

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();
    ds.pos_type_used = exec_params.pos_type_used;

    // ---- INITIALISE MODULES ----

    ds.follower
        .init("follower.toml", &session)
        .wrap_err("Failed to initialise the Follower")?;
    info!("Follower init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = zmq::Context::new();

    let cmd_server = {
        let s = CmdServer::new(&zmq_ctx, &exec_params)
            .wrap_err("Failed to initialise the CmdServer")?;
        info!("CmdServer initialised");
        s
    };

    let mut tm_server = {
        let s =
            TmServer::new(&zmq_ctx, &exec_params).wrap_err("Failed to initialise the TmServer")?;
        info!("TmServer initialised");
        s
    };

    #[cfg(not(feature = "sim"))]
    let pose_client = {
        let c = PoseClient::new(&zmq_ctx, &exec_params)
            .wrap_err("Failed to initialise the PoseClient")?;
        info!("PoseClient initialised");
        c
    };

    #[cfg(not(feature = "sim"))]
    let mut actuation = {
        let c = DemsClient::new(&zmq_ctx, &exec_params)
            .wrap_err("Failed to initialise the DemsClient")?;
        info!("DemsClient initialised");
        ActuationSink::Remote(c)
    };

    #[cfg(feature = "sim")]
    let (sim_vehicle, mut actuation) = {
        let v = SimVehicle::new(ds.follower.vehicle_kin());
        info!("SimVehicle initialised");
        (v.clone(), ActuationSink::Local(Box::new(v)))
    };

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(cycle_frequency_hz);

        // ---- DATA INPUT ----

        // Advance the simulation by one period and read the pose back from it
        #[cfg(feature = "sim")]
        {
            sim_vehicle.step(cycle_period_s);
            ds.pose = sim_vehicle.pose();
            ds.trailer_hitch_angle_rad = sim_vehicle.trailer_hitch_angle_rad();
        }

        // Read the latest sample from the pose provider
        #[cfg(not(feature = "sim"))]
        {
            ds.pose = pose_client.current_pose(ds.pos_type_used);
            ds.trailer_hitch_angle_rad = pose_client.trailer_hitch_angle_rad();
        }

        // ---- COMMAND PROCESSING ----

        // Get commands until none remain
        loop {
            match cmd_server.recieve_cmd() {
                Ok(Some(cmd)) => {
                    // Process the command
                    let response = cmd_processor::exec(&mut ds, &cmd);

                    // Print warning if couldn't send the response
                    match cmd_server.send_response(response) {
                        Ok(_) => (),
                        Err(e) => warn!("Could not respond to command: {}", e),
                    }
                }
                Ok(None) => break,
                Err(CmdServerError::CmdParseError(e)) => {
                    warn!("Could not parse recieved command: {}", e);
                    break;
                }
                Err(CmdServerError::NonUtf8Cmd) => {
                    warn!("Recieved a command which was not valid UTF-8");
                    break;
                }
                Err(e) => {
                    return Err(e).wrap_err("An error occured while recieving commands")
                }
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        ds.follower_input = follower::InputData {
            pose: ds.pose,
            trailer_hitch_angle_rad: ds.trailer_hitch_angle_rad,
        };

        // Follower processing
        match ds.follower.proc(&ds.follower_input) {
            Ok((d, r)) => {
                ds.follower_demand = d;
                ds.follower_status_rpt = r;
            }
            Err(e) => {
                // A follower error means the vehicle must not keep its last
                // demand, hold instead
                warn!("Error during Follower processing: {}", e);
                ds.follower_demand = follower::Demand::Hold;
            }
        }

        // Surface a stale follow point target on the 1Hz so the log isn't
        // flooded at the cycle rate
        if ds.is_1_hz_cycle
            && matches!(
                ds.follower_status_rpt.phase,
                Phase::FollowPointWaiting | Phase::FollowPointFollowing
            )
            && ds.follower_status_rpt.follow_point_stale
        {
            warn!("Follow point target is stale, holding position");
        }

        // ---- ACTUATION ----

        let actuation_result = match ds.follower_demand {
            follower::Demand::Drive(dems) => Some(actuation.apply_control(&dems)),
            follower::Demand::Hold => Some(actuation.hold_position()),
            follower::Demand::Idle => None,
        };

        match actuation_result {
            Some(Ok(())) => ds.num_consec_actuation_errors = 0,
            Some(Err(e)) => {
                warn!("Actuation error: {}", e);
                ds.num_consec_actuation_errors += 1;

                if ds.num_consec_actuation_errors == MAX_ACTUATION_ERROR_LIMIT {
                    error!(
                        "Maximum number of consecutive actuation errors ({}) reached",
                        MAX_ACTUATION_ERROR_LIMIT
                    );
                }
            }
            None => (),
        }

        // ---- WRITE ARCHIVES ----

        match ds.follower.write() {
            Ok(_) => (),
            Err(e) => warn!("Could not write the follower archives: {}", e),
        }

        // ---- TELEMETRY ----

        match tm_server.send(&ds) {
            Ok(_) => (),
            Err(e) => warn!("TmServer error: {}", e),
        };

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(cycle_period_s).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period_s
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }
}
