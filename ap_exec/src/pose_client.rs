//! # Pose Client
//!
//! The pose client subscribes to the pose provider's telemetry stream and keeps the latest sample
//! from each position source, along with the latest trailer hitch angle. The provider publishes
//! [`PoseTm`] packets as frequently as it can; the executive picks up whichever sample is current
//! at the start of each cycle.
//!
//! Samples are recieved on a background thread so a slow or silent provider never blocks the
//! control cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

use log::{error, warn};

use veh_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
    pose::{PosPoint, PosType, PoseTm},
};

use crate::params::ApExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct PoseClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    latest: Arc<Mutex<HashMap<PosType, PosPoint>>>,
    trailer_hitch_angle_rad: Arc<Mutex<Option<f64>>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoseClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not subscribe to the pose stream: {0}")]
    SubscribeError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PoseClient {
    /// Create a new instance of the pose client.
    ///
    /// This function will not block until the pose provider connects.
    pub fn new(ctx: &zmq::Context, params: &ApExecParams) -> Result<Self, PoseClientError> {
        // Create the socket options
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        // Connect the socket
        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, &params.pose_endpoint)
            .map_err(PoseClientError::SocketError)?;

        // Subscribe to everything the provider publishes
        socket
            .set_subscribe(b"")
            .map_err(PoseClientError::SubscribeError)?;

        // Create the data shared objects
        let bg_run = Arc::new(AtomicBool::new(true));
        let latest = Arc::new(Mutex::new(HashMap::new()));
        let trailer_hitch_angle_rad = Arc::new(Mutex::new(None));

        // Create clones of these to pass to the bg thread
        let bg_run_clone = bg_run.clone();
        let latest_clone = latest.clone();
        let hitch_clone = trailer_hitch_angle_rad.clone();

        // Start BG thread
        let bg_jh = Some(thread::spawn(move || {
            bg_thread(socket, bg_run_clone, latest_clone, hitch_clone)
        }));

        Ok(Self {
            bg_jh,
            bg_run,
            latest,
            trailer_hitch_angle_rad,
        })
    }

    /// Get the latest pose from the given position source.
    pub fn current_pose(&self, pos_type: PosType) -> Option<PosPoint> {
        let latest = self
            .latest
            .lock()
            .expect("PoseClient: latest mutex poisoned");

        latest.get(&pos_type).copied()
    }

    /// Get the latest trailer hitch angle, `None` if the vehicle tows no trailer.
    ///
    /// Units: radians
    pub fn trailer_hitch_angle_rad(&self) -> Option<f64> {
        *self
            .trailer_hitch_angle_rad
            .lock()
            .expect("PoseClient: trailer_hitch_angle_rad mutex poisoned")
    }
}

impl Drop for PoseClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            jh.join().ok();
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, updates the data in the PoseClient when the provider publishes a new sample.
fn bg_thread(
    socket: MonitoredSocket,
    run: Arc<AtomicBool>,
    latest: Arc<Mutex<HashMap<PosType, PosPoint>>>,
    trailer_hitch_angle_rad: Arc<Mutex<Option<f64>>>,
) {
    // While instructed to run
    while run.load(Ordering::Relaxed) {
        // Read string from the socket
        let msg = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message from the pose provider");
                continue;
            }
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                error!("Error receiving message from the pose provider: {:?}", e);
                break;
            }
        };

        // Deserialize the message
        let tm: PoseTm = match serde_json::from_str(&msg) {
            Ok(t) => t,
            Err(e) => {
                warn!("Error deserialising message from the pose provider: {:?}", e);
                continue;
            }
        };

        // Set the sample in the front end
        {
            let mut latest = latest.lock().expect("PoseClient: latest mutex poisoned");

            latest.insert(tm.pos_type, tm.pose);
        }

        // The hitch angle rides along with every sample, `None` means the
        // provider reports no trailer
        {
            let mut hitch = trailer_hitch_angle_rad
                .lock()
                .expect("PoseClient: trailer_hitch_angle_rad mutex poisoned");

            *hitch = tm.trailer_hitch_angle_rad;
        }
    }
}
