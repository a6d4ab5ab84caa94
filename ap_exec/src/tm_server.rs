//! # TM Server

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use veh_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
    pose::{PosPoint, PosType},
};

use crate::data_store::DataStore;
use crate::follower;
use crate::params::ApExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry server
pub struct TmServer {
    socket: MonitoredSocket,
}

/// Telemetry packet that is output by the server.
#[derive(Debug, Serialize)]
pub struct TmPacket {
    pub session_time_s: f64,

    pub pos_type_used: PosType,

    pub pose: Option<PosPoint>,

    pub trailer_hitch_angle_rad: Option<f64>,

    pub follower_demand: follower::Demand,

    pub follower_status_rpt: follower::StatusReport,

    pub num_consec_cycle_overruns: u64,

    pub num_consec_actuation_errors: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TmServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send telemetry: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the telemetry: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TmServer {
    /// Create a new instance of the TM Server.
    ///
    /// This function will not block until a consumer connects.
    pub fn new(ctx: &zmq::Context, params: &ApExecParams) -> Result<Self, TmServerError> {
        // Create the socket options
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            bind: true,
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
        let socket = MonitoredSocket::new(ctx, zmq::PUB, socket_options, &params.tm_endpoint)
            .map_err(TmServerError::SocketError)?;

        // Create self
        Ok(Self { socket })
    }

    pub fn send(&mut self, ds: &DataStore) -> Result<(), TmServerError> {
        // Build packet
        let packet = TmPacket::from_datastore(ds);

        // Serialize packet
        let packet_string =
            serde_json::to_string(&packet).map_err(TmServerError::SerializationError)?;

        // Send the packet
        self.socket
            .send(&packet_string, 0)
            .map_err(TmServerError::SendError)
    }
}

impl TmPacket {
    pub fn from_datastore(ds: &DataStore) -> Self {
        Self {
            session_time_s: ds.session_time_s,
            pos_type_used: ds.pos_type_used,
            pose: ds.pose,
            trailer_hitch_angle_rad: ds.trailer_hitch_angle_rad,
            follower_demand: ds.follower_demand,
            follower_status_rpt: ds.follower_status_rpt,
            num_consec_cycle_overruns: ds.num_consec_cycle_overruns,
            num_consec_actuation_errors: ds.num_consec_actuation_errors,
        }
    }
}
