//! # Demands Client
//!
//! This module provides the networking abstraction used to send actuation
//! demands to the vehicle server. The request socket is relaxed and
//! correlating with short timeouts, a missing acknowledgement never blocks
//! the control cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use veh_if::{
    dems::{DemsResponse, VehicleDems},
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};

use crate::params::ApExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct DemsClient {
    dems_socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum DemsClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The client is not connected to the server")]
    NotConnected,

    #[error("Could not send demands to the server: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from the server: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the demands: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response from the server: {0}")]
    DeserializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DemsClient {
    /// Create a new instance of the demands client.
    pub fn new(ctx: &zmq::Context, params: &ApExecParams) -> Result<Self, DemsClientError> {
        // Create the socket options
        let dems_socket_options = SocketOptions {
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        // Create the socket
        let dems_socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            dems_socket_options,
            &params.dems_endpoint,
        )
        .map_err(DemsClientError::SocketError)?;

        Ok(Self { dems_socket })
    }

    /// Send demands to the server.
    ///
    /// Returns `Ok(Some(response))` if the server acknowledged the demands
    /// within the configured timeout, and `Ok(None)` if no acknowledgement
    /// arrived in time. The relaxed request socket allows the next send to
    /// proceed regardless.
    pub fn send_demands(
        &mut self,
        demands: &VehicleDems,
    ) -> Result<Option<DemsResponse>, DemsClientError> {
        // If not connected return now
        if !self.dems_socket.connected() {
            return Err(DemsClientError::NotConnected);
        }

        // Serialize the demands
        let dems_str =
            serde_json::to_string(demands).map_err(DemsClientError::SerializationError)?;

        // Send the demands to the server
        self.dems_socket
            .send(&dems_str, 0)
            .map_err(DemsClientError::SendError)?;

        // Recieve the response back from the server, without blocking the
        // cycle when it hasn't arrived yet
        match self.dems_socket.recv_msg(0) {
            Ok(m) => serde_json::from_str(m.as_str().unwrap_or(""))
                .map(Some)
                .map_err(DemsClientError::DeserializeError),
            Err(zmq::Error::EAGAIN) => Ok(None),
            Err(e) => Err(DemsClientError::RecvError(e)),
        }
    }
}
