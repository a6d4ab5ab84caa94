//! # Command Server
//!
//! This module abstracts over the command side of the autopilot executable.
//! The server accepts connections from operator consoles or companion
//! processes, allowing commands to be recieved and acknowledged without
//! blocking the control cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use veh_if::{
    cmd::{AutopilotCmd, CmdParseError, CmdResponse},
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};

use crate::params::ApExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the command socket of the autopilot executable.
///
/// The server accepts commands as JSON strings and replies to each one with a
/// single [`CmdResponse`].
pub struct CmdServer {
    /// REP socket which accepts commands from operators
    cmd_socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`CmdServer`]
#[derive(thiserror::Error, Debug)]
pub enum CmdServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send a response to the operator: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from the operator: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not parse the recieved command: {0}")]
    CmdParseError(CmdParseError),

    #[error("The operator sent a message which was not valid UTF-8")]
    NonUtf8Cmd,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdServer {
    /// Create a new instance of the command server.
    ///
    /// This function will not wait for a connection from an operator before
    /// returning.
    pub fn new(ctx: &zmq::Context, params: &ApExecParams) -> Result<Self, CmdServerError> {
        // Create the socket options
        let cmd_socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        // Create the socket
        let cmd_socket = MonitoredSocket::new(
            ctx,
            zmq::REP,
            cmd_socket_options,
            &params.cmd_endpoint,
        )
        .map_err(CmdServerError::SocketError)?;

        Ok(Self { cmd_socket })
    }

    /// Recieve a single command from an operator.
    ///
    /// The protocol here is to call recieve_cmd in a loop until `Ok(None)` is
    /// returned, indicating that there are no more pending commands to be
    /// recieved. This does not mean that an operator will not send another
    /// command in the future, just that there are none to handle right now.
    ///
    /// After recieving a valid command the exec must send a response using
    /// `.send_response()` before attempting to recieve another command. If an
    /// error occurs in recieving the command the response is sent
    /// automatically by this function.
    pub fn recieve_cmd(&self) -> Result<Option<AutopilotCmd>, CmdServerError> {
        // Attempt to read a string from the socket
        let cmd_str = match self.cmd_socket.recv_string(0) {
            // Valid message
            Ok(Ok(s)) => s,
            // Non UTF-8 message
            Ok(Err(_)) => {
                // Send invalid message response
                self.send_response(CmdResponse::Invalid)?;

                return Err(CmdServerError::NonUtf8Cmd);
            }
            // No message in timeout
            Err(zmq::Error::EAGAIN) => return Ok(None),
            // Recieve error
            Err(e) => {
                // No response is sent if we could not recieve
                return Err(CmdServerError::RecvError(e));
            }
        };

        // Parse the command
        AutopilotCmd::from_json(&cmd_str)
            .map_err(|e| {
                // The operator still gets a reply, the REP socket would jam
                // otherwise
                self.send_response(CmdResponse::Invalid).ok();

                CmdServerError::CmdParseError(e)
            })
            .map(Some)
    }

    /// Send the given response back to the operator.
    ///
    /// This function must be called after recieving a command.
    pub fn send_response(&self, response: CmdResponse) -> Result<(), CmdServerError> {
        // Serialise the response
        let response_str =
            serde_json::to_string(&response).map_err(CmdServerError::SerializationError)?;

        // Send the response
        self.cmd_socket
            .send(&response_str, 0)
            .map_err(CmdServerError::SendError)
    }
}
