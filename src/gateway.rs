//! Request surface for remote power control.
//!
//! Maps the three `PUT /pc/...` endpoints onto [`PcCommand`]s. Handlers only
//! validate and enqueue; the pulse itself runs later from the main loop.
//! The HTTP server is the firmware's business; this module only decides the
//! status and body for a given method and path.

use embedded_hal::digital::InputPin;

use crate::command::{CommandError, CommandQueue, PcCommand};
use crate::lines::SenseLine;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Other,
}

impl Method {
    /// Parses a request method token. Unrecognized tokens map to `Other`.
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "PUT" => Method::Put,
            "POST" => Method::Post,
            "DELETE" => Method::Delete,
            _ => Method::Other,
        }
    }
}

/// One of the power-control endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endpoint {
    /// `/pc/reset`
    Reset,
    /// `/pc/power`
    Power,
    /// `/pc/poweroff`
    PowerOff,
}

impl Endpoint {
    /// All endpoints, for route registration.
    pub const ALL: [Endpoint; 3] = [Endpoint::Reset, Endpoint::Power, Endpoint::PowerOff];

    /// Matches a request path exactly.
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/pc/reset" => Some(Endpoint::Reset),
            "/pc/power" => Some(Endpoint::Power),
            "/pc/poweroff" => Some(Endpoint::PowerOff),
            _ => None,
        }
    }

    /// Request path served by this endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Reset => "/pc/reset",
            Endpoint::Power => "/pc/power",
            Endpoint::PowerOff => "/pc/poweroff",
        }
    }

    /// Command this endpoint schedules.
    pub fn command(&self) -> PcCommand {
        match self {
            Endpoint::Reset => PcCommand::Reset,
            Endpoint::Power => PcCommand::PowerToggle,
            Endpoint::PowerOff => PcCommand::ForcedPowerOff,
        }
    }
}

/// Status and plain-text body to send back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Plain-text body, sent as [`Response::CONTENT_TYPE`].
    pub body: &'static str,
}

impl Response {
    /// Command accepted and queued.
    pub const OK: Response = Response::new(200, "OK");
    /// Command refused because the machine is off.
    pub const CONFLICT: Response = Response::new(409, "NOT OK");
    /// Path is not one of the endpoints.
    pub const NOT_FOUND: Response = Response::new(404, "NOT FOUND");
    /// Known endpoint, but not a `PUT`.
    pub const METHOD_NOT_ALLOWED: Response = Response::new(405, "METHOD NOT ALLOWED");
    /// Command queue is full.
    pub const BUSY: Response = Response::new(503, "NOT OK");

    /// Creates a response.
    #[inline]
    pub const fn new(status: u16, body: &'static str) -> Self {
        Self { status, body }
    }

    /// Content type for every body this module produces.
    pub const CONTENT_TYPE: &'static str = "text/html";
}

impl From<Result<(), CommandError>> for Response {
    fn from(result: Result<(), CommandError>) -> Self {
        match result {
            Ok(()) => Response::OK,
            Err(CommandError::PcNotPowered) => Response::CONFLICT,
            Err(CommandError::QueueFull) | Err(CommandError::Pulse(_)) => Response::BUSY,
        }
    }
}

/// Validates remote commands against the sense line and queues them.
///
/// Never blocks and never touches an output line, so it is safe to call
/// from a request handler that must answer promptly.
pub struct CommandGateway<'a, S: InputPin, const N: usize> {
    sense: &'a SenseLine<S>,
    queue: &'a CommandQueue<N>,
}

impl<'a, S: InputPin, const N: usize> CommandGateway<'a, S, N> {
    /// Creates a gateway over the shared sense line and command queue.
    pub fn new(sense: &'a SenseLine<S>, queue: &'a CommandQueue<N>) -> Self {
        Self { sense, queue }
    }

    /// Checks the command's precondition and queues it.
    pub fn submit(&self, command: PcCommand) -> Result<(), CommandError> {
        if command.requires_power() && !self.sense.is_powered() {
            debug!("refusing {:?}, machine is off", command);
            return Err(CommandError::PcNotPowered);
        }
        self.queue.push(command)?;
        debug!("queued {:?}", command);
        Ok(())
    }

    /// Handles a request and returns the response to send.
    pub fn handle(&self, method: Method, path: &str) -> Response {
        let Some(endpoint) = Endpoint::from_path(path) else {
            return Response::NOT_FOUND;
        };
        if method != Method::Put {
            return Response::METHOD_NOT_ALLOWED;
        }
        self.submit(endpoint.command()).into()
    }
}
