//! Structured error types for the simulation.
//!
//! All fallible public APIs return `Result<T, SimError>`. Connection
//! changes and kernel installation run as deferred tasks, so their errors
//! arrive through the returned [`TaskHandle`](crate::scheduler::TaskHandle)
//! rather than from the call itself.

use thiserror::Error;

use crate::description::Protocol;
use crate::id::{ConnectorId, DeviceId, Endpoint, SocketId};

/// The top-level error type for the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    // ── Connection errors ─────────────────────────────────

    /// `endpoint` is already linked to `existing`, so it cannot be linked
    /// to `requested`.
    #[error("{endpoint} is already connected to {existing} (requested {requested})")]
    AlreadyConnected {
        endpoint: Endpoint,
        existing: Endpoint,
        requested: Endpoint,
    },

    /// The connector and socket speak different protocols.
    #[error(
        "connector {connector} ({connector_protocol}) is incompatible with \
         socket {socket} ({socket_protocol})"
    )]
    IncompatibleProtocol {
        connector: ConnectorId,
        socket: SocketId,
        connector_protocol: Protocol,
        socket_protocol: Protocol,
    },

    /// A structural change is already in progress on this endpoint.
    #[error("a connection change is already in progress on {0}")]
    ConnectionChanging(Endpoint),

    // ── Device errors ─────────────────────────────────────

    /// `device` is not directly connected to `computer`.
    #[error("device {device} is not connected to computer {computer}")]
    DeviceNotConnected { computer: DeviceId, device: DeviceId },

    /// Not enough free space on a storage device.
    #[error("device {device} is out of space: {required} octets required, {available} available")]
    OutOfSpace {
        device: DeviceId,
        required: u64,
        available: u64,
    },

    /// A device ID was referenced but no such device exists.
    #[error("device {0} not found")]
    UnknownDevice(DeviceId),

    /// A connector ID was referenced but no such connector exists.
    #[error("connector {0} not found")]
    UnknownConnector(ConnectorId),

    /// A socket ID was referenced but no such socket exists.
    #[error("socket {0} not found")]
    UnknownSocket(SocketId),

    /// The device exists but is of another kind.
    #[error("device {device} is not a {expected}")]
    DeviceKindMismatch {
        device: DeviceId,
        expected: &'static str,
    },

    // ── Lifecycle errors ──────────────────────────────────

    /// The simulation has been closed.
    #[error("simulation has been closed")]
    Closed,

    // ── Config errors ─────────────────────────────────────

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;
