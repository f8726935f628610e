//! Connectors, sockets, and the `Simulation` operations that link them.
//!
//! Connection changes are deferred: each call returns a [`TaskHandle`]
//! immediately and the graph changes, with its event, during the next
//! tick. Queries read the graph directly.

use crate::description::Protocol;
use crate::id::{ConnectorId, DeviceId, SocketId};
use crate::scheduler::TaskHandle;
use crate::simulation::Simulation;

// ── Ports ─────────────────────────────────────────────────────────────

/// A male port, owned by exactly one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    id: ConnectorId,
    owner: DeviceId,
    protocol: Protocol,
}

impl Connector {
    pub(crate) fn new(id: ConnectorId, owner: DeviceId, protocol: Protocol) -> Self {
        Connector {
            id,
            owner,
            protocol,
        }
    }

    pub fn id(&self) -> ConnectorId {
        self.id
    }

    /// The device this connector belongs to.
    pub fn owner(&self) -> DeviceId {
        self.owner
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }
}

/// A female port, owned by exactly one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Socket {
    id: SocketId,
    owner: DeviceId,
    protocol: Protocol,
}

impl Socket {
    pub(crate) fn new(id: SocketId, owner: DeviceId, protocol: Protocol) -> Self {
        Socket {
            id,
            owner,
            protocol,
        }
    }

    pub fn id(&self) -> SocketId {
        self.id
    }

    pub fn owner(&self) -> DeviceId {
        self.owner
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }
}

// ── Simulation connection operations ──────────────────────────────────

impl Simulation {
    /// Link `connector` to `socket`, from the connector's side.
    pub fn connect(&mut self, connector: ConnectorId, socket: SocketId) -> TaskHandle {
        self.run_later("connect", move |sim| {
            let (graph, bus) = sim.graph_and_bus();
            graph.connect(connector, socket, bus)
        })
    }

    /// Link `connector` to `socket`, from the socket's side.
    pub fn accept_connector(&mut self, socket: SocketId, connector: ConnectorId) -> TaskHandle {
        self.run_later("accept connector", move |sim| {
            let (graph, bus) = sim.graph_and_bus();
            graph.accept(socket, connector, bus)
        })
    }

    /// Remove whatever link `connector` takes part in.
    pub fn disconnect_connector(&mut self, connector: ConnectorId) -> TaskHandle {
        self.run_later("disconnect connector", move |sim| {
            let (graph, bus) = sim.graph_and_bus();
            graph.disconnect_connector(connector, bus).map(|_| ())
        })
    }

    /// Remove whatever link `socket` takes part in.
    pub fn disconnect_socket(&mut self, socket: SocketId) -> TaskHandle {
        self.run_later("disconnect socket", move |sim| {
            let (graph, bus) = sim.graph_and_bus();
            graph.disconnect_socket(socket, bus).map(|_| ())
        })
    }

    /// The socket `connector` is currently linked to.
    pub fn connected_socket(&self, connector: ConnectorId) -> Option<SocketId> {
        self.graph().connected_socket(connector)
    }

    /// The connector currently linked to `socket`.
    pub fn connected_connector(&self, socket: SocketId) -> Option<ConnectorId> {
        self.graph().connected_connector(socket)
    }

    /// Whether a link joins `a` and `b`, in either direction.
    pub fn are_directly_connected(&self, a: DeviceId, b: DeviceId) -> bool {
        self.graph().are_directly_connected(a, b)
    }
}
