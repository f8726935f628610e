/// Device connection graph.
///
/// Tracks which connectors are linked to which sockets, and derives from
/// those links which devices are directly connected. The graph is the only
/// authority for connection state and the only producer of
/// `ConnectorConnected` / `ConnectorDisconnected` events.
///
/// The graph stores identifiers only. Ports are registered together with
/// their owning device and protocol when a device is added, which gives the
/// graph a reverse index from port to owner for validating edges and for
/// tearing down everything a destroyed device was linked to.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::bus::EventBus;
use crate::description::Protocol;
use crate::error::{SimError, SimResult};
use crate::event::SimEvent;
use crate::id::{ConnectorId, DeviceId, Endpoint, SocketId};

// ── Port records ──────────────────────────────────────────────────────

/// Structural-change guard carried by every port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    /// No change in progress.
    Idle,
    /// A connect or disconnect is currently being applied.
    Changing,
}

#[derive(Debug, Clone)]
struct PortRecord {
    owner: DeviceId,
    protocol: Protocol,
    state: PortState,
}

impl PortRecord {
    fn new(owner: DeviceId, protocol: Protocol) -> Self {
        PortRecord {
            owner,
            protocol,
            state: PortState::Idle,
        }
    }
}

// ── Edges ─────────────────────────────────────────────────────────────

/// A connector↔socket link together with the devices at either end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkEdge {
    pub connector: ConnectorId,
    pub connector_owner: DeviceId,
    pub socket: SocketId,
    pub socket_owner: DeviceId,
}

/// Order-independent key for a device↔device edge.
fn device_pair(a: DeviceId, b: DeviceId) -> (DeviceId, DeviceId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ── DeviceGraph ───────────────────────────────────────────────────────

/// Connector/socket links and the device adjacency derived from them.
#[derive(Debug, Clone, Default)]
pub struct DeviceGraph {
    devices: BTreeSet<DeviceId>,
    connectors: BTreeMap<ConnectorId, PortRecord>,
    sockets: BTreeMap<SocketId, PortRecord>,
    /// Connector → its link. Source of truth for the connector graph.
    links: BTreeMap<ConnectorId, LinkEdge>,
    /// Socket → the connector it is linked to.
    socket_links: BTreeMap<SocketId, ConnectorId>,
    /// Device pair → number of links between them.
    device_links: BTreeMap<(DeviceId, DeviceId), usize>,
}

impl DeviceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ──────────────────────────────────────────

    /// Register a device and the ports it owns.
    pub fn add_device(
        &mut self,
        device: DeviceId,
        connectors: &[(ConnectorId, Protocol)],
        sockets: &[(SocketId, Protocol)],
    ) {
        self.devices.insert(device);
        for (id, protocol) in connectors {
            self.connectors
                .insert(*id, PortRecord::new(device, protocol.clone()));
        }
        for (id, protocol) in sockets {
            self.sockets.insert(*id, PortRecord::new(device, protocol.clone()));
        }
    }

    /// Whether `device` is currently part of the graph.
    pub fn contains_device(&self, device: DeviceId) -> bool {
        self.devices.contains(&device)
    }

    /// The device owning `endpoint`, if the endpoint is registered.
    pub fn owner_of(&self, endpoint: Endpoint) -> Option<DeviceId> {
        match endpoint {
            Endpoint::Connector(id) => self.connectors.get(&id).map(|r| r.owner),
            Endpoint::Socket(id) => self.sockets.get(&id).map(|r| r.owner),
        }
    }

    /// Current change guard of `endpoint`, if registered.
    pub fn port_state(&self, endpoint: Endpoint) -> Option<PortState> {
        self.record(endpoint).map(|r| r.state)
    }

    // ── Queries ───────────────────────────────────────────────

    /// The socket `connector` is linked to.
    pub fn connected_socket(&self, connector: ConnectorId) -> Option<SocketId> {
        self.links.get(&connector).map(|e| e.socket)
    }

    /// The connector `socket` is linked to.
    pub fn connected_connector(&self, socket: SocketId) -> Option<ConnectorId> {
        self.socket_links.get(&socket).copied()
    }

    /// The link `connector` takes part in.
    pub fn link_of(&self, connector: ConnectorId) -> Option<&LinkEdge> {
        self.links.get(&connector)
    }

    /// `true` iff at least one link joins `a` and `b`, in either direction.
    pub fn are_directly_connected(&self, a: DeviceId, b: DeviceId) -> bool {
        self.device_links.contains_key(&device_pair(a, b))
    }

    /// Every device directly connected to `device`, in id order.
    pub fn devices_connected_to(&self, device: DeviceId) -> Vec<DeviceId> {
        let peers: BTreeSet<DeviceId> = self
            .device_links
            .keys()
            .filter_map(|&(a, b)| {
                if a == device {
                    Some(b)
                } else if b == device {
                    Some(a)
                } else {
                    None
                }
            })
            .collect();
        peers.into_iter().collect()
    }

    /// Number of connector↔socket links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    // ── Mutation ──────────────────────────────────────────────

    /// Link `connector` to `socket`, the connector side initiating.
    ///
    /// Fails with `AlreadyConnected` if either side already has a peer,
    /// checking the connector first, and with `IncompatibleProtocol` if
    /// the protocols differ. Linking an already linked pair again is also
    /// `AlreadyConnected`.
    pub fn connect(
        &mut self,
        connector: ConnectorId,
        socket: SocketId,
        bus: &mut EventBus,
    ) -> SimResult<()> {
        self.link(connector, socket, Endpoint::Connector(connector), bus)
    }

    /// Link `connector` to `socket`, the socket side initiating.
    ///
    /// Identical to [`connect`](Self::connect) except that the socket's
    /// existing peer is reported first.
    pub fn accept(
        &mut self,
        socket: SocketId,
        connector: ConnectorId,
        bus: &mut EventBus,
    ) -> SimResult<()> {
        self.link(connector, socket, Endpoint::Socket(socket), bus)
    }

    /// Unlink `connector` from whatever socket it is linked to.
    ///
    /// Returns `Ok(false)` without publishing anything if it was not linked.
    pub fn disconnect_connector(
        &mut self,
        connector: ConnectorId,
        bus: &mut EventBus,
    ) -> SimResult<bool> {
        if !self.connectors.contains_key(&connector) {
            return Err(SimError::UnknownConnector(connector));
        }
        let Some(socket) = self.connected_socket(connector) else {
            return Ok(false);
        };
        self.unlink(connector, socket, bus)
    }

    /// Unlink `socket` from whatever connector is linked to it.
    pub fn disconnect_socket(&mut self, socket: SocketId, bus: &mut EventBus) -> SimResult<bool> {
        if !self.sockets.contains_key(&socket) {
            return Err(SimError::UnknownSocket(socket));
        }
        let Some(connector) = self.connected_connector(socket) else {
            return Ok(false);
        };
        self.unlink(connector, socket, bus)
    }

    /// Remove every link touching a port of `device`, then the device and
    /// its ports.
    ///
    /// Returns the number of links removed. Unknown devices are ignored.
    pub fn on_device_destroying(&mut self, device: DeviceId, bus: &mut EventBus) -> SimResult<usize> {
        if !self.devices.contains(&device) {
            return Ok(0);
        }

        let connectors: Vec<ConnectorId> = self
            .connectors
            .iter()
            .filter(|(_, r)| r.owner == device)
            .map(|(id, _)| *id)
            .collect();
        let sockets: Vec<SocketId> = self
            .sockets
            .iter()
            .filter(|(_, r)| r.owner == device)
            .map(|(id, _)| *id)
            .collect();

        let mut removed = 0;
        for connector in &connectors {
            if self.disconnect_connector(*connector, bus)? {
                removed += 1;
            }
            self.connectors.remove(connector);
        }
        for socket in &sockets {
            if self.disconnect_socket(*socket, bus)? {
                removed += 1;
            }
            self.sockets.remove(socket);
        }

        assert!(
            !self.device_links.keys().any(|&(a, b)| a == device || b == device),
            "device {} still has device edges after removing its ports",
            device
        );
        self.devices.remove(&device);
        debug!(device = %device, links = removed, "device removed from graph");
        Ok(removed)
    }

    // ── Change guard ──────────────────────────────────────────

    /// Move `endpoint` from `Idle` to `Changing`.
    ///
    /// Rejected with `ConnectionChanging` if a change is already underway.
    pub fn begin_change(&mut self, endpoint: Endpoint) -> SimResult<()> {
        let record = self.record_mut(endpoint)?;
        match record.state {
            PortState::Idle => {
                record.state = PortState::Changing;
                Ok(())
            }
            PortState::Changing => Err(SimError::ConnectionChanging(endpoint)),
        }
    }

    /// Return `endpoint` to `Idle`.
    pub fn finish_change(&mut self, endpoint: Endpoint) {
        if let Ok(record) = self.record_mut(endpoint) {
            record.state = PortState::Idle;
        }
    }

    // ── Internals ─────────────────────────────────────────────

    fn record(&self, endpoint: Endpoint) -> Option<&PortRecord> {
        match endpoint {
            Endpoint::Connector(id) => self.connectors.get(&id),
            Endpoint::Socket(id) => self.sockets.get(&id),
        }
    }

    fn record_mut(&mut self, endpoint: Endpoint) -> SimResult<&mut PortRecord> {
        match endpoint {
            Endpoint::Connector(id) => self
                .connectors
                .get_mut(&id)
                .ok_or(SimError::UnknownConnector(id)),
            Endpoint::Socket(id) => self
                .sockets
                .get_mut(&id)
                .ok_or(SimError::UnknownSocket(id)),
        }
    }

    /// Run `f` with both endpoints held in the `Changing` state.
    fn while_changing<T>(
        &mut self,
        a: Endpoint,
        b: Endpoint,
        f: impl FnOnce(&mut Self) -> SimResult<T>,
    ) -> SimResult<T> {
        self.begin_change(a)?;
        if let Err(e) = self.begin_change(b) {
            self.finish_change(a);
            return Err(e);
        }
        let result = f(self);
        self.finish_change(b);
        self.finish_change(a);
        result
    }

    fn link(
        &mut self,
        connector: ConnectorId,
        socket: SocketId,
        initiator: Endpoint,
        bus: &mut EventBus,
    ) -> SimResult<()> {
        if !self.connectors.contains_key(&connector) {
            return Err(SimError::UnknownConnector(connector));
        }
        if !self.sockets.contains_key(&socket) {
            return Err(SimError::UnknownSocket(socket));
        }

        let edge = self.while_changing(connector.into(), socket.into(), |g| {
            g.check_link(connector, socket, initiator)?;
            let edge = LinkEdge {
                connector,
                connector_owner: g.connectors[&connector].owner,
                socket,
                socket_owner: g.sockets[&socket].owner,
            };
            g.insert_link(edge);
            Ok(edge)
        })?;

        debug!(
            connector = %connector,
            socket = %socket,
            from = %edge.connector_owner,
            to = %edge.socket_owner,
            "connected"
        );
        bus.publish(SimEvent::ConnectorConnected { connector, socket })?;
        Ok(())
    }

    fn check_link(
        &self,
        connector: ConnectorId,
        socket: SocketId,
        initiator: Endpoint,
    ) -> SimResult<()> {
        let connector_taken =
            self.connected_socket(connector)
                .map(|existing| SimError::AlreadyConnected {
                    endpoint: connector.into(),
                    existing: existing.into(),
                    requested: socket.into(),
                });
        let socket_taken =
            self.connected_connector(socket)
                .map(|existing| SimError::AlreadyConnected {
                    endpoint: socket.into(),
                    existing: existing.into(),
                    requested: connector.into(),
                });

        let taken = match initiator {
            Endpoint::Socket(_) => socket_taken.or(connector_taken),
            Endpoint::Connector(_) => connector_taken.or(socket_taken),
        };
        if let Some(err) = taken {
            return Err(err);
        }

        let connector_protocol = &self.connectors[&connector].protocol;
        let socket_protocol = &self.sockets[&socket].protocol;
        if connector_protocol != socket_protocol {
            return Err(SimError::IncompatibleProtocol {
                connector,
                socket,
                connector_protocol: connector_protocol.clone(),
                socket_protocol: socket_protocol.clone(),
            });
        }
        Ok(())
    }

    fn insert_link(&mut self, edge: LinkEdge) {
        assert_eq!(
            self.connectors[&edge.connector].owner, edge.connector_owner,
            "connector {} must be owned by device {}",
            edge.connector, edge.connector_owner
        );
        assert_eq!(
            self.sockets[&edge.socket].owner, edge.socket_owner,
            "socket {} must be owned by device {}",
            edge.socket, edge.socket_owner
        );
        assert!(
            !self.links.contains_key(&edge.connector),
            "connector {} must have at most one edge",
            edge.connector
        );
        assert!(
            !self.socket_links.contains_key(&edge.socket),
            "socket {} must have at most one edge",
            edge.socket
        );

        self.links.insert(edge.connector, edge);
        self.socket_links.insert(edge.socket, edge.connector);
        *self
            .device_links
            .entry(device_pair(edge.connector_owner, edge.socket_owner))
            .or_insert(0) += 1;
    }

    fn unlink(
        &mut self,
        connector: ConnectorId,
        socket: SocketId,
        bus: &mut EventBus,
    ) -> SimResult<bool> {
        let removed = self.while_changing(connector.into(), socket.into(), |g| {
            Ok(g.remove_link(connector))
        })?;
        let Some(edge) = removed else {
            return Ok(false);
        };
        assert_eq!(edge.socket, socket, "connector {} must link to socket {}", connector, socket);

        debug!(connector = %connector, socket = %socket, "disconnected");
        bus.publish(SimEvent::ConnectorDisconnected { connector, socket })?;
        Ok(true)
    }

    fn remove_link(&mut self, connector: ConnectorId) -> Option<LinkEdge> {
        let edge = self.links.remove(&connector)?;
        let back = self.socket_links.remove(&edge.socket);
        assert_eq!(
            back,
            Some(connector),
            "socket {} must link back to connector {}",
            edge.socket,
            connector
        );

        let pair = device_pair(edge.connector_owner, edge.socket_owner);
        match self.device_links.get_mut(&pair) {
            Some(n) if *n > 1 => *n -= 1,
            Some(_) => {
                self.device_links.remove(&pair);
            }
            None => panic!(
                "missing device edge between {} and {}",
                edge.connector_owner, edge.socket_owner
            ),
        }
        Some(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventRecorder;
    use proptest::prelude::*;
    use uuid::Uuid;

    struct Fixture {
        graph: DeviceGraph,
        bus: EventBus,
        recorder: EventRecorder,
    }

    impl Fixture {
        fn new() -> Self {
            let mut bus = EventBus::new();
            let recorder = EventRecorder::new();
            bus.subscribe(Box::new(recorder.clone())).unwrap();
            Fixture {
                graph: DeviceGraph::new(),
                bus,
                recorder,
            }
        }

        /// Add a device with `n_conn` connectors and `n_sock` sockets, all
        /// speaking `protocol`.
        fn device(
            &mut self,
            protocol: &str,
            n_conn: usize,
            n_sock: usize,
        ) -> (DeviceId, Vec<ConnectorId>, Vec<SocketId>) {
            let id = DeviceId::from_uuid(Uuid::new_v4());
            let cs: Vec<ConnectorId> = (0..n_conn)
                .map(|_| ConnectorId::from_uuid(Uuid::new_v4()))
                .collect();
            let ss: Vec<SocketId> = (0..n_sock)
                .map(|_| SocketId::from_uuid(Uuid::new_v4()))
                .collect();
            let p = Protocol::new(protocol);
            let conn: Vec<_> = cs.iter().map(|c| (*c, p.clone())).collect();
            let sock: Vec<_> = ss.iter().map(|s| (*s, p.clone())).collect();
            self.graph.add_device(id, &conn, &sock);
            (id, cs, ss)
        }
    }

    #[test]
    fn test_connect_disconnect() {
        let mut fx = Fixture::new();
        let (d0, cs, _) = fx.device("GCX-0", 1, 0);
        let (d1, _, ss) = fx.device("GCX-0", 0, 1);
        let (c, s) = (cs[0], ss[0]);

        assert_eq!(fx.graph.connected_connector(s), None);
        assert_eq!(fx.graph.connected_socket(c), None);

        fx.graph.connect(c, s, &mut fx.bus).unwrap();
        assert_eq!(fx.graph.connected_connector(s), Some(c));
        assert_eq!(fx.graph.connected_socket(c), Some(s));
        assert!(fx.graph.are_directly_connected(d0, d1));
        assert!(fx.graph.are_directly_connected(d1, d0));

        assert!(fx.graph.disconnect_connector(c, &mut fx.bus).unwrap());
        assert_eq!(fx.graph.connected_connector(s), None);
        assert_eq!(fx.graph.connected_socket(c), None);
        assert!(!fx.graph.are_directly_connected(d0, d1));

        fx.graph.accept(s, c, &mut fx.bus).unwrap();
        assert_eq!(fx.graph.connected_socket(c), Some(s));

        assert!(fx.graph.disconnect_socket(s, &mut fx.bus).unwrap());
        assert_eq!(fx.graph.connected_connector(s), None);
        assert_eq!(fx.graph.connected_socket(c), None);

        assert_eq!(
            fx.recorder.kinds(),
            vec![
                "ConnectorConnected",
                "ConnectorDisconnected",
                "ConnectorConnected",
                "ConnectorDisconnected",
            ]
        );
    }

    #[test]
    fn test_disconnect_when_unlinked_is_silent() {
        let mut fx = Fixture::new();
        let (_, cs, ss) = fx.device("P", 1, 1);
        assert!(!fx.graph.disconnect_connector(cs[0], &mut fx.bus).unwrap());
        assert!(!fx.graph.disconnect_socket(ss[0], &mut fx.bus).unwrap());
        assert!(fx.recorder.is_empty());
    }

    #[test]
    fn test_reconnecting_same_pair_is_rejected() {
        let mut fx = Fixture::new();
        let (_, cs, _) = fx.device("GCX-0", 1, 0);
        let (_, _, ss) = fx.device("GCX-0", 0, 1);
        fx.graph.connect(cs[0], ss[0], &mut fx.bus).unwrap();

        let err = fx.graph.connect(cs[0], ss[0], &mut fx.bus).unwrap_err();
        assert_eq!(
            err,
            SimError::AlreadyConnected {
                endpoint: cs[0].into(),
                existing: ss[0].into(),
                requested: ss[0].into(),
            }
        );
        assert_eq!(fx.graph.link_count(), 1);
    }

    #[test]
    fn test_second_connector_on_bound_socket_is_rejected() {
        let mut fx = Fixture::new();
        let (_, cs, _) = fx.device("GCX-0", 2, 0);
        let (_, _, ss) = fx.device("GCX-0", 0, 1);
        fx.graph.connect(cs[0], ss[0], &mut fx.bus).unwrap();

        let err = fx.graph.connect(cs[1], ss[0], &mut fx.bus).unwrap_err();
        assert_eq!(
            err,
            SimError::AlreadyConnected {
                endpoint: ss[0].into(),
                existing: cs[0].into(),
                requested: cs[1].into(),
            }
        );
        // The first link survives.
        assert_eq!(fx.graph.connected_connector(ss[0]), Some(cs[0]));
        assert_eq!(fx.graph.connected_socket(cs[1]), None);
    }

    #[test]
    fn test_initiator_side_reported_first() {
        let mut fx = Fixture::new();
        let (_, cs, _) = fx.device("P", 2, 0);
        let (_, _, ss) = fx.device("P", 0, 2);
        fx.graph.connect(cs[0], ss[0], &mut fx.bus).unwrap();
        fx.graph.connect(cs[1], ss[1], &mut fx.bus).unwrap();

        // Both sides are taken; the socket initiated, so it is reported.
        let err = fx.graph.accept(ss[1], cs[0], &mut fx.bus).unwrap_err();
        assert!(matches!(
            err,
            SimError::AlreadyConnected { endpoint: Endpoint::Socket(s), .. } if s == ss[1]
        ));
        let err = fx.graph.connect(cs[0], ss[1], &mut fx.bus).unwrap_err();
        assert!(matches!(
            err,
            SimError::AlreadyConnected { endpoint: Endpoint::Connector(c), .. } if c == cs[0]
        ));
    }

    #[test]
    fn test_incompatible_protocols_both_directions() {
        let mut fx = Fixture::new();
        let (_, cs, _) = fx.device("GCX-0", 1, 0);
        let (_, _, ss) = fx.device("GCX-1", 0, 1);

        let a = fx.graph.connect(cs[0], ss[0], &mut fx.bus).unwrap_err();
        let b = fx.graph.accept(ss[0], cs[0], &mut fx.bus).unwrap_err();
        assert!(matches!(a, SimError::IncompatibleProtocol { .. }));
        assert_eq!(a, b);
        assert_eq!(fx.graph.link_count(), 0);
        assert!(fx.recorder.is_empty());
    }

    #[test]
    fn test_unknown_ports_are_errors_for_mutation_and_none_for_queries() {
        let mut fx = Fixture::new();
        let c = ConnectorId::from_uuid(Uuid::new_v4());
        let s = SocketId::from_uuid(Uuid::new_v4());
        assert_eq!(fx.graph.connected_socket(c), None);
        assert_eq!(fx.graph.connected_connector(s), None);
        assert_eq!(
            fx.graph.disconnect_connector(c, &mut fx.bus),
            Err(SimError::UnknownConnector(c))
        );
        let (_, _, ss) = fx.device("P", 0, 1);
        assert_eq!(
            fx.graph.connect(c, ss[0], &mut fx.bus),
            Err(SimError::UnknownConnector(c))
        );
    }

    #[test]
    fn test_change_guard_rejects_overlapping_change() {
        let mut fx = Fixture::new();
        let (_, cs, _) = fx.device("P", 1, 0);
        let (_, _, ss) = fx.device("P", 0, 1);

        fx.graph.begin_change(cs[0].into()).unwrap();
        assert_eq!(fx.graph.port_state(cs[0].into()), Some(PortState::Changing));
        assert_eq!(
            fx.graph.connect(cs[0], ss[0], &mut fx.bus),
            Err(SimError::ConnectionChanging(cs[0].into()))
        );
        // The socket's guard was not left behind by the failed attempt.
        assert_eq!(fx.graph.port_state(ss[0].into()), Some(PortState::Idle));

        fx.graph.finish_change(cs[0].into());
        fx.graph.connect(cs[0], ss[0], &mut fx.bus).unwrap();
        assert_eq!(fx.graph.port_state(cs[0].into()), Some(PortState::Idle));
    }

    #[test]
    fn test_parallel_links_between_same_devices() {
        let mut fx = Fixture::new();
        let (d0, cs, _) = fx.device("P", 2, 0);
        let (d1, _, ss) = fx.device("P", 0, 2);
        fx.graph.connect(cs[0], ss[0], &mut fx.bus).unwrap();
        fx.graph.connect(cs[1], ss[1], &mut fx.bus).unwrap();

        fx.graph.disconnect_connector(cs[0], &mut fx.bus).unwrap();
        assert!(fx.graph.are_directly_connected(d0, d1));
        fx.graph.disconnect_connector(cs[1], &mut fx.bus).unwrap();
        assert!(!fx.graph.are_directly_connected(d0, d1));
    }

    #[test]
    fn test_device_destroying_removes_all_links() {
        let mut fx = Fixture::new();
        let (hub, cs, ss) = fx.device("P", 1, 2);
        let (a, a_cs, _) = fx.device("P", 1, 0);
        let (b, b_cs, b_ss) = fx.device("P", 1, 1);

        fx.graph.connect(a_cs[0], ss[0], &mut fx.bus).unwrap();
        fx.graph.connect(b_cs[0], ss[1], &mut fx.bus).unwrap();
        fx.graph.connect(cs[0], b_ss[0], &mut fx.bus).unwrap();
        assert_eq!(fx.graph.devices_connected_to(hub).len(), 2);
        fx.recorder.clear();

        let removed = fx.graph.on_device_destroying(hub, &mut fx.bus).unwrap();
        assert_eq!(removed, 3);
        assert!(!fx.graph.are_directly_connected(hub, a));
        assert!(!fx.graph.are_directly_connected(hub, b));
        assert!(!fx.graph.contains_device(hub));
        assert_eq!(fx.graph.connected_socket(a_cs[0]), None);
        assert_eq!(fx.graph.owner_of(cs[0].into()), None);
        assert_eq!(fx.recorder.len(), 3);
        assert!(fx
            .recorder
            .kinds()
            .iter()
            .all(|k| *k == "ConnectorDisconnected"));

        // The survivors can link to each other again.
        fx.graph.connect(a_cs[0], b_ss[0], &mut fx.bus).unwrap();
        assert!(fx.graph.are_directly_connected(a, b));
    }

    #[test]
    fn test_devices_connected_to_is_distinct_and_sorted() {
        let mut fx = Fixture::new();
        let (hub, _, ss) = fx.device("P", 0, 3);
        let (a, a_cs, _) = fx.device("P", 2, 0);
        let (b, b_cs, _) = fx.device("P", 1, 0);
        fx.graph.connect(a_cs[0], ss[0], &mut fx.bus).unwrap();
        fx.graph.connect(a_cs[1], ss[1], &mut fx.bus).unwrap();
        fx.graph.connect(b_cs[0], ss[2], &mut fx.bus).unwrap();

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(fx.graph.devices_connected_to(hub), expected);
        assert_eq!(fx.graph.devices_connected_to(a), vec![hub]);
    }

    // ── Property tests ────────────────────────────────────────

    #[derive(Debug, Clone)]
    enum Op {
        Connect(usize, usize),
        Accept(usize, usize),
        DisconnectConnector(usize),
        DisconnectSocket(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize, 0..4usize).prop_map(|(c, s)| Op::Connect(c, s)),
            (0..4usize, 0..4usize).prop_map(|(c, s)| Op::Accept(c, s)),
            (0..4usize).prop_map(Op::DisconnectConnector),
            (0..4usize).prop_map(Op::DisconnectSocket),
        ]
    }

    proptest! {
        /// Links stay symmetric and exclusive, and device adjacency always
        /// agrees with the link set, whatever sequence of operations runs.
        #[test]
        fn links_stay_symmetric_and_exclusive(ops in proptest::collection::vec(op_strategy(), 1..64)) {
            let mut fx = Fixture::new();
            let (d0, cs, _) = fx.device("P", 4, 0);
            let (d1, _, ss) = fx.device("P", 0, 4);

            for op in ops {
                let _ = match op {
                    Op::Connect(c, s) => fx.graph.connect(cs[c], ss[s], &mut fx.bus).map(|_| true),
                    Op::Accept(c, s) => fx.graph.accept(ss[s], cs[c], &mut fx.bus).map(|_| true),
                    Op::DisconnectConnector(c) => fx.graph.disconnect_connector(cs[c], &mut fx.bus),
                    Op::DisconnectSocket(s) => fx.graph.disconnect_socket(ss[s], &mut fx.bus),
                };

                let mut linked_sockets = BTreeSet::new();
                for c in &cs {
                    if let Some(s) = fx.graph.connected_socket(*c) {
                        prop_assert_eq!(fx.graph.connected_connector(s), Some(*c));
                        prop_assert!(linked_sockets.insert(s));
                    }
                }
                for s in &ss {
                    if let Some(c) = fx.graph.connected_connector(*s) {
                        prop_assert_eq!(fx.graph.connected_socket(c), Some(*s));
                    }
                }
                prop_assert_eq!(fx.graph.link_count(), linked_sockets.len());
                prop_assert_eq!(fx.graph.are_directly_connected(d0, d1), !linked_sockets.is_empty());
            }
        }
    }
}
