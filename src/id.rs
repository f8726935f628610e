//! Typed identifiers for simulation entities.
//!
//! Every device, connector and socket carries a 128-bit identifier issued
//! by the simulation's [`IdRegistry`](crate::registry::IdRegistry). The
//! identifiers are newtypes rather than bare `Uuid`s so a connector id can
//! never be handed to an API expecting a socket id.

use uuid::Uuid;

/// Identifier of a device (computer or storage device).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Wrap a raw UUID.
    #[inline]
    pub fn from_uuid(uuid: Uuid) -> Self {
        DeviceId(uuid)
    }

    /// Return the underlying UUID.
    #[inline]
    pub fn uuid(self) -> Uuid {
        self.0
    }

    /// Parse the hyphenated textual form produced by `Display`.
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(DeviceId)
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a connector (the plug side of a link).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectorId(Uuid);

impl ConnectorId {
    #[inline]
    pub fn from_uuid(uuid: Uuid) -> Self {
        ConnectorId(uuid)
    }

    #[inline]
    pub fn uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a socket (the receptacle side of a link).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SocketId(Uuid);

impl SocketId {
    #[inline]
    pub fn from_uuid(uuid: Uuid) -> Self {
        SocketId(uuid)
    }

    #[inline]
    pub fn uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SocketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Endpoint ──────────────────────────────────────────────────────────

/// Either side of a connector/socket link.
///
/// Used wherever an operation or an error can refer to both kinds of
/// port, e.g. when reporting which peer an endpoint is already bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Endpoint {
    Connector(ConnectorId),
    Socket(SocketId),
}

impl From<ConnectorId> for Endpoint {
    fn from(id: ConnectorId) -> Self {
        Endpoint::Connector(id)
    }
}

impl From<SocketId> for Endpoint {
    fn from(id: SocketId) -> Self {
        Endpoint::Socket(id)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Connector(id) => write!(f, "connector {}", id),
            Endpoint::Socket(id) => write!(f, "socket {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_parse_round_trips_display() {
        let id = DeviceId::from_uuid(Uuid::new_v4());
        assert_eq!(DeviceId::parse(&id.to_string()), Some(id));
        assert_eq!(DeviceId::parse("not-a-uuid"), None);
    }

    #[test]
    fn test_endpoint_display_names_the_side() {
        let uuid = Uuid::nil();
        let c = Endpoint::from(ConnectorId::from_uuid(uuid));
        let s = Endpoint::from(SocketId::from_uuid(uuid));
        assert!(c.to_string().starts_with("connector "));
        assert!(s.to_string().starts_with("socket "));
        assert_ne!(c, s);
    }
}
