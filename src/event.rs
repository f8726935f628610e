/// Simulation events.
///
/// Every observable state change in the simulation is published as a
/// `SimEvent`. Events are immutable values; each kind has exactly one
/// producer: the device graph for connection events, the device model for
/// lifecycle and power events, the simulation itself for ticks.

use crate::id::{ConnectorId, DeviceId, SocketId};
use crate::time::Frame;

/// A single simulation event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum SimEvent {
    // ── Device lifecycle ──────────────────────────────────

    /// A device was created.
    DeviceCreated { device: DeviceId },
    /// A device is about to be destroyed; its links are being removed.
    DeviceDestroying { device: DeviceId },
    /// A device has been destroyed.
    DeviceDestroyed { device: DeviceId },

    // ── Connections ───────────────────────────────────────

    /// A connector was linked to a socket.
    ConnectorConnected {
        connector: ConnectorId,
        socket: SocketId,
    },
    /// A connector/socket link was removed.
    ConnectorDisconnected {
        connector: ConnectorId,
        socket: SocketId,
    },

    // ── Computer power ────────────────────────────────────

    /// A computer started working through its boot order.
    ComputerBooting { computer: DeviceId },
    /// A kernel was loaded and the computer is running.
    ComputerBooted { computer: DeviceId },
    /// The boot sequence ended without a running kernel.
    ComputerBootFailed { computer: DeviceId, message: String },
    /// A running computer is shutting down.
    ComputerShuttingDown { computer: DeviceId },
    /// A computer finished shutting down.
    ComputerShutDown { computer: DeviceId },

    // ── Simulation ────────────────────────────────────────

    /// The simulation advanced by one frame.
    Tick { frame: Frame, delta_seconds: f64 },
}

impl SimEvent {
    /// The device this event concerns, if any.
    pub fn device(&self) -> Option<DeviceId> {
        match self {
            SimEvent::DeviceCreated { device }
            | SimEvent::DeviceDestroying { device }
            | SimEvent::DeviceDestroyed { device } => Some(*device),
            SimEvent::ComputerBooting { computer }
            | SimEvent::ComputerBooted { computer }
            | SimEvent::ComputerBootFailed { computer, .. }
            | SimEvent::ComputerShuttingDown { computer }
            | SimEvent::ComputerShutDown { computer } => Some(*computer),
            SimEvent::ConnectorConnected { .. }
            | SimEvent::ConnectorDisconnected { .. }
            | SimEvent::Tick { .. } => None,
        }
    }

    /// Short, stable name of the event kind (useful for logs and assertions).
    pub fn kind(&self) -> &'static str {
        match self {
            SimEvent::DeviceCreated { .. } => "DeviceCreated",
            SimEvent::DeviceDestroying { .. } => "DeviceDestroying",
            SimEvent::DeviceDestroyed { .. } => "DeviceDestroyed",
            SimEvent::ConnectorConnected { .. } => "ConnectorConnected",
            SimEvent::ConnectorDisconnected { .. } => "ConnectorDisconnected",
            SimEvent::ComputerBooting { .. } => "ComputerBooting",
            SimEvent::ComputerBooted { .. } => "ComputerBooted",
            SimEvent::ComputerBootFailed { .. } => "ComputerBootFailed",
            SimEvent::ComputerShuttingDown { .. } => "ComputerShuttingDown",
            SimEvent::ComputerShutDown { .. } => "ComputerShutDown",
            SimEvent::Tick { .. } => "Tick",
        }
    }
}

impl std::fmt::Display for SimEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimEvent::DeviceCreated { device } => write!(f, "Created({})", device),
            SimEvent::DeviceDestroying { device } => write!(f, "Destroying({})", device),
            SimEvent::DeviceDestroyed { device } => write!(f, "Destroyed({})", device),
            SimEvent::ConnectorConnected { connector, socket } => {
                write!(f, "Connected({} → {})", connector, socket)
            }
            SimEvent::ConnectorDisconnected { connector, socket } => {
                write!(f, "Disconnected({} ↛ {})", connector, socket)
            }
            SimEvent::ComputerBooting { computer } => write!(f, "Booting({})", computer),
            SimEvent::ComputerBooted { computer } => write!(f, "Booted({})", computer),
            SimEvent::ComputerBootFailed { computer, message } => {
                write!(f, "BootFailed({}, {:?})", computer, message)
            }
            SimEvent::ComputerShuttingDown { computer } => {
                write!(f, "ShuttingDown({})", computer)
            }
            SimEvent::ComputerShutDown { computer } => write!(f, "ShutDown({})", computer),
            SimEvent::Tick {
                frame,
                delta_seconds,
            } => write!(f, "Tick({}, {}s)", frame, delta_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_event_device_accessor() {
        let d = DeviceId::from_uuid(Uuid::new_v4());
        assert_eq!(SimEvent::ComputerBooted { computer: d }.device(), Some(d));
        assert_eq!(SimEvent::DeviceCreated { device: d }.device(), Some(d));
        let tick = SimEvent::Tick {
            frame: Frame::ZERO,
            delta_seconds: 0.016,
        };
        assert_eq!(tick.device(), None);
    }

    #[test]
    fn test_event_value_equality() {
        let d = DeviceId::from_uuid(Uuid::new_v4());
        let a = SimEvent::ComputerBootFailed {
            computer: d,
            message: "x".into(),
        };
        let b = SimEvent::ComputerBootFailed {
            computer: d,
            message: "x".into(),
        };
        assert_eq!(a, b);
        assert_eq!(a.kind(), "ComputerBootFailed");
    }

    #[test]
    fn test_event_display() {
        let tick = SimEvent::Tick {
            frame: Frame::new(3),
            delta_seconds: 0.5,
        };
        assert_eq!(format!("{}", tick), "Tick(F3, 0.5s)");
    }
}
