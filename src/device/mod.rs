//! Simulated hardware devices.
//!
//! A [`Device`] is either a [`Computer`] or a [`StorageDevice`]. Each owns a
//! fixed set of [`Connector`]s and [`Socket`]s, created from its
//! description and never resized. The [`Simulation`](crate::Simulation)
//! owns every device; this module adds the device-level operations to it.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`port`] | [`Connector`], [`Socket`] + connection operations |
//! | [`console`] | [`Console`] line buffer |
//! | [`computer`] | [`Computer`], [`PowerState`] + boot / shutdown |
//! | [`storage`] | [`StorageDevice`] + kernel installation |

pub mod computer;
pub mod console;
pub mod port;
pub mod storage;

pub use computer::{Computer, PowerState};
pub use console::Console;
pub use port::{Connector, Socket};
pub use storage::StorageDevice;

use crate::id::{ConnectorId, DeviceId, SocketId};

/// What kind of device this is, with its runtime state.
#[derive(Debug)]
pub enum DeviceKind {
    Computer(Computer),
    Storage(StorageDevice),
}

/// A device in the simulation.
#[derive(Debug)]
pub struct Device {
    id: DeviceId,
    connectors: Vec<ConnectorId>,
    sockets: Vec<SocketId>,
    kind: DeviceKind,
}

impl Device {
    pub(crate) fn new(
        id: DeviceId,
        connectors: Vec<ConnectorId>,
        sockets: Vec<SocketId>,
        kind: DeviceKind,
    ) -> Self {
        Device {
            id,
            connectors,
            sockets,
            kind,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Connectors owned by this device, in description order.
    pub fn connectors(&self) -> &[ConnectorId] {
        &self.connectors
    }

    /// Sockets owned by this device, in description order.
    pub fn sockets(&self) -> &[SocketId] {
        &self.sockets
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    pub fn as_computer(&self) -> Option<&Computer> {
        match &self.kind {
            DeviceKind::Computer(c) => Some(c),
            DeviceKind::Storage(_) => None,
        }
    }

    pub fn as_storage(&self) -> Option<&StorageDevice> {
        match &self.kind {
            DeviceKind::Storage(s) => Some(s),
            DeviceKind::Computer(_) => None,
        }
    }

    pub(crate) fn as_computer_mut(&mut self) -> Option<&mut Computer> {
        match &mut self.kind {
            DeviceKind::Computer(c) => Some(c),
            DeviceKind::Storage(_) => None,
        }
    }

    pub(crate) fn as_storage_mut(&mut self) -> Option<&mut StorageDevice> {
        match &mut self.kind {
            DeviceKind::Storage(s) => Some(s),
            DeviceKind::Computer(_) => None,
        }
    }
}
