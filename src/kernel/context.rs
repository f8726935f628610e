//! `KernelContext`: what a running kernel can see and do.

use std::fmt::Display;

use crate::description::Architecture;
use crate::device::{Device, DeviceKind};
use crate::error::{SimError, SimResult};
use crate::id::DeviceId;
use crate::scheduler::TaskHandle;
use crate::simulation::Simulation;
use crate::time::Frame;

use super::KernelExecutable;

// ── Device view ───────────────────────────────────────────────────────

/// Snapshot of a device as seen from a kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceInterface {
    Computer {
        id: DeviceId,
        architecture: Architecture,
    },
    Storage {
        id: DeviceId,
        capacity_octets: u64,
        space_used_octets: u64,
    },
}

impl DeviceInterface {
    pub(crate) fn of(device: &Device) -> Self {
        match device.kind() {
            DeviceKind::Computer(c) => DeviceInterface::Computer {
                id: device.id(),
                architecture: c.description().architecture.clone(),
            },
            DeviceKind::Storage(s) => DeviceInterface::Storage {
                id: device.id(),
                capacity_octets: s.capacity_octets(),
                space_used_octets: s.space_used_octets(),
            },
        }
    }

    pub fn id(&self) -> DeviceId {
        match self {
            DeviceInterface::Computer { id, .. } | DeviceInterface::Storage { id, .. } => *id,
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, DeviceInterface::Storage { .. })
    }

    /// Whether `size_octets` would currently fit. Always `false` for
    /// computers.
    pub fn space_available_for(&self, size_octets: u64) -> bool {
        match self {
            DeviceInterface::Computer { .. } => false,
            DeviceInterface::Storage {
                capacity_octets,
                space_used_octets,
                ..
            } => capacity_octets.saturating_sub(*space_used_octets) >= size_octets,
        }
    }
}

// ── KernelContext ─────────────────────────────────────────────────────

/// Handle passed to kernel factories and hooks.
///
/// Borrows the simulation for the duration of one call. A shutdown
/// requested through the context is applied by the computer once the
/// current hook has returned.
pub struct KernelContext<'a> {
    sim: &'a mut Simulation,
    computer: DeviceId,
    shutdown_requested: bool,
}

impl<'a> KernelContext<'a> {
    pub(crate) fn new(sim: &'a mut Simulation, computer: DeviceId) -> Self {
        KernelContext {
            sim,
            computer,
            shutdown_requested: false,
        }
    }

    /// The computer this kernel runs on.
    pub fn computer(&self) -> DeviceId {
        self.computer
    }

    /// The simulation's current frame.
    pub fn frame(&self) -> Frame {
        self.sim.frame()
    }

    /// Append `message` to the computer's console, one entry per line.
    pub fn write_console(&mut self, message: impl Display) {
        self.sim.write_console(self.computer, &message.to_string());
    }

    /// Ask for the computer to shut down once the current hook returns.
    pub fn shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Every device directly connected to this computer.
    pub fn connected_devices(&self) -> Vec<DeviceInterface> {
        self.sim
            .graph()
            .devices_connected_to(self.computer)
            .into_iter()
            .filter_map(|id| self.sim.device(id))
            .map(DeviceInterface::of)
            .collect()
    }

    /// Queue installation of `executable` onto a connected storage device.
    ///
    /// Fails immediately if the device is not directly connected or is not
    /// a storage device. Space is checked when the installation runs, and
    /// reported through the returned handle.
    pub fn add_kernel(
        &mut self,
        device: DeviceId,
        executable: KernelExecutable,
    ) -> SimResult<TaskHandle> {
        if !self.sim.are_directly_connected(self.computer, device) {
            return Err(SimError::DeviceNotConnected {
                computer: self.computer,
                device,
            });
        }
        if self.sim.storage_device(device).is_none() {
            return Err(SimError::DeviceKindMismatch {
                device,
                expected: "storage device",
            });
        }
        Ok(self.sim.add_kernel(device, executable))
    }
}

impl std::fmt::Debug for KernelContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelContext")
            .field("computer", &self.computer)
            .field("shutdown_requested", &self.shutdown_requested)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_space_available_for() {
        let id = DeviceId::from_uuid(Uuid::new_v4());
        let storage = DeviceInterface::Storage {
            id,
            capacity_octets: 100,
            space_used_octets: 40,
        };
        assert!(storage.space_available_for(60));
        assert!(!storage.space_available_for(61));
        assert!(storage.is_storage());
        assert_eq!(storage.id(), id);

        let computer = DeviceInterface::Computer {
            id,
            architecture: Architecture::new("PK3"),
        };
        assert!(!computer.space_available_for(0));
        assert!(!computer.is_storage());
    }
}
