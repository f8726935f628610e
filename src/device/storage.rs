//! `StorageDevice`: fixed capacity, append-only kernel list.

use tracing::debug;

use crate::description::{StorageDeviceDescription, Version};
use crate::error::{SimError, SimResult};
use crate::id::DeviceId;
use crate::kernel::KernelExecutable;
use crate::scheduler::TaskHandle;
use crate::simulation::Simulation;

/// Runtime state of a storage device.
///
/// Space used only ever grows: there is no way to remove a kernel.
/// Kernels from the initial description are present without counting
/// towards space used.
#[derive(Debug, Clone)]
pub struct StorageDevice {
    description: StorageDeviceDescription,
    space_used: u64,
    kernels: Vec<KernelExecutable>,
}

impl StorageDevice {
    pub(crate) fn new(description: StorageDeviceDescription) -> Self {
        let kernels = description.kernels.clone();
        StorageDevice {
            description,
            space_used: 0,
            kernels,
        }
    }

    pub fn description(&self) -> &StorageDeviceDescription {
        &self.description
    }

    pub fn capacity_octets(&self) -> u64 {
        self.description.capacity_octets
    }

    pub fn space_used_octets(&self) -> u64 {
        self.space_used
    }

    pub fn space_available_octets(&self) -> u64 {
        self.description.capacity_octets.saturating_sub(self.space_used)
    }

    /// Kernels on the device, preloaded ones first, then in install order.
    pub fn kernels(&self) -> &[KernelExecutable] {
        &self.kernels
    }

    /// First kernel whose name and version match exactly.
    pub fn find_kernel(&self, name: &str, version: Version) -> Option<&KernelExecutable> {
        self.kernels
            .iter()
            .find(|k| k.description().matches(name, version))
    }

    fn install(&mut self, device: DeviceId, executable: KernelExecutable) -> SimResult<()> {
        let required = executable.size_octets();
        let available = self.space_available_octets();
        if required > available {
            return Err(SimError::OutOfSpace {
                device,
                required,
                available,
            });
        }
        self.space_used += required;
        self.kernels.push(executable);
        Ok(())
    }
}

impl Simulation {
    /// Queue installation of `executable` onto storage device `device`.
    ///
    /// The handle fails with `OutOfSpace` if the kernel does not fit when
    /// the task runs.
    pub fn add_kernel(&mut self, device: DeviceId, executable: KernelExecutable) -> TaskHandle {
        self.run_later("add kernel", move |sim| {
            let name = executable.description().name.clone();
            let size = executable.size_octets();
            let storage = sim.storage_device_mut(device)?;
            storage.install(device, executable)?;
            debug!(
                device = %device,
                kernel = %name,
                size,
                used = storage.space_used_octets(),
                "kernel installed"
            );
            Ok(())
        })
    }
}
