//! `INSTALLER`: copies a kernel onto a connected storage device, then
//! shuts the computer down.
//!
//! The storage device is named by the `target_device` boot parameter. The
//! installer always shuts down when it is done, whether or not the
//! installation was queued.

use tracing::debug;

use crate::description::{Architecture, KernelCompatibility, KernelDescription, Version};
use crate::id::DeviceId;
use crate::kernel::{Kernel, KernelContext, KernelError, KernelExecutable};
use crate::scheduler::TaskHandle;

pub const INSTALLER_NAME: &str = "INSTALLER";
pub const INSTALLER_SIZE_OCTETS: u64 = 5_855_104;

/// Boot parameter naming the device to install onto.
pub const TARGET_DEVICE: &str = "target_device";

/// Executable for the `INSTALLER` kernel, version 0.1.0, carrying `install`.
pub fn installer(architecture: Architecture, install: KernelExecutable) -> KernelExecutable {
    let description = KernelDescription {
        name: INSTALLER_NAME.into(),
        version: Version::new(0, 1, 0),
        compatibility: KernelCompatibility::new(architecture),
        size_octets: INSTALLER_SIZE_OCTETS,
    };
    KernelExecutable::new(description, move |_ctx, parameters| {
        let kernel: Box<dyn Kernel> = Box::new(Installer::new(
            install.clone(),
            parameters.get(TARGET_DEVICE).map(str::to_owned),
        ));
        Ok(kernel)
    })
}

/// The running `INSTALLER` kernel.
#[derive(Debug, Clone)]
pub struct Installer {
    install: KernelExecutable,
    target: Option<String>,
    /// Handle of the queued installation, once one was queued.
    pub installation: Option<TaskHandle>,
}

impl Installer {
    fn new(install: KernelExecutable, target: Option<String>) -> Self {
        Installer {
            install,
            target,
            installation: None,
        }
    }

    fn run(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        let desc = self.install.description();
        ctx.write_console(format!(
            "starting installer for {} {}",
            desc.name, desc.version
        ));

        let Some(target) = self.target.as_deref() else {
            ctx.write_console("no target device specified");
            return Ok(());
        };

        let target_id = DeviceId::parse(target);
        let Some(device) = ctx
            .connected_devices()
            .into_iter()
            .find(|d| Some(d.id()) == target_id)
        else {
            ctx.write_console("target device does not exist or is not connected");
            return Ok(());
        };

        if !device.is_storage() {
            ctx.write_console("target device is not a storage device");
            return Ok(());
        }
        if !device.space_available_for(desc.size_octets) {
            ctx.write_console("not enough space available to install kernel");
            return Ok(());
        }

        let handle = ctx.add_kernel(device.id(), self.install.clone())?;
        debug!(
            computer = %ctx.computer(),
            target = %device.id(),
            task = %handle.id(),
            "installation queued"
        );
        self.installation = Some(handle);
        Ok(())
    }
}

impl Kernel for Installer {
    fn on_start(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        let result = self.run(ctx);
        if result.is_err() {
            ctx.write_console("an error occurred during kernel installation");
        }
        ctx.write_console("shutting down");
        ctx.shutdown();
        result
    }

    fn on_shutdown(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        ctx.write_console("shutting down");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
