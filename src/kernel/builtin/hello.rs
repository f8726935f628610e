//! `HELLO`: greets on start and on shutdown.

use crate::description::{Architecture, KernelCompatibility, KernelDescription, Version};
use crate::kernel::{BootParameters, Kernel, KernelContext, KernelError, KernelExecutable};
use crate::time::Frame;

pub const HELLO_NAME: &str = "HELLO";

/// Executable for the `HELLO` kernel, version 0.1.0.
pub fn hello_world(architecture: Architecture, size_octets: u64) -> KernelExecutable {
    let description = KernelDescription {
        name: HELLO_NAME.into(),
        version: Version::new(0, 1, 0),
        compatibility: KernelCompatibility::new(architecture),
        size_octets,
    };
    KernelExecutable::new(description, start)
}

fn start(
    _ctx: &mut KernelContext<'_>,
    _parameters: &BootParameters,
) -> Result<Box<dyn Kernel>, KernelError> {
    Ok(Box::new(HelloWorld::default()))
}

/// The running `HELLO` kernel.
#[derive(Debug, Clone, Default)]
pub struct HelloWorld {
    /// Frame at which `on_start` ran.
    pub started_at: Option<Frame>,
}

impl Kernel for HelloWorld {
    fn on_start(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        self.started_at = Some(ctx.frame());
        ctx.write_console("booting HELLO WORLD!");
        Ok(())
    }

    fn on_shutdown(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        ctx.write_console("shutting down HELLO WORLD!");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
