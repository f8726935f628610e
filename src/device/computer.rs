//! `Computer`: power state machine, loaded kernel, console.

use tracing::{debug, error, info};

use crate::description::ComputerDescription;
use crate::error::SimResult;
use crate::event::SimEvent;
use crate::id::DeviceId;
use crate::kernel::{BootOrderItem, Kernel, KernelContext};
use crate::simulation::Simulation;

use super::console::Console;

// ── Power state ───────────────────────────────────────────────────────

/// Where a computer is in its power cycle.
///
/// `Booting` and `ShuttingDown` are transient: they are only observable
/// from inside kernel hooks and event subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerState {
    Off,
    Booting,
    Running,
    ShuttingDown,
}

// ── Computer ──────────────────────────────────────────────────────────

/// Runtime state of a computer.
pub struct Computer {
    description: ComputerDescription,
    state: PowerState,
    kernel: Option<Box<dyn Kernel>>,
    console: Console,
}

impl Computer {
    pub(crate) fn new(description: ComputerDescription, console_lines: usize) -> Self {
        Computer {
            description,
            state: PowerState::Off,
            kernel: None,
            console: Console::new(console_lines),
        }
    }

    pub fn description(&self) -> &ComputerDescription {
        &self.description
    }

    pub fn power_state(&self) -> PowerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PowerState::Running
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub(crate) fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    /// Downcast the loaded kernel to a concrete type.
    ///
    /// `None` when no kernel is loaded, or it is of another type.
    pub fn kernel<T: 'static>(&self) -> Option<&T> {
        self.kernel.as_ref()?.as_any().downcast_ref::<T>()
    }
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computer")
            .field("description", &self.description)
            .field("state", &self.state)
            .field("kernel_loaded", &self.kernel.is_some())
            .field("console_lines", &self.console.len())
            .finish()
    }
}

// ── Simulation power operations ───────────────────────────────────────

impl Simulation {
    /// Boot `computer` from the first usable entry of `order`.
    ///
    /// Does nothing unless the computer is off. Entries are tried in order;
    /// an entry is skipped, with a console line saying why, when its device
    /// is not directly connected, carries no kernel with that exact name and
    /// version, or the kernel targets another architecture. The first
    /// kernel whose factory succeeds is started. If a factory fails, boot
    /// stops there with `ComputerBootFailed`.
    ///
    /// Kernel failures are reported through events and the log, never
    /// through the return value, which only carries lookup errors and
    /// `Closed`.
    pub fn boot(&mut self, computer: DeviceId, order: &[BootOrderItem]) -> SimResult<()> {
        self.ensure_open()?;
        let architecture = {
            let c = self.computer_mut(computer)?;
            if c.state != PowerState::Off {
                debug!(computer = %computer, state = ?c.state, "boot ignored");
                return Ok(());
            }
            c.state = PowerState::Booting;
            c.description.architecture.clone()
        };
        self.publish(SimEvent::ComputerBooting { computer })?;

        for item in order {
            if !self.are_directly_connected(computer, item.device) {
                self.write_console(computer, &format!("device {} is not connected", item.device));
                continue;
            }

            let found = self
                .storage_device(item.device)
                .and_then(|s| s.find_kernel(&item.name, item.version))
                .cloned();
            let Some(executable) = found else {
                self.write_console(
                    computer,
                    &format!(
                        "no kernel found on {} with name {}:{}",
                        item.device, item.name, item.version
                    ),
                );
                continue;
            };

            if executable.description().compatibility.architecture != architecture {
                self.write_console(computer, "kernel is not compatible with this architecture");
                continue;
            }

            let (created, mut shutdown_requested) = {
                let mut ctx = KernelContext::new(self, computer);
                let created = executable.execute(&mut ctx, &item.parameters);
                (created, ctx.shutdown_requested())
            };
            let mut kernel = match created {
                Ok(kernel) => kernel,
                Err(e) => {
                    error!(computer = %computer, kernel = %item.name, error = %e, "kernel failed to load");
                    self.computer_mut(computer)?.state = PowerState::Off;
                    self.publish(SimEvent::ComputerBootFailed {
                        computer,
                        message: e.to_string(),
                    })?;
                    return Ok(());
                }
            };

            self.computer_mut(computer)?.state = PowerState::Running;
            self.publish(SimEvent::ComputerBooted { computer })?;
            info!(
                computer = %computer,
                kernel = %item.name,
                version = %item.version,
                "computer booted"
            );

            let started = {
                let mut ctx = KernelContext::new(self, computer);
                let started = kernel.on_start(&mut ctx);
                shutdown_requested |= ctx.shutdown_requested();
                started
            };
            if let Err(e) = started {
                error!(computer = %computer, kernel = %item.name, error = %e, "kernel start failed");
            }

            self.computer_mut(computer)?.kernel = Some(kernel);
            if shutdown_requested {
                self.shutdown(computer)?;
            }
            return Ok(());
        }

        self.computer_mut(computer)?.state = PowerState::Off;
        self.publish(SimEvent::ComputerBootFailed {
            computer,
            message: "No kernel available".into(),
        })?;
        debug!(computer = %computer, candidates = order.len(), "no kernel available");
        Ok(())
    }

    /// Shut `computer` down. Does nothing unless it is running.
    ///
    /// The kernel's `on_shutdown` runs between `ComputerShuttingDown` and
    /// `ComputerShutDown`; its failure is written to the console and the
    /// shutdown completes anyway.
    pub fn shutdown(&mut self, computer: DeviceId) -> SimResult<()> {
        self.ensure_open()?;
        let kernel = {
            let c = self.computer_mut(computer)?;
            if c.state != PowerState::Running {
                debug!(computer = %computer, state = ?c.state, "shutdown ignored");
                return Ok(());
            }
            c.state = PowerState::ShuttingDown;
            c.kernel.take()
        };
        self.publish(SimEvent::ComputerShuttingDown { computer })?;

        if let Some(mut kernel) = kernel {
            let mut ctx = KernelContext::new(self, computer);
            if let Err(e) = kernel.on_shutdown(&mut ctx) {
                ctx.write_console(format!("kernel shutdown failed: {}", e));
                debug!(computer = %computer, error = %e, "kernel shutdown failed");
            }
        }

        self.computer_mut(computer)?.state = PowerState::Off;
        self.publish(SimEvent::ComputerShutDown { computer })?;
        info!(computer = %computer, "computer shut down");
        Ok(())
    }
}
