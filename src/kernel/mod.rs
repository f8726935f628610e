//! Kernel programs and the contract computers boot them through.
//!
//! A kernel is distributed as a [`KernelExecutable`]: an immutable
//! [`KernelDescription`] plus a factory that produces a running [`Kernel`]
//! from a boot context and a set of [`BootParameters`]. Storage devices
//! carry executables; computers find them through a boot order and run them.

mod context;

pub mod builtin;

pub use context::{DeviceInterface, KernelContext};

use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

use crate::description::{KernelDescription, Version};
use crate::error::SimError;
use crate::id::DeviceId;

// ── Errors ────────────────────────────────────────────────────────────

/// Error raised by a kernel factory or hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    /// The kernel gave up with a message of its own.
    #[error("{0}")]
    Failed(String),

    /// A simulation operation requested by the kernel failed.
    #[error(transparent)]
    Simulation(#[from] SimError),
}

impl KernelError {
    pub fn failed(message: impl Into<String>) -> Self {
        KernelError::Failed(message.into())
    }
}

// ── Kernel ────────────────────────────────────────────────────────────

/// A running kernel.
///
/// Hooks receive a [`KernelContext`], the only channel through which a
/// kernel affects the simulation. Errors from either hook are reported by
/// the computer and never abort it: a failed `on_start` leaves the computer
/// running, a failed `on_shutdown` still completes the shutdown.
///
/// # Example
///
/// ```rust
/// use selene::kernel::{Kernel, KernelContext, KernelError};
///
/// struct Idle;
///
/// impl Kernel for Idle {
///     fn on_start(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
///         ctx.write_console("idle");
///         Ok(())
///     }
///     fn on_shutdown(&mut self, _ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
///         Ok(())
///     }
///     fn as_any(&self) -> &dyn std::any::Any { self }
/// }
/// ```
pub trait Kernel {
    /// Called once, right after the computer transitions to running.
    fn on_start(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError>;

    /// Called once when the computer shuts down.
    fn on_shutdown(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError>;

    /// Downcast support for [`Computer::kernel`](crate::device::Computer::kernel).
    fn as_any(&self) -> &dyn std::any::Any;
}

// ── Executable ────────────────────────────────────────────────────────

/// Produces a running kernel from a boot context and its parameters.
pub type KernelFactory =
    dyn Fn(&mut KernelContext<'_>, &BootParameters) -> Result<Box<dyn Kernel>, KernelError>;

/// A kernel as stored on a device: a description and a factory.
///
/// Cloning is cheap; clones share the factory.
#[derive(Clone)]
pub struct KernelExecutable {
    description: KernelDescription,
    factory: Rc<KernelFactory>,
}

impl KernelExecutable {
    pub fn new<F>(description: KernelDescription, factory: F) -> Self
    where
        F: Fn(&mut KernelContext<'_>, &BootParameters) -> Result<Box<dyn Kernel>, KernelError>
            + 'static,
    {
        KernelExecutable {
            description,
            factory: Rc::new(factory),
        }
    }

    pub fn description(&self) -> &KernelDescription {
        &self.description
    }

    /// Size of the executable on disk.
    pub fn size_octets(&self) -> u64 {
        self.description.size_octets
    }

    pub(crate) fn execute(
        &self,
        ctx: &mut KernelContext<'_>,
        parameters: &BootParameters,
    ) -> Result<Box<dyn Kernel>, KernelError> {
        (self.factory)(ctx, parameters)
    }
}

impl std::fmt::Debug for KernelExecutable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelExecutable")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

// ── Boot order ────────────────────────────────────────────────────────

/// String key/value parameters handed to a kernel factory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BootParameters(BTreeMap<String, String>);

impl BootParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BootParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        BootParameters(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One candidate in a boot order: which kernel to look for, on which
/// device, and what to pass it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BootOrderItem {
    pub device: DeviceId,
    pub name: String,
    pub version: Version,
    pub parameters: BootParameters,
}

impl BootOrderItem {
    pub fn new(device: DeviceId, name: impl Into<String>, version: Version) -> Self {
        BootOrderItem {
            device,
            name: name.into(),
            version,
            parameters: BootParameters::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key, value);
        self
    }
}
