//! Immutable descriptions of devices, ports and kernels.
//!
//! These are plain values: the simulation reads them when it builds a
//! device and never mutates them afterwards.

use crate::kernel::KernelExecutable;

// ── Value tags ────────────────────────────────────────────────────────

/// A CPU architecture name. Kernels only boot on a matching architecture.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Architecture(String);

impl Architecture {
    pub fn new(name: impl Into<String>) -> Self {
        Architecture(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A communication protocol tag. A connector only fits a socket whose
/// protocol is exactly equal to its own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Protocol(String);

impl Protocol {
    pub fn new(name: impl Into<String>) -> Self {
        Protocol(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `major.minor.patch` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ── Ports ─────────────────────────────────────────────────────────────

/// Layout entry for one connector on a device.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectorDescription {
    pub protocol: Protocol,
}

impl ConnectorDescription {
    pub fn new(protocol: Protocol) -> Self {
        ConnectorDescription { protocol }
    }
}

/// Layout entry for one socket on a device.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SocketDescription {
    pub protocol: Protocol,
}

impl SocketDescription {
    pub fn new(protocol: Protocol) -> Self {
        SocketDescription { protocol }
    }
}

// ── Devices ───────────────────────────────────────────────────────────

/// Everything needed to build a computer.
///
/// ```rust
/// use selene::description::{Architecture, ComputerDescription, Protocol};
///
/// let desc = ComputerDescription::new(Architecture::new("PK3"))
///     .with_socket(Protocol::new("GPB-0"))
///     .with_socket(Protocol::new("GPB-0"));
/// assert_eq!(desc.sockets.len(), 2);
/// assert!(desc.connectors.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ComputerDescription {
    pub architecture: Architecture,
    pub connectors: Vec<ConnectorDescription>,
    pub sockets: Vec<SocketDescription>,
}

impl ComputerDescription {
    pub fn new(architecture: Architecture) -> Self {
        ComputerDescription {
            architecture,
            connectors: Vec::new(),
            sockets: Vec::new(),
        }
    }

    /// Append a connector speaking `protocol`.
    pub fn with_connector(mut self, protocol: Protocol) -> Self {
        self.connectors.push(ConnectorDescription::new(protocol));
        self
    }

    /// Append a socket speaking `protocol`.
    pub fn with_socket(mut self, protocol: Protocol) -> Self {
        self.sockets.push(SocketDescription::new(protocol));
        self
    }
}

/// Everything needed to build a storage device.
///
/// Kernels listed here are present from the moment the device exists and
/// do not count towards the space used on it.
#[derive(Debug, Clone)]
pub struct StorageDeviceDescription {
    pub capacity_octets: u64,
    pub connectors: Vec<ConnectorDescription>,
    pub sockets: Vec<SocketDescription>,
    pub kernels: Vec<KernelExecutable>,
}

impl StorageDeviceDescription {
    pub fn new(capacity_octets: u64) -> Self {
        StorageDeviceDescription {
            capacity_octets,
            connectors: Vec::new(),
            sockets: Vec::new(),
            kernels: Vec::new(),
        }
    }

    pub fn with_connector(mut self, protocol: Protocol) -> Self {
        self.connectors.push(ConnectorDescription::new(protocol));
        self
    }

    pub fn with_socket(mut self, protocol: Protocol) -> Self {
        self.sockets.push(SocketDescription::new(protocol));
        self
    }

    /// Preload a kernel onto the device.
    pub fn with_kernel(mut self, kernel: KernelExecutable) -> Self {
        self.kernels.push(kernel);
        self
    }
}

// ── Kernels ───────────────────────────────────────────────────────────

/// The platform a kernel can run on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct KernelCompatibility {
    pub architecture: Architecture,
}

impl KernelCompatibility {
    pub fn new(architecture: Architecture) -> Self {
        KernelCompatibility { architecture }
    }
}

/// Identity and footprint of a kernel program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct KernelDescription {
    pub name: String,
    pub version: Version,
    pub compatibility: KernelCompatibility,
    pub size_octets: u64,
}

impl KernelDescription {
    /// Exact name and version match, as used by boot order lookup.
    pub fn matches(&self, name: &str, version: Version) -> bool {
        self.name == name && self.version == version
    }
}
