//! # Selene: Deterministic Hardware Simulation
//!
//! A discrete-event simulation of connected hardware: computers and
//! storage devices linked connector-to-socket, computers booting kernel
//! programs found on the storage they are plugged into. No async, no
//! threads, no wall-clock time. State changes to the connection graph and
//! to storage are queued and applied one at a time during `tick`.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────┐
//! │            Simulation             │ ← arena of devices + ports
//! │  ┌────────────┐  ┌─────────────┐  │
//! │  │ IdRegistry │  │  TaskQueue  │  │ ← ids / deferred mutations
//! │  └────────────┘  └─────────────┘  │
//! │  ┌────────────┐  ┌─────────────┐  │
//! │  │DeviceGraph │  │  EventBus   │  │ ← links / event stream
//! │  └────────────┘  └─────────────┘  │
//! │  ┌─────────────────────────────┐  │
//! │  │ Computer ─ Kernel ─ Storage │  │ ← boot state machine
//! │  └─────────────────────────────┘  │
//! └───────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use selene::description::{Architecture, ComputerDescription, Protocol, StorageDeviceDescription, Version};
//! use selene::kernel::{builtin::hello_world, BootOrderItem};
//! use selene::Simulation;
//!
//! let mut sim = Simulation::new();
//! let pc = sim
//!     .create_computer(ComputerDescription::new(Architecture::new("PK3")).with_socket(Protocol::new("P")))
//!     .unwrap();
//! let disk = sim
//!     .create_storage_device(
//!         StorageDeviceDescription::new(1_000)
//!             .with_connector(Protocol::new("P"))
//!             .with_kernel(hello_world(Architecture::new("PK3"), 100)),
//!     )
//!     .unwrap();
//!
//! let socket = sim.device(pc).unwrap().sockets()[0];
//! let connector = sim.device(disk).unwrap().connectors()[0];
//! sim.connect(connector, socket);
//! sim.tick(0.016).unwrap();
//!
//! sim.boot(pc, &[BootOrderItem::new(disk, "HELLO", Version::new(0, 1, 0))]).unwrap();
//! assert!(sim.computer(pc).unwrap().is_running());
//! ```

pub mod bus;
pub mod config;
pub mod description;
pub mod device;
pub mod error;
pub mod event;
pub mod graph;
pub mod id;
pub mod kernel;
pub mod registry;
pub mod scheduler;
pub mod simulation;
pub mod time;

// Re-exports for convenience.
pub use bus::{EventBus, EventRecorder, EventSubscriber, SubscriptionId};
pub use config::SimulationConfig;
pub use device::{Computer, Connector, Device, DeviceKind, PowerState, Socket, StorageDevice};
pub use error::{SimError, SimResult};
pub use event::SimEvent;
pub use graph::DeviceGraph;
pub use id::{ConnectorId, DeviceId, Endpoint, SocketId};
pub use kernel::{BootOrderItem, BootParameters, Kernel, KernelContext, KernelError, KernelExecutable};
pub use scheduler::{TaskHandle, TaskId, TaskState};
pub use simulation::{Simulation, TickSummary};
pub use time::Frame;
