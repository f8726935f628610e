/// Simulation aggregate.
///
/// Owns every device, connector and socket (an arena keyed by typed id),
/// together with the identity registry, event bus, device graph and
/// deferred task queue. All mutation goes through `&mut Simulation`; the
/// loop is purely synchronous and single-threaded.
///
/// Time advances only through [`Simulation::tick`], which publishes a
/// `Tick` event and then drains the tasks that were queued before it.

use std::collections::BTreeMap;

use tracing::{debug, info, trace};

use crate::bus::{EventBus, EventSubscriber, SubscriptionId};
use crate::config::SimulationConfig;
use crate::description::{ComputerDescription, StorageDeviceDescription};
use crate::device::{Computer, Connector, Device, DeviceKind, Socket, StorageDevice};
use crate::error::{SimError, SimResult};
use crate::event::SimEvent;
use crate::graph::DeviceGraph;
use crate::id::{ConnectorId, DeviceId, SocketId};
use crate::registry::IdRegistry;
use crate::scheduler::{TaskHandle, TaskQueue};
use crate::time::Frame;

// ── Tick summary ──────────────────────────────────────────────────────

/// What happened during one call to [`Simulation::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// The frame that was published.
    pub frame: Frame,
    /// Tasks drained during this tick.
    pub tasks_run: usize,
    /// Of those, how many failed.
    pub tasks_failed: usize,
}

// ── Simulation ────────────────────────────────────────────────────────

/// Top-level simulation.
pub struct Simulation {
    config: SimulationConfig,
    registry: IdRegistry,
    bus: EventBus,
    graph: DeviceGraph,
    tasks: TaskQueue<Simulation>,
    devices: BTreeMap<DeviceId, Device>,
    connectors: BTreeMap<ConnectorId, Connector>,
    sockets: BTreeMap<SocketId, Socket>,
    frame: Frame,
    closed: bool,
}

impl Simulation {
    /// Create a simulation with the default configuration.
    pub fn new() -> Self {
        Self::build(SimulationConfig::default())
    }

    /// Create a simulation from a validated configuration.
    pub fn with_config(config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SimulationConfig) -> Self {
        let registry = match config.id_seed {
            Some(seed) => IdRegistry::seeded(seed),
            None => IdRegistry::new(),
        };
        Simulation {
            config,
            registry,
            bus: EventBus::new(),
            graph: DeviceGraph::new(),
            tasks: TaskQueue::new(),
            devices: BTreeMap::new(),
            connectors: BTreeMap::new(),
            sockets: BTreeMap::new(),
            frame: Frame::ZERO,
            closed: false,
        }
    }

    // ── Events ────────────────────────────────────────────────

    /// Register a subscriber for events published from now on.
    pub fn subscribe(&mut self, subscriber: Box<dyn EventSubscriber>) -> SimResult<SubscriptionId> {
        self.bus.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Number of events delivered to subscribers so far.
    pub fn events_delivered(&self) -> u64 {
        self.bus.delivered_count()
    }

    /// Number of events dropped as immediate repeats.
    pub fn events_suppressed(&self) -> u64 {
        self.bus.suppressed_count()
    }

    pub(crate) fn publish(&mut self, event: SimEvent) -> SimResult<bool> {
        self.bus.publish(event)
    }

    // ── Device creation ───────────────────────────────────────

    /// Create a computer. It starts powered off.
    pub fn create_computer(&mut self, description: ComputerDescription) -> SimResult<DeviceId> {
        self.ensure_open()?;
        let id = self.fresh_device_id();
        let computer = Computer::new(description.clone(), self.config.console_lines);
        self.insert_device(
            id,
            &description.connectors,
            &description.sockets,
            DeviceKind::Computer(computer),
        )?;
        info!(device = %id, architecture = %description.architecture, "computer created");
        Ok(id)
    }

    /// Create a storage device. Kernels listed in the description are
    /// present immediately.
    pub fn create_storage_device(
        &mut self,
        description: StorageDeviceDescription,
    ) -> SimResult<DeviceId> {
        self.ensure_open()?;
        let id = self.fresh_device_id();
        let storage = StorageDevice::new(description.clone());
        self.insert_device(
            id,
            &description.connectors,
            &description.sockets,
            DeviceKind::Storage(storage),
        )?;
        info!(
            device = %id,
            capacity = description.capacity_octets,
            kernels = description.kernels.len(),
            "storage device created"
        );
        Ok(id)
    }

    fn fresh_device_id(&mut self) -> DeviceId {
        DeviceId::from_uuid(self.registry.fresh_id())
    }

    fn insert_device(
        &mut self,
        id: DeviceId,
        connector_descs: &[crate::description::ConnectorDescription],
        socket_descs: &[crate::description::SocketDescription],
        kind: DeviceKind,
    ) -> SimResult<()> {
        let mut connector_ports = Vec::with_capacity(connector_descs.len());
        for desc in connector_descs {
            let cid = ConnectorId::from_uuid(self.registry.fresh_id());
            self.connectors
                .insert(cid, Connector::new(cid, id, desc.protocol.clone()));
            connector_ports.push((cid, desc.protocol.clone()));
        }
        let mut socket_ports = Vec::with_capacity(socket_descs.len());
        for desc in socket_descs {
            let sid = SocketId::from_uuid(self.registry.fresh_id());
            self.sockets
                .insert(sid, Socket::new(sid, id, desc.protocol.clone()));
            socket_ports.push((sid, desc.protocol.clone()));
        }

        self.graph.add_device(id, &connector_ports, &socket_ports);
        let connectors = connector_ports.into_iter().map(|(c, _)| c).collect();
        let sockets = socket_ports.into_iter().map(|(s, _)| s).collect();
        self.devices
            .insert(id, Device::new(id, connectors, sockets, kind));
        self.publish(SimEvent::DeviceCreated { device: id })?;
        Ok(())
    }

    // ── Device destruction ────────────────────────────────────

    /// Queue destruction of a device.
    ///
    /// When the task runs, a running computer is shut down first, then
    /// every link touching the device is removed, then the device and its
    /// ports are dropped.
    pub fn destroy_device(&mut self, device: DeviceId) -> TaskHandle {
        self.run_later("destroy device", move |sim| sim.destroy_now(device))
    }

    fn destroy_now(&mut self, device: DeviceId) -> SimResult<()> {
        let running = match self.devices.get(&device) {
            None => return Err(SimError::UnknownDevice(device)),
            Some(d) => d.as_computer().is_some_and(Computer::is_running),
        };
        if running {
            self.shutdown(device)?;
        }

        self.publish(SimEvent::DeviceDestroying { device })?;
        let links = self.graph.on_device_destroying(device, &mut self.bus)?;
        if let Some(removed) = self.devices.remove(&device) {
            for c in removed.connectors() {
                self.connectors.remove(c);
            }
            for s in removed.sockets() {
                self.sockets.remove(s);
            }
        }
        self.publish(SimEvent::DeviceDestroyed { device })?;
        info!(device = %device, links, "device destroyed");
        Ok(())
    }

    // ── Lookup ────────────────────────────────────────────────

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    /// All devices, in id order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn computer(&self, id: DeviceId) -> Option<&Computer> {
        self.devices.get(&id).and_then(Device::as_computer)
    }

    pub fn storage_device(&self, id: DeviceId) -> Option<&StorageDevice> {
        self.devices.get(&id).and_then(Device::as_storage)
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(&id)
    }

    pub fn socket(&self, id: SocketId) -> Option<&Socket> {
        self.sockets.get(&id)
    }

    /// Read access to the connection graph.
    pub fn graph(&self) -> &DeviceGraph {
        &self.graph
    }

    pub(crate) fn graph_and_bus(&mut self) -> (&mut DeviceGraph, &mut EventBus) {
        (&mut self.graph, &mut self.bus)
    }

    pub(crate) fn computer_mut(&mut self, id: DeviceId) -> SimResult<&mut Computer> {
        match self.devices.get_mut(&id) {
            None => Err(SimError::UnknownDevice(id)),
            Some(d) => d.as_computer_mut().ok_or(SimError::DeviceKindMismatch {
                device: id,
                expected: "computer",
            }),
        }
    }

    pub(crate) fn storage_device_mut(&mut self, id: DeviceId) -> SimResult<&mut StorageDevice> {
        match self.devices.get_mut(&id) {
            None => Err(SimError::UnknownDevice(id)),
            Some(d) => d.as_storage_mut().ok_or(SimError::DeviceKindMismatch {
                device: id,
                expected: "storage device",
            }),
        }
    }

    /// Append `message` to a computer's console, one entry per line.
    pub(crate) fn write_console(&mut self, computer: DeviceId, message: &str) {
        if let Ok(c) = self.computer_mut(computer) {
            for line in message.lines() {
                trace!(computer = %computer, line, "console");
                c.console_mut().push_line(line);
            }
        }
    }

    // ── Deferred tasks ────────────────────────────────────────

    /// Queue `task` to run during the next tick.
    ///
    /// After close, the returned handle is already failed with `Closed`.
    pub(crate) fn run_later<F>(&mut self, label: &'static str, task: F) -> TaskHandle
    where
        F: FnOnce(&mut Simulation) -> SimResult<()> + 'static,
    {
        if self.closed {
            return self.tasks.reject(SimError::Closed);
        }
        let handle = self.tasks.submit(label, task);
        trace!(task = %handle.id(), label, "task queued");
        handle
    }

    /// Tasks queued and not yet run.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    // ── Time ──────────────────────────────────────────────────

    /// Advance one frame.
    ///
    /// Publishes `Tick` for the current frame, then runs the tasks that
    /// were queued before this call, in submission order. Tasks those
    /// tasks queue in turn wait for the next tick. A failing task resolves
    /// its handle with the error and does not stop the drain.
    pub fn tick(&mut self, delta_seconds: f64) -> SimResult<TickSummary> {
        self.ensure_open()?;
        let frame = self.frame;
        self.publish(SimEvent::Tick {
            frame,
            delta_seconds,
        })?;
        if let Some(next) = frame.next() {
            self.frame = next;
        }

        let mut summary = TickSummary {
            frame,
            tasks_run: 0,
            tasks_failed: 0,
        };
        let due = self.tasks.len();
        for _ in 0..due {
            let Some(task) = self.tasks.pop_next() else {
                break;
            };
            let (id, label) = (task.id(), task.label());
            summary.tasks_run += 1;
            if let Err(e) = task.run(self) {
                summary.tasks_failed += 1;
                debug!(task = %id, label, error = %e, "task failed");
            }
        }

        trace!(
            frame = %frame,
            run = summary.tasks_run,
            failed = summary.tasks_failed,
            "tick"
        );
        Ok(summary)
    }

    /// The frame the next tick will publish.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Close the simulation.
    ///
    /// Signals completion to every subscriber and drops queued tasks; their
    /// handles stay pending. Returns `false` if already closed.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        let dropped = self.tasks.discard_all();
        self.bus.close();
        info!(frame = %self.frame, dropped_tasks = dropped, "simulation closed");
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn ensure_open(&self) -> SimResult<()> {
        if self.closed {
            Err(SimError::Closed)
        } else {
            Ok(())
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The identity registry all ids in this simulation come from.
    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.frame)
            .field("devices", &self.devices.len())
            .field("links", &self.graph.link_count())
            .field("tasks", &self.tasks)
            .field("bus", &self.bus)
            .field("closed", &self.closed)
            .finish()
    }
}
