use selene::description::{
    Architecture, ComputerDescription, Protocol, StorageDeviceDescription, Version,
};
use selene::kernel::builtin::{hello_world, installer, TARGET_DEVICE};
use selene::{BootOrderItem, DeviceId, SimError, SimEvent, Simulation, SimulationConfig};
use tracing_subscriber::{fmt, EnvFilter};

const HELLO_SIZE_OCTETS: u64 = 5_855_104;

fn main() -> Result<(), SimError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    println!("═══════════════════════════════════════════════════════");
    println!("  Selene: Deterministic Hardware Simulation");
    println!("  Installer demo: install HELLO, then boot it");
    println!("═══════════════════════════════════════════════════════");
    println!();

    run("Large disk", 1_000_000_000)?;
    run("Small disk", 1_000)?;

    println!("  ✓ Installer demo complete.");
    Ok(())
}

fn run(label: &str, capacity: u64) -> Result<(), SimError> {
    println!("  {} ({} octets):", label, capacity);

    let mut sim = Simulation::with_config(SimulationConfig::seeded(42))?;
    sim.subscribe(Box::new(|event: &SimEvent| {
        if !matches!(event, SimEvent::Tick { .. }) {
            println!("    event   {}", event);
        }
    }))?;

    let arch = Architecture::new("PK3");
    let computer = sim.create_computer(
        ComputerDescription::new(arch.clone()).with_socket(Protocol::new("GPB-0")),
    )?;
    let storage = sim.create_storage_device(
        StorageDeviceDescription::new(capacity)
            .with_connector(Protocol::new("GPB-0"))
            .with_kernel(installer(
                arch.clone(),
                hello_world(arch, HELLO_SIZE_OCTETS),
            )),
    )?;

    let socket = port(&sim, computer, |d| d.sockets().first().copied())?;
    let connector = port(&sim, storage, |d| d.connectors().first().copied())?;
    let linked = sim.connect(connector, socket);
    sim.tick(0.016)?;
    if let Some(Err(e)) = linked.result() {
        return Err(e);
    }

    let v010 = Version::new(0, 1, 0);
    sim.boot(
        computer,
        &[BootOrderItem::new(storage, "INSTALLER", v010)
            .with_parameter(TARGET_DEVICE, storage.to_string())],
    )?;
    sim.tick(0.016)?;

    sim.boot(computer, &[BootOrderItem::new(storage, "HELLO", v010)])?;
    sim.shutdown(computer)?;

    if let Some(c) = sim.computer(computer) {
        for line in c.console().lines() {
            println!("    console {}", line);
        }
    }
    if let Some(s) = sim.storage_device(storage) {
        println!(
            "    storage {} / {} octets used",
            s.space_used_octets(),
            s.capacity_octets()
        );
    }

    sim.close();
    println!();
    Ok(())
}

fn port<T>(
    sim: &Simulation,
    device: DeviceId,
    pick: impl Fn(&selene::Device) -> Option<T>,
) -> Result<T, SimError> {
    sim.device(device)
        .and_then(pick)
        .ok_or(SimError::UnknownDevice(device))
}
