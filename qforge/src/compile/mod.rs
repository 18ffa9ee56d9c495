//! Build orchestration: machine + system → [`VmDefinition`].
//!
//! Steps run in a fixed order over a single [`Target`]:
//!
//! 1. resolve tags and seed identities ([`Machine::resolve`])
//! 2. defaults: clock and panic device
//! 3. identity: `-uuid`, `-name`
//! 4. firmware volumes
//! 5. attributes: CPU, memory, QMP, guest agent, SPICE, TPM
//! 6. volumes, via [`StorageHandler`]
//! 7. network connections
//! 8. passthrough and mediated devices
//!
//! The order decides which root ports and ids each device receives, so it
//! is part of the output format.

mod attributes;
mod storage;
mod target;

pub use storage::StorageHandler;
pub use target::{Target, VolumeSpec};

use std::collections::BTreeMap;

use qforge_shared::errors::{QforgeError, QforgeResult};

use crate::machine::{Connection, Definition, Device, Machine, MachineInfo, Vars, Volume, link_name};
use crate::options::QforgeOptions;
use crate::qemu::{Global, VmDefinition};
use crate::qemu::guest::{ClockBase, ClockIsolation, DriftFix};
use crate::system::{Network, Storage, System};

/// Compile a machine with the default [`QforgeOptions`].
pub fn build(machine: &Machine, system: &System) -> QforgeResult<VmDefinition> {
    build_with(machine, system, &QforgeOptions::default())
}

/// Compile a machine. Errors carry the machine's name.
pub fn build_with(machine: &Machine, system: &System, options: &QforgeOptions) -> QforgeResult<VmDefinition> {
    let vm = compile(machine, system, options).map_err(|e| e.for_machine(machine.name.clone()))?;
    tracing::info!(
        machine = %machine.name,
        options = vm.options().len(),
        "Compiled machine"
    );
    Ok(vm)
}

fn compile(machine: &Machine, system: &System, options: &QforgeOptions) -> QforgeResult<VmDefinition> {
    let def = machine.resolve(system)?;
    let info = machine.info();
    // Built-in machine variables take precedence over configured ones.
    let vars = Vars::merge([&info.vars(), &def.vars]);

    let mut target = Target::new();
    apply_defaults(&mut target)?;
    apply_identity(&info, &mut target);
    apply_firmware(&info, &def, &system.storage, &mut target)?;
    attributes::apply(&info, &vars, &def.attributes, system, options.run_dir(), &mut target)?;
    apply_volumes(&info, &def.volumes, &system.storage, &mut target)?;
    apply_connections(&info, &def.connections, &system.network, &mut target)?;
    apply_devices(&def.devices, system, &mut target)?;
    Ok(target.vm)
}

fn apply_defaults(target: &mut Target) -> QforgeResult<()> {
    let clock = &mut target.vm.settings.clock;
    clock.base = Some(ClockBase::Utc);
    clock.isolation = Some(ClockIsolation::Host);
    clock.drift_fix = Some(DriftFix::Slew);

    target.vm.topology.add_panic()?;
    Ok(())
}

fn apply_identity(machine: &MachineInfo, target: &mut Target) {
    let identity = &mut target.vm.settings.identity;
    identity.name = machine.name.clone();
    identity.id = Some(machine.id);
}

/// Attach firmware volumes and point pflash0/pflash1 at them.
fn apply_firmware(
    machine: &MachineInfo,
    def: &Definition,
    pools: &BTreeMap<String, Storage>,
    target: &mut Target,
) -> QforgeResult<()> {
    let fw = &def.attributes.firmware;
    if fw.code.is_empty() {
        if !fw.vars.is_empty() {
            tracing::warn!(machine = %machine.name, vars = %fw.vars.name, "Ignoring firmware vars without firmware code");
        }
        return Ok(());
    }

    let mut volumes = vec![&fw.code];
    if !fw.vars.is_empty() {
        volumes.push(&fw.vars);
    }
    for volume in volumes {
        if volume.bootable {
            tracing::warn!(machine = %machine.name, volume = %volume.name, "Firmware volumes are never bootable");
        }
        let spec = VolumeSpec::resolve(machine, volume, pools)?;
        let handler = StorageHandler::lookup(&spec)?;
        let name = handler.node_name(&spec);
        let firmware = &mut target.vm.settings.firmware;
        if firmware.code.is_none() {
            firmware.code = Some(name);
        } else {
            firmware.vars = Some(name);
        }
        handler.apply(&spec, target)?;
    }

    target
        .vm
        .settings
        .globals
        .add(Global::new("cfi.pflash01", "secure", "on"));
    Ok(())
}

fn apply_volumes(
    machine: &MachineInfo,
    volumes: &[Volume],
    pools: &BTreeMap<String, Storage>,
    target: &mut Target,
) -> QforgeResult<()> {
    for volume in volumes {
        let spec = VolumeSpec::resolve(machine, volume, pools)?;
        StorageHandler::lookup(&spec)?.apply(&spec, target)?;
    }
    Ok(())
}

/// One tap and one virtio-net device per connection.
fn apply_connections(
    machine: &MachineInfo,
    connections: &[Connection],
    networks: &BTreeMap<String, Network>,
    target: &mut Target,
) -> QforgeResult<()> {
    for conn in connections {
        let network = networks
            .get(&conn.network)
            .ok_or_else(|| QforgeError::UnresolvedReference {
                kind: "network",
                referencer: format!("connection {}", conn.name),
                reference: conn.network.clone(),
            })?;
        let mac = conn
            .mac
            .ok_or_else(|| QforgeError::InvalidArgument(format!("connection {} has no MAC address", conn.name)))?;

        let link = link_name(&machine.name, conn);
        let tap = target
            .vm
            .resources
            .add_netdev_tap(link, network.up.as_str(), network.down.as_str())
            .id
            .clone();
        let topology = &mut target.vm.topology;
        let root = topology.add_root()?;
        topology.add_virtio_network(root, mac, tap.as_str())?;

        tracing::debug!(
            machine = %machine.name,
            connection = %conn.name,
            network = %conn.network,
            bridge = %network.device,
            netdev = %tap,
            "Applied connection"
        );
    }
    Ok(())
}

/// Each device needs a mediated device pool supplying its class and is
/// passed through with VFIO.
fn apply_devices(devices: &[Device], system: &System, target: &mut Target) -> QforgeResult<()> {
    for dev in devices {
        if system.mdev_with_class(&dev.class).is_empty() {
            return Err(QforgeError::UnresolvedReference {
                kind: "device class",
                referencer: format!("device {}", dev.name),
                reference: dev.class.clone(),
            });
        }
        let path = dev
            .sysfs_path()
            .ok_or_else(|| QforgeError::InvalidArgument(format!("device {} has no id", dev.name)))?;

        let topology = &mut target.vm.topology;
        let root = topology.add_root()?;
        topology.add_vfio(root, path)?;
        tracing::debug!(device = %dev.name, class = %dev.class, "Applied device");
    }
    Ok(())
}
