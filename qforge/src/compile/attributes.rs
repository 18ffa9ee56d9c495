//! CPU, memory, QMP, guest agent, SPICE and TPM attributes.

use std::path::Path;

use qforge_shared::errors::{QforgeError, QforgeResult};

use super::target::Target;
use crate::constants::limits::MAX_DISPLAYS;
use crate::constants::qemu::{
    GUEST_AGENT_CHARDEV, GUEST_AGENT_PORT, LOOPBACK, QXL_MEMORY, SPICE_AGENT_CHARDEV, SPICE_AGENT_PORT,
    TPM_CHARDEV, TPM_DEVICE, USB_REDIR_CHANNELS,
};
use crate::machine::attributes::{Attributes, QemuAgent, Qmp, Spice, Tpm};
use crate::machine::{MachineInfo, PortPattern, Vars};
use crate::qemu::Global;
use crate::qemu::guest::{self, Monitor};
use crate::qemu::host::CharDevice;
use crate::system::System;

pub(super) fn apply(
    machine: &MachineInfo,
    vars: &Vars,
    attrs: &Attributes,
    system: &System,
    run_dir: &Path,
    target: &mut Target,
) -> QforgeResult<()> {
    apply_cpu(machine, attrs, system, target)?;
    if attrs.memory.ram > 0 {
        target.vm.settings.memory.mebibytes = attrs.memory.ram;
    }
    apply_qmp(machine, &attrs.qmp, run_dir, target)?;
    apply_agent(&attrs.agent.qemu, vars, target)?;
    apply_spice(&attrs.spice, vars, target)?;
    apply_tpm(machine, &attrs.tpm, run_dir, target)?;
    Ok(())
}

/// Host processor details first, then the machine's own topology.
fn apply_cpu(machine: &MachineInfo, attrs: &Attributes, system: &System, target: &mut Target) -> QforgeResult<()> {
    let cpu = &mut target.vm.settings.processor;

    let name = if attrs.cpu.processor.is_empty() {
        system.default_processor().unwrap_or_default()
    } else {
        attrs.cpu.processor.as_str()
    };
    if !name.is_empty() {
        let processor = system
            .processor
            .get(name)
            .ok_or_else(|| QforgeError::UnresolvedReference {
                kind: "processor",
                referencer: format!("machine {}", machine.name),
                reference: name.to_string(),
            })?;
        cpu.brand = processor.brand.clone();
        cpu.threads = processor.threads;
    }

    if attrs.cpu.sockets > 0 {
        cpu.sockets = attrs.cpu.sockets;
    }
    if attrs.cpu.cores > 0 {
        cpu.cores = attrs.cpu.cores;
    }
    if attrs.cpu.threads > 0 {
        cpu.threads = attrs.cpu.threads;
    }
    cpu.hyperv = attrs.enlightenments.enabled;
    Ok(())
}

fn apply_qmp(machine: &MachineInfo, qmp: &Qmp, run_dir: &Path, target: &mut Target) -> QforgeResult<()> {
    if !qmp.enabled {
        return Ok(());
    }
    for (index, path) in qmp.all_socket_paths(run_dir, &machine.name).into_iter().enumerate() {
        let id = target
            .vm
            .resources
            .chardevs
            .add(CharDevice::unix_server(format!("qmp.{index}"), path))?;
        target.vm.settings.monitors.push(Monitor::new(id));
    }
    tracing::debug!(machine = %machine.name, sockets = target.vm.settings.monitors.len(), "Enabled QMP");
    Ok(())
}

/// An explicit port wins over a pattern.
fn effective_port(port: u16, pattern: &PortPattern, vars: &Vars) -> QforgeResult<Option<u16>> {
    if port > 0 {
        Ok(Some(port))
    } else if !pattern.is_empty() {
        pattern.expand(vars).map(Some)
    } else {
        Ok(None)
    }
}

fn apply_agent(agent: &QemuAgent, vars: &Vars, target: &mut Target) -> QforgeResult<()> {
    if !agent.enabled {
        return Ok(());
    }
    let port = effective_port(agent.port, &agent.port_pattern, vars)
        .map_err(|e| QforgeError::Config(format!("failed to determine QEMU guest agent port: {e}")))?
        .ok_or_else(|| QforgeError::Config("missing QEMU guest agent port".into()))?;

    let socket = target.vm.resources.chardevs.add(CharDevice::TcpSocket {
        id: GUEST_AGENT_CHARDEV.into(),
        host: LOOPBACK.into(),
        port,
    })?;
    target.serial()?.add_serial_port(socket, GUEST_AGENT_PORT)?;
    Ok(())
}

fn apply_spice(spice: &Spice, vars: &Vars, target: &mut Target) -> QforgeResult<()> {
    if !spice.enabled {
        return Ok(());
    }
    let port = effective_port(spice.port, &spice.port_pattern, vars)
        .map_err(|e| QforgeError::Config(format!("failed to determine SPICE port: {e}")))?;

    let settings = &mut target.vm.settings;
    settings.spice = guest::Spice {
        enabled: true,
        port: port.unwrap_or_default(),
        addr: LOOPBACK.into(),
        disable_ticketing: true,
        ..Default::default()
    };
    settings.globals.add(Global::new("qxl-vga", "ram_size", QXL_MEMORY));
    settings.globals.add(Global::new("qxl-vga", "vram_size", QXL_MEMORY));

    for _ in 0..spice.displays.clamp(1, MAX_DISPLAYS) {
        target.vm.topology.add_qxl()?;
    }

    let vdagent = target.vm.resources.chardevs.add(CharDevice::SpiceChannel {
        id: SPICE_AGENT_CHARDEV.into(),
        channel: "vdagent".into(),
    })?;
    target.serial()?.add_serial_port(vdagent, SPICE_AGENT_PORT)?;

    target.usb()?.add_usb_tablet()?;
    for index in 0..USB_REDIR_CHANNELS {
        let channel = target.vm.resources.chardevs.add(CharDevice::SpiceChannel {
            id: format!("usbredir.{index}"),
            channel: "usbredir".into(),
        })?;
        target.usb()?.add_usb_redir(channel)?;
    }
    Ok(())
}

fn apply_tpm(machine: &MachineInfo, tpm: &Tpm, run_dir: &Path, target: &mut Target) -> QforgeResult<()> {
    if !tpm.enabled {
        return Ok(());
    }
    let resources = &mut target.vm.resources;
    resources.chardevs.add(CharDevice::UnixSocket {
        id: TPM_CHARDEV.into(),
        path: Tpm::socket_path(run_dir, &machine.name),
        server: false,
        wait: true,
    })?;
    let tpmdev = resources.add_emulated_tpm(TPM_DEVICE, TPM_CHARDEV)?;
    target.vm.topology.add_tpm(tpmdev);
    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::system::Processor;

    fn create_test_machine() -> MachineInfo {
        MachineInfo {
            id: Uuid::from_u128(7),
            name: "alpha".into(),
            description: String::new(),
        }
    }

    fn rendered(target: &Target) -> Vec<String> {
        target.vm.options().iter().map(ToString::to_string).collect()
    }

    fn run(attrs: &Attributes, system: &System, vars: &Vars) -> QforgeResult<Target> {
        let mut target = Target::new();
        apply(&create_test_machine(), vars, attrs, system, Path::new("/run/qforge"), &mut target)?;
        Ok(target)
    }

    #[test]
    fn test_default_processor_and_overrides() {
        let mut system = System::default();
        system.processor.insert(
            "epyc".into(),
            Processor {
                brand: "AMD".into(),
                threads: 2,
                default: true,
                ..Default::default()
            },
        );
        let mut attrs = Attributes::default();
        attrs.cpu.sockets = 1;
        attrs.cpu.cores = 8;

        let target = run(&attrs, &system, &Vars::new()).unwrap();
        let out = rendered(&target);
        assert!(out.contains(&"-cpu host,topoext=on".to_string()));
        assert!(out.contains(&"-smp sockets=1,cores=8,threads=2".to_string()));
    }

    #[test]
    fn test_unknown_processor() {
        let mut attrs = Attributes::default();
        attrs.cpu.processor = "xeon".into();
        let err = run(&attrs, &System::default(), &Vars::new()).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "machine alpha uses an unspecified processor: xeon");
    }

    #[test]
    fn test_qmp_sockets() {
        let mut attrs = Attributes::default();
        attrs.qmp.enabled = true;
        attrs.qmp.sockets.names = vec!["monitor".into()];
        let target = run(&attrs, &System::default(), &Vars::new()).unwrap();
        let out = rendered(&target);

        assert!(out.contains(
            &"-chardev socket,id=qmp.0,server=on,wait=off,path=/run/qforge/alpha.qmp.systemd.0.sock".to_string()
        ));
        assert!(out.contains(
            &"-chardev socket,id=qmp.3,server=on,wait=off,path=/run/qforge/alpha.qmp.monitor.sock".to_string()
        ));
        let monitors: Vec<_> = out.iter().filter(|o| o.starts_with("-mon ")).collect();
        assert_eq!(monitors.len(), 4);
        assert_eq!(monitors[1], "-mon chardev=qmp.1,mode=control");
    }

    #[test]
    fn test_agent_port_pattern() {
        let mut attrs = Attributes::default();
        attrs.agent.qemu.enabled = true;
        attrs.agent.qemu.port_pattern = PortPattern("${base}1".into());
        let mut vars = Vars::new();
        vars.insert("base", "4400");

        let target = run(&attrs, &System::default(), &vars).unwrap();
        let out = rendered(&target);
        assert!(out.contains(
            &"-chardev socket,id=guestagent,host=127.0.0.1,port=44001,server=on,wait=off,nodelay=on".to_string()
        ));
        assert!(out.iter().any(|o| o.contains("driver=virtserialport")
            && o.contains("chardev=guestagent,name=org.qemu.guest_agent.0")));
    }

    #[test]
    fn test_agent_requires_port() {
        let mut attrs = Attributes::default();
        attrs.agent.qemu.enabled = true;
        let err = run(&attrs, &System::default(), &Vars::new()).unwrap_err();
        assert!(err.to_string().contains("missing QEMU guest agent port"));
    }

    #[test]
    fn test_spice_devices() {
        let mut attrs = Attributes::default();
        attrs.spice.enabled = true;
        attrs.spice.port = 5901;
        attrs.spice.displays = 9;
        let target = run(&attrs, &System::default(), &Vars::new()).unwrap();
        let out = rendered(&target);

        assert!(out.contains(&"-spice port=5901,addr=127.0.0.1,disable-ticketing=on".to_string()));
        assert!(out.contains(&"-global driver=qxl-vga,property=vram_size,value=67108864".to_string()));
        assert_eq!(out.iter().filter(|o| o.starts_with("-device driver=qxl")).count(), 4);
        assert!(out.iter().any(|o| o.contains("name=com.redhat.spice.0")));
        assert!(out.iter().any(|o| o.starts_with("-device driver=usb-tablet")));
        assert_eq!(out.iter().filter(|o| o.starts_with("-device driver=usb-redir")).count(), 2);
        assert!(out.contains(&"-chardev spicevmc,id=usbredir.1,debug=0,name=usbredir".to_string()));
    }

    #[test]
    fn test_tpm() {
        let mut attrs = Attributes::default();
        attrs.tpm.enabled = true;
        let target = run(&attrs, &System::default(), &Vars::new()).unwrap();
        let out = rendered(&target);
        assert!(out.contains(&"-chardev socket,id=tpm.0.socket,path=/run/qforge/alpha.swtpm.sock".to_string()));
        assert!(out.contains(&"-tpmdev emulator,id=tpm.0,chardev=tpm.0.socket".to_string()));
        assert!(out.contains(&"-device driver=tpm-tis,tpmdev=tpm.0".to_string()));
        assert_eq!(target.vm.topology.functions(), 0);
    }
}
