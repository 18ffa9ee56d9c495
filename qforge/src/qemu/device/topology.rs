//! Root complex allocation.

use std::path::PathBuf;

use qforge_shared::errors::{QforgeError, QforgeResult};

use super::DiskOptions;
use super::boot::BootIndex;
use super::bus::{BusMap, PciAddr};
use super::controller::{Controller, ControllerKind};
use super::onboard::{PvPanic, Qxl, SataCd, TpmTis};
use super::root::{Downstream, RootPort, VirtioBlock, VirtioNetwork, Vfio};
use crate::constants::limits::{FUNCTIONS_PER_SLOT, MAX_ROOTS, MAX_SATA_DEVICES};
use crate::identity::MacAddr;
use crate::qemu::host::IoThread;
use crate::qemu::option::{Options, Parameters};

/// Handle to a root port in a [`Topology`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootPortRef(usize);

/// Handle to a controller, identified by the root port it sits behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerRef(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopLevel {
    RootPort(RootPort),
    Panic(PvPanic),
    Qxl(Qxl),
    Tpm(TpmTis),
    SataCd(SataCd),
}

impl TopLevel {
    pub fn parameters(&self) -> Parameters {
        match self {
            TopLevel::RootPort(root) => root.parameters(),
            TopLevel::Panic(panic) => panic.parameters(),
            TopLevel::Qxl(qxl) => qxl.parameters(),
            TopLevel::Tpm(tpm) => tpm.parameters(),
            TopLevel::SataCd(cd) => cd.parameters(),
        }
    }
}

/// The device tree of one machine.
///
/// Root ports, panic and display devices share the root complex's 256
/// functions, packed 8 per slot from slot 1. TPM and SATA devices live on
/// onboard buses and take no function.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    devices: Vec<TopLevel>,
    buses: BusMap,
    functions: usize,
    sata: usize,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn devices(&self) -> &[TopLevel] {
        &self.devices
    }

    /// Number of root complex functions in use.
    pub fn functions(&self) -> usize {
        self.functions
    }

    fn allocate_function(&mut self) -> QforgeResult<PciAddr> {
        if self.functions >= MAX_ROOTS {
            return Err(QforgeError::Capacity {
                resource: "PCI Express root complex".to_string(),
                limit: MAX_ROOTS,
                count: self.functions,
            });
        }
        let index = self.functions;
        self.functions += 1;
        Ok(PciAddr {
            slot: index / FUNCTIONS_PER_SLOT + 1,
            function: index % FUNCTIONS_PER_SLOT,
        })
    }

    pub fn add_root(&mut self) -> QforgeResult<RootPortRef> {
        let addr = self.allocate_function()?;
        let root = RootPort {
            id: format!("pcie.{addr}"),
            addr,
            chassis: self.functions,
            downstream: None,
        };
        tracing::trace!(root = %root.id, "Added root port");
        self.devices.push(TopLevel::RootPort(root));
        Ok(RootPortRef(self.devices.len() - 1))
    }

    pub fn add_panic(&mut self) -> QforgeResult<String> {
        let addr = self.allocate_function()?;
        let id = self.buses.allocate("panic");
        self.devices.push(TopLevel::Panic(PvPanic {
            id: id.clone(),
            addr,
        }));
        Ok(id)
    }

    /// Add a display head; the first one is VGA-compatible.
    pub fn add_qxl(&mut self) -> QforgeResult<String> {
        let addr = self.allocate_function()?;
        let vga = self.buses.count("qxl") == 0;
        let id = self.buses.allocate("qxl");
        self.devices.push(TopLevel::Qxl(Qxl {
            id: id.clone(),
            addr,
            vga,
        }));
        Ok(id)
    }

    pub fn add_tpm(&mut self, tpmdev: impl Into<String>) {
        self.devices.push(TopLevel::Tpm(TpmTis {
            tpmdev: tpmdev.into(),
        }));
    }

    /// Add a CD-ROM to the next free AHCI port (`ide.0` .. `ide.5`).
    pub fn add_sata_cd(
        &mut self,
        drive: impl Into<String>,
        boot_index: Option<BootIndex>,
    ) -> QforgeResult<String> {
        if self.sata >= MAX_SATA_DEVICES {
            return Err(QforgeError::Capacity {
                resource: "SATA controller".to_string(),
                limit: MAX_SATA_DEVICES,
                count: self.sata,
            });
        }
        let bus = format!("ide.{}", self.sata);
        self.sata += 1;
        let id = self.buses.allocate("sata");
        self.devices.push(TopLevel::SataCd(SataCd {
            id: id.clone(),
            bus,
            drive: drive.into(),
            boot_index,
        }));
        Ok(id)
    }

    pub fn root(&self, root: RootPortRef) -> QforgeResult<&RootPort> {
        match self.devices.get(root.0) {
            Some(TopLevel::RootPort(port)) => Ok(port),
            _ => Err(unknown_handle("root port", root.0)),
        }
    }

    /// Connect a device to a root port's single downstream slot.
    ///
    /// Occupancy is checked before `make` runs, so a rejected attachment
    /// allocates no ids.
    fn attach<T>(
        &mut self,
        root: RootPortRef,
        make: impl FnOnce(&mut BusMap, &str) -> (Downstream, T),
    ) -> QforgeResult<T> {
        let port = match self.devices.get_mut(root.0) {
            Some(TopLevel::RootPort(port)) => port,
            _ => return Err(unknown_handle("root port", root.0)),
        };
        if port.is_occupied() {
            return Err(QforgeError::Occupied {
                port: port.id.clone(),
            });
        }
        let (device, out) = make(&mut self.buses, &port.id);
        port.downstream = Some(device);
        Ok(out)
    }

    pub fn add_controller(&mut self, root: RootPortRef, kind: ControllerKind) -> QforgeResult<ControllerRef> {
        self.attach(root, |buses, parent| {
            let id = buses.allocate(kind.prefix());
            tracing::trace!(controller = %id, bus = %parent, "Added controller");
            let ctrl = Controller::new(kind, id, parent.to_string());
            (Downstream::Controller(ctrl), ControllerRef(root.0))
        })
    }

    pub fn add_virtio_block(
        &mut self,
        root: RootPortRef,
        iothread: &IoThread,
        drive: impl Into<String>,
        options: DiskOptions,
    ) -> QforgeResult<String> {
        self.attach(root, |buses, parent| {
            let id = buses.allocate("block");
            let block = VirtioBlock {
                id: id.clone(),
                bus: parent.to_string(),
                iothread: iothread.clone(),
                drive: drive.into(),
                options,
            };
            (Downstream::Block(block), id)
        })
    }

    pub fn add_virtio_network(
        &mut self,
        root: RootPortRef,
        mac: MacAddr,
        netdev: impl Into<String>,
    ) -> QforgeResult<String> {
        self.attach(root, |buses, parent| {
            let id = buses.allocate("nic");
            let nic = VirtioNetwork {
                id: id.clone(),
                bus: parent.to_string(),
                mac,
                netdev: netdev.into(),
            };
            (Downstream::Network(nic), id)
        })
    }

    pub fn add_vfio(&mut self, root: RootPortRef, sysfsdev: impl Into<PathBuf>) -> QforgeResult<String> {
        self.attach(root, |buses, parent| {
            let id = buses.allocate("vfio");
            let vfio = Vfio {
                id: id.clone(),
                bus: parent.to_string(),
                sysfsdev: sysfsdev.into(),
            };
            (Downstream::Vfio(vfio), id)
        })
    }

    pub fn controller(&self, ctrl: ControllerRef) -> QforgeResult<&Controller> {
        match self.devices.get(ctrl.0) {
            Some(TopLevel::RootPort(RootPort {
                downstream: Some(Downstream::Controller(c)),
                ..
            })) => Ok(c),
            _ => Err(unknown_handle("controller", ctrl.0)),
        }
    }

    pub fn controller_mut(&mut self, ctrl: ControllerRef) -> QforgeResult<&mut Controller> {
        match self.devices.get_mut(ctrl.0) {
            Some(TopLevel::RootPort(RootPort {
                downstream: Some(Downstream::Controller(c)),
                ..
            })) => Ok(c),
            _ => Err(unknown_handle("controller", ctrl.0)),
        }
    }

    /// `-device` options, depth first.
    pub fn options(&self) -> Options {
        let mut opts = Options::new();
        for device in &self.devices {
            opts.add("device", device.parameters());
            let TopLevel::RootPort(RootPort {
                downstream: Some(downstream),
                ..
            }) = device
            else {
                continue;
            };
            opts.add("device", downstream.parameters());
            if let Downstream::Controller(ctrl) = downstream {
                for params in ctrl.endpoint_parameters() {
                    opts.add("device", params);
                }
            }
        }
        opts
    }
}

fn unknown_handle(what: &str, index: usize) -> QforgeError {
    QforgeError::InvalidArgument(format!("no {what} at topology position {index}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qemu::host::Resources;

    fn rendered(topo: &Topology) -> Vec<String> {
        topo.options().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_root_packing() {
        let mut topo = Topology::new();
        let mut ids = Vec::new();
        for _ in 0..10 {
            let root = topo.add_root().unwrap();
            ids.push(topo.root(root).unwrap().id.clone());
        }
        assert_eq!(ids[0], "pcie.1.0");
        assert_eq!(ids[7], "pcie.1.7");
        assert_eq!(ids[8], "pcie.2.0");

        let first = rendered(&topo)[0].clone();
        assert_eq!(
            first,
            "-device driver=ioh3420,id=pcie.1.0,chassis=1,bus=pcie.0,addr=1.0,multifunction=on"
        );
        assert!(!rendered(&topo)[1].contains("multifunction"));
    }

    #[test]
    fn test_root_complex_capacity() {
        let mut topo = Topology::new();
        for _ in 0..256 {
            topo.add_root().unwrap();
        }
        let err = topo.add_root().unwrap_err();
        assert!(err.is_capacity());
        assert!(err.to_string().contains("limit of 256"));
        assert_eq!(topo.devices().len(), 256);
    }

    #[test]
    fn test_single_downstream() {
        let mut topo = Topology::new();
        let root = topo.add_root().unwrap();
        topo.add_controller(root, ControllerKind::Usb).unwrap();
        let err = topo.add_controller(root, ControllerKind::Serial).unwrap_err();
        assert!(err.is_occupied());
        assert!(err.to_string().contains("pcie.1.0"));

        let second = topo.add_root().unwrap();
        let ctrl = topo.add_controller(second, ControllerKind::Serial).unwrap();
        assert_eq!(topo.controller(ctrl).unwrap().id, "serial.0");
    }

    #[test]
    fn test_depth_first_emission() {
        let mut topo = Topology::new();
        let thread = Resources::new().add_iothread();
        topo.add_panic().unwrap();
        let root = topo.add_root().unwrap();
        let scsi = topo
            .add_controller(root, ControllerKind::Scsi { iothread: thread })
            .unwrap();
        topo.controller_mut(scsi)
            .unwrap()
            .add_scsi_disk("alpha-os", DiskOptions::default())
            .unwrap();
        let nic_root = topo.add_root().unwrap();
        topo.add_virtio_network(nic_root, "52:54:00:00:00:01".parse().unwrap(), "net.0")
            .unwrap();

        assert_eq!(
            rendered(&topo),
            vec![
                "-device driver=pvpanic-pci,id=panic.0,bus=pcie.0,addr=1.0,multifunction=on",
                "-device driver=ioh3420,id=pcie.1.1,chassis=2,bus=pcie.0,addr=1.1",
                "-device driver=virtio-scsi-pci,id=scsi.0,bus=pcie.1.1,iothread=iothread.0,num_queues=4",
                "-device driver=scsi-hd,id=scsi.0.0.0,bus=scsi.0.0,channel=0,scsi-id=0,lun=0,drive=alpha-os",
                "-device driver=ioh3420,id=pcie.1.2,chassis=3,bus=pcie.0,addr=1.2",
                "-device driver=virtio-net-pci,id=nic.0,bus=pcie.1.2,mac=52:54:00:00:00:01,netdev=net.0",
            ]
        );
    }

    #[test]
    fn test_sata_limit_is_global() {
        let mut topo = Topology::new();
        for i in 0..6 {
            let id = topo.add_sata_cd(format!("cd{i}"), None).unwrap();
            assert_eq!(id, format!("sata.{i}"));
        }
        assert!(topo.add_sata_cd("cd6", None).unwrap_err().is_capacity());
        assert_eq!(topo.functions(), 0);
        assert_eq!(
            rendered(&topo)[5],
            "-device driver=ide-cd,id=sata.5,bus=ide.5,drive=cd5"
        );
    }

    #[test]
    fn test_qxl_first_is_vga() {
        let mut topo = Topology::new();
        topo.add_qxl().unwrap();
        topo.add_qxl().unwrap();
        topo.add_tpm("tpm.0");
        let out = rendered(&topo);
        assert!(out[0].contains("driver=qxl-vga,id=qxl.0"));
        assert!(out[1].contains("driver=qxl,id=qxl.1"));
        assert_eq!(out[2], "-device driver=tpm-tis,tpmdev=tpm.0");
    }

    #[test]
    fn test_vfio() {
        let mut topo = Topology::new();
        let root = topo.add_root().unwrap();
        topo.add_vfio(root, "/sys/bus/mdev/devices/abc").unwrap();
        assert_eq!(
            rendered(&topo)[1],
            "-device driver=vfio-pci,id=vfio.0,bus=pcie.1.0,sysfsdev=/sys/bus/mdev/devices/abc"
        );
    }
}
