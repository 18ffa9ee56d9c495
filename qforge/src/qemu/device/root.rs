//! PCI Express root ports and the devices directly behind them.

use std::path::PathBuf;

use super::DiskOptions;
use super::bus::PciAddr;
use super::controller::Controller;
use crate::constants::qemu::{NUM_QUEUES, ROOT_BUS};
use crate::identity::MacAddr;
use crate::qemu::host::IoThread;
use crate::qemu::option::Parameters;

/// A root port on the root complex. It accepts exactly one downstream device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPort {
    pub id: String,
    pub addr: PciAddr,
    pub chassis: usize,
    pub downstream: Option<Downstream>,
}

impl RootPort {
    pub fn driver(&self) -> &'static str {
        "ioh3420"
    }

    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params
            .add("driver", self.driver())
            .add("id", &self.id)
            .add("chassis", self.chassis)
            .add("bus", ROOT_BUS)
            .add("addr", self.addr)
            .add_on("multifunction", self.addr.function == 0);
        params
    }

    pub fn is_occupied(&self) -> bool {
        self.downstream.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Downstream {
    Controller(Controller),
    Block(VirtioBlock),
    Network(VirtioNetwork),
    Vfio(Vfio),
}

impl Downstream {
    pub fn parameters(&self) -> Parameters {
        match self {
            Downstream::Controller(ctrl) => ctrl.parameters(),
            Downstream::Block(block) => block.parameters(),
            Downstream::Network(net) => net.parameters(),
            Downstream::Vfio(vfio) => vfio.parameters(),
        }
    }
}

/// virtio-blk disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtioBlock {
    pub id: String,
    pub bus: String,
    pub iothread: IoThread,
    pub drive: String,
    pub options: DiskOptions,
}

impl VirtioBlock {
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params
            .add("driver", "virtio-blk-pci")
            .add("id", &self.id)
            .add("bus", &self.bus)
            .add("iothread", &self.iothread)
            .add("num-queues", NUM_QUEUES)
            .add("drive", &self.drive)
            .add_opt("serial", self.options.serial.as_deref())
            .add_opt("bootindex", self.options.boot_index);
        params
    }
}

/// virtio-net NIC bound to a network backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtioNetwork {
    pub id: String,
    pub bus: String,
    pub mac: MacAddr,
    pub netdev: String,
}

impl VirtioNetwork {
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params
            .add("driver", "virtio-net-pci")
            .add("id", &self.id)
            .add("bus", &self.bus)
            .add("mac", self.mac)
            .add("netdev", &self.netdev);
        params
    }
}

/// VFIO passthrough of a host or mediated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vfio {
    pub id: String,
    pub bus: String,
    pub sysfsdev: PathBuf,
}

impl Vfio {
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params
            .add("driver", "vfio-pci")
            .add("id", &self.id)
            .add("bus", &self.bus)
            .add("sysfsdev", self.sysfsdev.display());
        params
    }
}
