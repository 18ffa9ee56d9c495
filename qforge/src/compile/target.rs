use std::collections::BTreeMap;
use std::path::PathBuf;

use qforge_shared::errors::{QforgeError, QforgeResult};

use crate::machine::{MachineInfo, Volume};
use crate::qemu::VmDefinition;
use crate::qemu::device::{BootIndex, BootOrder, Controller, ControllerMap};
use crate::qemu::host::IoThread;
use crate::system::Storage;

/// State shared by every build step of one machine.
#[derive(Debug, Default)]
pub struct Target {
    pub vm: VmDefinition,
    pub controllers: ControllerMap,
    pub boot_order: BootOrder,
}

impl Target {
    pub fn new() -> Self {
        Self::default()
    }

    /// The machine's virtio-serial controller, created on first use.
    pub fn serial(&mut self) -> QforgeResult<&mut Controller> {
        let ctrl = self.controllers.serial(&mut self.vm.topology)?;
        self.vm.topology.controller_mut(ctrl)
    }

    pub fn usb(&mut self) -> QforgeResult<&mut Controller> {
        let ctrl = self.controllers.usb(&mut self.vm.topology)?;
        self.vm.topology.controller_mut(ctrl)
    }

    /// The SCSI controller serviced by `iothread`, created on first use.
    pub fn scsi(&mut self, iothread: &IoThread) -> QforgeResult<&mut Controller> {
        let ctrl = self.controllers.scsi(&mut self.vm.topology, iothread)?;
        self.vm.topology.controller_mut(ctrl)
    }

    /// Disks share the most recent I/O thread so a machine ends up with one
    /// rather than one per disk.
    pub fn iothread(&mut self) -> IoThread {
        self.vm.resources.shared_iothread()
    }

    /// Next boot index for bootable volumes, `None` otherwise.
    pub fn boot_index(&mut self, bootable: bool) -> Option<BootIndex> {
        bootable.then(|| self.boot_order.next_index())
    }
}

/// A volume together with the pool that stores it.
#[derive(Debug, Clone, Copy)]
pub struct VolumeSpec<'a> {
    pub machine: &'a MachineInfo,
    pub volume: &'a Volume,
    pub storage: &'a Storage,
}

impl<'a> VolumeSpec<'a> {
    pub fn resolve(
        machine: &'a MachineInfo,
        volume: &'a Volume,
        pools: &'a BTreeMap<String, Storage>,
    ) -> QforgeResult<Self> {
        let storage = pools
            .get(&volume.storage)
            .ok_or_else(|| QforgeError::UnresolvedReference {
                kind: "storage pool",
                referencer: format!("volume {}", volume.name),
                reference: volume.storage.clone(),
            })?;
        Ok(Self {
            machine,
            volume,
            storage,
        })
    }

    /// Host path of the volume's image or directory.
    pub fn path(&self) -> PathBuf {
        self.storage.volume_path(self.machine, &self.volume.name)
    }

    /// `{machine}-{volume}`, unique across machines sharing a pool.
    pub fn scoped_name(&self) -> String {
        format!("{}-{}", self.machine.name, self.volume.name)
    }
}
