//! Storage handler dispatch.
//!
//! Each pool type maps to exactly one attachment strategy. The set is
//! closed: adding a storage type means adding a variant here.

use qforge_shared::errors::{QforgeError, QforgeResult};

use super::target::{Target, VolumeSpec};
use crate::qemu::device::DiskOptions;
use crate::qemu::host::blockdev::{DetectZeroes, DirNode, FileNode, NodeName, NodeOptions, RawNode, child_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageHandler {
    /// Raw image on a virtio-scsi disk.
    RawScsi,
    /// Raw image on a virtio-blk disk behind its own root port.
    RawBlock,
    /// Host directory presented as a read-only FAT disk over virtio-blk.
    VvfatBlock,
    /// ISO image on an onboard AHCI CD-ROM.
    IsoAhci,
    IsoScsi,
    IsoUsb,
    /// UEFI code or variable store; wired to the machine's pflash elsewhere.
    Firmware,
    /// Software TPM state. The TPM emulator owns it, so nothing is attached.
    TpmData,
}

impl StorageHandler {
    /// Handler for a pool type. `raw` is an alias for `raw-scsi`.
    pub fn for_type(kind: &str) -> Option<Self> {
        let handler = match kind {
            "raw" | "raw-scsi" => StorageHandler::RawScsi,
            "raw-block" => StorageHandler::RawBlock,
            "vvfat-block" => StorageHandler::VvfatBlock,
            "iso-ahci" => StorageHandler::IsoAhci,
            "iso-scsi" => StorageHandler::IsoScsi,
            "iso-usb" => StorageHandler::IsoUsb,
            "firmware" => StorageHandler::Firmware,
            "tpm-data" => StorageHandler::TpmData,
            _ => return None,
        };
        Some(handler)
    }

    pub fn lookup(spec: &VolumeSpec<'_>) -> QforgeResult<Self> {
        Self::for_type(&spec.storage.kind).ok_or_else(|| QforgeError::UnsupportedType {
            pool: spec.volume.storage.clone(),
            kind: spec.storage.kind.clone(),
        })
    }

    /// Name of the block node a device will reference for this volume.
    ///
    /// Writable images are scoped by machine. ISOs and read-only firmware
    /// keep the bare volume name since they may be shared.
    pub fn node_name(&self, spec: &VolumeSpec<'_>) -> NodeName {
        match self {
            StorageHandler::RawScsi | StorageHandler::RawBlock | StorageHandler::VvfatBlock => {
                spec.scoped_name()
            }
            StorageHandler::IsoAhci | StorageHandler::IsoScsi | StorageHandler::IsoUsb => {
                spec.volume.name.clone()
            }
            StorageHandler::Firmware | StorageHandler::TpmData => {
                if spec.storage.read_only {
                    spec.volume.name.clone()
                } else {
                    spec.scoped_name()
                }
            }
        }
    }

    pub fn apply(&self, spec: &VolumeSpec<'_>, target: &mut Target) -> QforgeResult<()> {
        let name = self.node_name(spec);
        match self {
            StorageHandler::RawScsi | StorageHandler::RawBlock => {
                let drive = add_raw_image(spec, &name, target)?;
                let iothread = target.iothread();
                let boot_index = target.boot_index(spec.volume.bootable);
                let serial = (!spec.volume.serial.is_empty()).then(|| spec.volume.serial.clone());
                if *self == StorageHandler::RawScsi {
                    let options = DiskOptions {
                        wwn: spec.volume.wwn,
                        serial,
                        boot_index,
                    };
                    target.scsi(&iothread)?.add_scsi_disk(drive, options)?;
                } else {
                    // virtio-blk has no WWN property.
                    let options = DiskOptions {
                        wwn: None,
                        serial,
                        boot_index,
                    };
                    let topology = &mut target.vm.topology;
                    let root = topology.add_root()?;
                    topology.add_virtio_block(root, &iothread, drive, options)?;
                }
            }
            StorageHandler::VvfatBlock => {
                // vvfat write support corrupts data, so the node is always read-only.
                let drive = target.vm.resources.blockdevs.add(DirNode::new(name, spec.path()))?;
                let iothread = target.iothread();
                let options = DiskOptions {
                    wwn: None,
                    serial: (!spec.volume.serial.is_empty()).then(|| spec.volume.serial.clone()),
                    boot_index: target.boot_index(spec.volume.bootable),
                };
                let topology = &mut target.vm.topology;
                let root = topology.add_root()?;
                topology.add_virtio_block(root, &iothread, drive, options)?;
            }
            StorageHandler::IsoAhci => {
                let drive = add_read_only_file(spec, name, target)?;
                let boot_index = target.boot_index(spec.volume.bootable);
                target.vm.topology.add_sata_cd(drive, boot_index)?;
            }
            StorageHandler::IsoScsi => {
                let drive = add_read_only_file(spec, name, target)?;
                let iothread = target.iothread();
                let options = DiskOptions {
                    boot_index: target.boot_index(spec.volume.bootable),
                    ..Default::default()
                };
                target.scsi(&iothread)?.add_scsi_cd(drive, options)?;
            }
            StorageHandler::IsoUsb => {
                let drive = add_read_only_file(spec, name, target)?;
                let boot_index = target.boot_index(spec.volume.bootable);
                target.usb()?.add_usb_storage(drive, boot_index)?;
            }
            StorageHandler::Firmware => {
                let options = NodeOptions {
                    read_only: spec.storage.read_only,
                    ..Default::default()
                };
                target
                    .vm
                    .resources
                    .blockdevs
                    .add(FileNode::new(name, spec.path()).with_options(options))?;
            }
            StorageHandler::TpmData => {}
        }

        tracing::debug!(
            machine = %spec.machine.name,
            volume = %spec.volume.name,
            handler = ?self,
            "Applied volume"
        );
        Ok(())
    }
}

/// `file` protocol node feeding a `raw` format node; returns the format
/// node's name.
fn add_raw_image(spec: &VolumeSpec<'_>, name: &str, target: &mut Target) -> QforgeResult<NodeName> {
    let graph = &mut target.vm.resources.blockdevs;
    let file = FileNode::new(child_name(name, "file"), spec.path()).with_options(NodeOptions {
        read_only: spec.storage.read_only,
        discard: true,
        ..Default::default()
    });
    let file = graph.add(file)?;
    let raw = RawNode::new(name, file).with_options(NodeOptions {
        discard: true,
        detect_zeroes: DetectZeroes::Unmap,
        ..Default::default()
    });
    graph.add(raw)
}

fn add_read_only_file(spec: &VolumeSpec<'_>, name: NodeName, target: &mut Target) -> QforgeResult<NodeName> {
    let node = FileNode::new(name, spec.path()).with_options(NodeOptions::read_only());
    target.vm.resources.blockdevs.add(node)
}
