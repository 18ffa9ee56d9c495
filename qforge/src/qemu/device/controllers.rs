use std::collections::HashMap;

use qforge_shared::errors::QforgeResult;

use super::controller::ControllerKind;
use super::topology::{ControllerRef, Topology};
use crate::qemu::host::IoThread;

/// Controllers created on first use, each behind its own root port.
///
/// There is one serial and one USB controller per machine, and one SCSI
/// controller per I/O thread.
#[derive(Debug, Clone, Default)]
pub struct ControllerMap {
    serial: Option<ControllerRef>,
    usb: Option<ControllerRef>,
    scsi: HashMap<IoThread, ControllerRef>,
}

impl ControllerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serial(&mut self, topology: &mut Topology) -> QforgeResult<ControllerRef> {
        if let Some(ctrl) = self.serial {
            return Ok(ctrl);
        }
        let root = topology.add_root()?;
        let ctrl = topology.add_controller(root, ControllerKind::Serial)?;
        self.serial = Some(ctrl);
        Ok(ctrl)
    }

    pub fn usb(&mut self, topology: &mut Topology) -> QforgeResult<ControllerRef> {
        if let Some(ctrl) = self.usb {
            return Ok(ctrl);
        }
        let root = topology.add_root()?;
        let ctrl = topology.add_controller(root, ControllerKind::Usb)?;
        self.usb = Some(ctrl);
        Ok(ctrl)
    }

    pub fn scsi(&mut self, topology: &mut Topology, iothread: &IoThread) -> QforgeResult<ControllerRef> {
        if let Some(ctrl) = self.scsi.get(iothread) {
            return Ok(*ctrl);
        }
        let root = topology.add_root()?;
        let ctrl = topology.add_controller(
            root,
            ControllerKind::Scsi {
                iothread: iothread.clone(),
            },
        )?;
        self.scsi.insert(iothread.clone(), ctrl);
        Ok(ctrl)
    }
}
