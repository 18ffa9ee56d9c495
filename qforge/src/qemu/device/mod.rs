//! Guest device topology.
//!
//! ## Architecture
//!
//! ```text
//! pcie.0 (root complex)
//!  ├─ pvpanic-pci            addr 1.0
//!  ├─ ioh3420 pcie.1.1       addr 1.1
//!  │   └─ virtio-scsi-pci scsi.0
//!  │       ├─ scsi-hd        lun 0
//!  │       └─ scsi-cd        lun 1
//!  ├─ ioh3420 pcie.1.2
//!  │   └─ virtio-net-pci
//!  └─ ...
//! ide.0 .. ide.5 (onboard AHCI)
//!  └─ ide-cd
//! ```
//!
//! Addresses are purely positional: the Nth device on the root complex and
//! the Kth endpoint on a controller always land in the same place, so an
//! unchanged machine compiles to identical options.

mod boot;
mod bus;
mod controller;
mod controllers;
mod onboard;
mod root;
mod topology;

pub use boot::{BootIndex, BootOrder};
pub use bus::{BusMap, PciAddr};
pub use controller::{Controller, ControllerKind, Endpoint};
pub use controllers::ControllerMap;
pub use onboard::{PvPanic, Qxl, SataCd, TpmTis};
pub use root::{Downstream, RootPort, VirtioBlock, VirtioNetwork, Vfio};
pub use topology::{ControllerRef, RootPortRef, TopLevel, Topology};

use crate::identity::Wwn;

/// Optional identity and boot settings of a disk endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskOptions {
    pub wwn: Option<Wwn>,
    pub serial: Option<String>,
    pub boot_index: Option<BootIndex>,
}
