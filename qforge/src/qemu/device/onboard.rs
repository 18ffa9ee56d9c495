//! Devices attached directly to the root complex or onboard buses.

use super::boot::BootIndex;
use super::bus::PciAddr;
use crate::constants::qemu::ROOT_BUS;
use crate::qemu::option::Parameters;

fn root_complex(params: &mut Parameters, addr: PciAddr) {
    params
        .add("bus", ROOT_BUS)
        .add("addr", addr)
        .add_on("multifunction", addr.function == 0);
}

/// Paravirtualized panic notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvPanic {
    pub id: String,
    pub addr: PciAddr,
}

impl PvPanic {
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.add("driver", "pvpanic-pci").add("id", &self.id);
        root_complex(&mut params, self.addr);
        params
    }
}

/// QXL display adapter. Only the first head is VGA-compatible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qxl {
    pub id: String,
    pub addr: PciAddr,
    pub vga: bool,
}

impl Qxl {
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params
            .add("driver", if self.vga { "qxl-vga" } else { "qxl" })
            .add("id", &self.id);
        root_complex(&mut params, self.addr);
        params
    }
}

/// TIS interface in front of a TPM backend; sits on the ISA bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmTis {
    pub tpmdev: String,
}

impl TpmTis {
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.add("driver", "tpm-tis").add("tpmdev", &self.tpmdev);
        params
    }
}

/// CD-ROM on one of the onboard AHCI ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SataCd {
    pub id: String,
    pub bus: String,
    pub drive: String,
    pub boot_index: Option<BootIndex>,
}

impl SataCd {
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params
            .add("driver", "ide-cd")
            .add("id", &self.id)
            .add("bus", &self.bus)
            .add("drive", &self.drive)
            .add_opt("bootindex", self.boot_index);
        params
    }
}
