//! TPM backends (`-tpmdev`).

use std::path::PathBuf;

use qforge_shared::errors::QforgeResult;

use super::registry::{Named, Registry};
use crate::qemu::option::{Options, Parameters};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TpmDevice {
    /// Host TPM handed to the guest.
    Passthrough {
        id: String,
        path: Option<PathBuf>,
        cancel_path: Option<PathBuf>,
    },
    /// Software TPM reached through a character device.
    Emulated { id: String, chardev: String },
}

impl TpmDevice {
    pub fn backend(&self) -> &'static str {
        match self {
            TpmDevice::Passthrough { .. } => "passthrough",
            TpmDevice::Emulated { .. } => "emulator",
        }
    }

    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.add("", self.backend()).add("id", self.name());
        match self {
            TpmDevice::Passthrough {
                path, cancel_path, ..
            } => {
                params
                    .add_opt("path", path.as_ref().map(|p| p.display()))
                    .add_opt("cancel-path", cancel_path.as_ref().map(|p| p.display()));
            }
            TpmDevice::Emulated { chardev, .. } => {
                params.add("chardev", chardev);
            }
        }
        params
    }
}

impl Named for TpmDevice {
    fn name(&self) -> &str {
        match self {
            TpmDevice::Passthrough { id, .. } | TpmDevice::Emulated { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TpmDevices(Registry<TpmDevice>);

impl Default for TpmDevices {
    fn default() -> Self {
        Self(Registry::new("TPM device registry"))
    }
}

impl TpmDevices {
    pub fn add(&mut self, dev: TpmDevice) -> QforgeResult<String> {
        let id = dev.name().to_string();
        self.0.add(dev)?;
        Ok(id)
    }

    pub fn find(&self, id: &str) -> Option<&TpmDevice> {
        self.0.find(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn options(&self) -> Options {
        let mut opts = Options::new();
        for dev in self.0.iter() {
            opts.add("tpmdev", dev.parameters());
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters() {
        let pt = TpmDevice::Passthrough {
            id: "tpm.host".into(),
            path: Some("/dev/tpm0".into()),
            cancel_path: None,
        };
        assert_eq!(pt.parameters().to_string(), "passthrough,id=tpm.host,path=/dev/tpm0");

        let emu = TpmDevice::Emulated {
            id: "tpm.0".into(),
            chardev: "tpm.0.socket".into(),
        };
        assert_eq!(emu.parameters().to_string(), "emulator,id=tpm.0,chardev=tpm.0.socket");
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut devs = TpmDevices::default();
        let emu = TpmDevice::Emulated {
            id: "tpm.0".into(),
            chardev: "c".into(),
        };
        devs.add(emu.clone()).unwrap();
        assert!(devs.add(emu).unwrap_err().is_duplicate_name());
    }
}
