//! Volumes: named disks backed by a storage pool.

use serde::{Deserialize, Serialize};

use crate::constants::domain;
use crate::identity::{IdentitySeed, Wwn, empty_as_none};

pub type VolumeName = String;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    #[serde(default)]
    pub name: VolumeName,
    /// Name of the storage pool holding the volume.
    #[serde(default)]
    pub storage: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub wwn: Option<Wwn>,
    #[serde(default, rename = "serial", skip_serializing_if = "String::is_empty")]
    pub serial: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bootable: bool,
}

impl Volume {
    pub fn new(name: impl Into<String>, storage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage: storage.into(),
            ..Default::default()
        }
    }

    /// No name and no storage: the volume slot is unset.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.storage.is_empty()
    }

    /// Fill an absent WWN or serial number from the seed.
    pub fn populate(&mut self, seed: &IdentitySeed) {
        if self.name.is_empty() {
            return;
        }
        if self.wwn.is_none() {
            self.wwn = Some(seed.wwn(domain::VOLUME_WWN, &self.name));
        }
        if self.serial.is_empty() {
            self.serial = seed.serial_number(domain::VOLUME_SERIAL, &self.name);
        }
    }
}

impl std::fmt::Display for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.storage)?;
        if let Some(wwn) = &self.wwn {
            write!(f, " (wwn: {wwn})")?;
        }
        if self.bootable {
            f.write_str(" [bootable]")?;
        }
        Ok(())
    }
}
