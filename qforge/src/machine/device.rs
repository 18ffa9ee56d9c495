//! Passthrough and mediated device requirements.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{domain, paths};
use crate::identity::{IdentitySeed, empty_as_none};

pub type DeviceName = String;
pub type DeviceClass = String;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub name: DeviceName,
    /// Class of device required, matched against mediated device pools.
    #[serde(default)]
    pub class: DeviceClass,
    /// Mediated device UUID; derived from the seed when absent.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Uuid>,
}

impl Device {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            id: None,
        }
    }

    pub fn populate(&mut self, seed: &IdentitySeed) {
        if !self.name.is_empty() && self.id.is_none() {
            self.id = Some(seed.uuid(domain::DEVICE_ID, &self.name));
        }
    }

    /// Sysfs path of the mediated device, once an id is known.
    pub fn sysfs_path(&self) -> Option<PathBuf> {
        self.id
            .map(|id| PathBuf::from(paths::MDEV_DEVICES).join(id.to_string()))
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.class)?;
        if let Some(id) = &self.id {
            write!(f, " (id: {id})")?;
        }
        Ok(())
    }
}
