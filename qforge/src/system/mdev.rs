//! Mediated device pools (partitionable GPUs and similar).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A physical device that can be partitioned into mediated devices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatedDevice {
    /// PCI address of the physical device.
    pub address: String,
    /// Whether different mediated types may coexist on the device.
    pub heterogeneous: bool,
    /// Device classes this device supplies, keyed by class name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub classes: BTreeMap<String, MediatedDeviceType>,
}

/// Mediated device type used for a class, with preferred placements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatedDeviceType {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub placements: Vec<u32>,
}
