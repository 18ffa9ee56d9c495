//! Host system catalog: storage pools, networks, mediated devices,
//! processors and tags.
//!
//! The catalog is an immutable input to compilation. Maps are ordered so
//! that anything derived from iterating them is deterministic.

mod mdev;
mod network;
mod processor;
mod storage;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use qforge_shared::errors::{QforgeError, QforgeResult};

use crate::machine::Definition;
use crate::summary::Summary;

pub use mdev::{MediatedDevice, MediatedDeviceType};
pub use network::Network;
pub use processor::Processor;
pub use storage::Storage;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct System {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub storage: BTreeMap<String, Storage>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub network: BTreeMap<String, Network>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub mdev: BTreeMap<String, MediatedDevice>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub processor: BTreeMap<String, Processor>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tag: BTreeMap<String, Definition>,
}

impl System {
    /// Look up tag definitions in order, failing on the first missing one.
    pub fn collect_tags(&self, machine: &str, names: &[String]) -> QforgeResult<Vec<&Definition>> {
        names
            .iter()
            .map(|name| {
                self.tag
                    .get(name)
                    .ok_or_else(|| QforgeError::UnresolvedReference {
                        kind: "tag",
                        referencer: format!("machine {machine}"),
                        reference: name.clone(),
                    })
            })
            .collect()
    }

    /// Mediated device pools supplying `class`, sorted by address.
    pub fn mdev_with_class(&self, class: &str) -> Vec<&MediatedDevice> {
        let mut devices: Vec<&MediatedDevice> = self
            .mdev
            .values()
            .filter(|dev| dev.classes.contains_key(class))
            .collect();
        devices.sort_by(|a, b| a.address.cmp(&b.address));
        devices
    }

    /// Name of the processor used when a machine names none.
    ///
    /// Processors flagged as default are preferred; ties resolve by name.
    pub fn default_processor(&self) -> Option<&str> {
        self.processor
            .iter()
            .find(|(_, p)| p.default)
            .or_else(|| self.processor.iter().next())
            .map(|(name, _)| name.as_str())
    }

    /// Fold another system into this one. Existing entries win.
    pub fn absorb(&mut self, other: System) {
        fn fill<V>(into: &mut BTreeMap<String, V>, from: BTreeMap<String, V>) {
            for (name, value) in from {
                into.entry(name).or_insert(value);
            }
        }
        fill(&mut self.storage, other.storage);
        fill(&mut self.network, other.network);
        fill(&mut self.mdev, other.mdev);
        fill(&mut self.processor, other.processor);
        fill(&mut self.tag, other.tag);
    }

    pub fn summary(&self) -> String {
        let mut out = Summary::new();
        out.descend();
        if !self.storage.is_empty() {
            out.add("Storage:");
            out.descend();
            for (name, store) in &self.storage {
                out.add(format!("{name}: {store}"));
            }
            out.ascend();
        }
        if !self.network.is_empty() {
            out.add("Networks:");
            out.descend();
            for (name, network) in &self.network {
                out.add(format!("{name}: {network}"));
            }
            out.ascend();
        }
        if !self.mdev.is_empty() {
            out.add("Mediated Devices:");
            out.descend();
            for (name, dev) in &self.mdev {
                out.add(format!("{name}: {}", dev.address));
                out.descend();
                for (class, ty) in &dev.classes {
                    out.add(format!("{class}: {}", ty.name));
                }
                out.ascend();
            }
            out.ascend();
        }
        if !self.tag.is_empty() {
            out.add("Tags:");
            out.descend();
            for (name, def) in &self.tag {
                out.add(format!("{name}:"));
                out.descend();
                def.summarize(&mut out);
                out.ascend();
            }
            out.ascend();
        }
        out.finish()
    }
}
