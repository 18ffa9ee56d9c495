//! Definitions: the mergeable body shared by machines and tags.

use serde::{Deserialize, Serialize};

use super::attributes::Attributes;
use super::connection::Connection;
use super::device::Device;
use super::merge::{first_by_key, fold};
use super::privileges::Privileges;
use super::vars::Vars;
use super::volume::Volume;
use crate::identity::IdentitySeed;
use crate::summary::Summary;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Definition {
    #[serde(skip_serializing_if = "Vars::is_empty")]
    pub vars: Vars,
    pub privileges: Privileges,
    #[serde(rename = "attrs")]
    pub attributes: Attributes,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<Device>,
}

impl Definition {
    /// Merge definitions in precedence order.
    ///
    /// Scalars take the first set value, named entries keep their first
    /// occurrence, and socket lists are unioned. Merging never fails.
    pub fn merge<'a>(defs: impl IntoIterator<Item = &'a Definition>) -> Definition {
        let defs: Vec<&Definition> = defs.into_iter().collect();
        Definition {
            vars: Vars::merge(defs.iter().map(|d| &d.vars)),
            privileges: fold(defs.iter().map(|d| &d.privileges)),
            attributes: fold(defs.iter().map(|d| &d.attributes)),
            volumes: first_by_key(defs.iter().map(|d| d.volumes.as_slice()), |v| {
                v.name.clone()
            }),
            connections: first_by_key(defs.iter().map(|d| d.connections.as_slice()), |c| {
                c.name.clone()
            }),
            devices: first_by_key(defs.iter().map(|d| d.devices.as_slice()), |d| {
                d.name.clone()
            }),
        }
    }

    /// Fill absent volume, connection and device identities.
    pub fn populate(&mut self, machine: &str, seed: &IdentitySeed) {
        self.privileges.populate(machine, seed);
        for vol in &mut self.volumes {
            vol.populate(seed);
        }
        for conn in &mut self.connections {
            conn.populate(seed);
        }
        for dev in &mut self.devices {
            dev.populate(seed);
        }
    }

    pub fn volume(&self, name: &str) -> Option<&Volume> {
        self.volumes.iter().find(|v| v.name == name)
    }

    pub fn connection(&self, name: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.name == name)
    }

    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    pub(crate) fn summarize(&self, out: &mut Summary) {
        let attrs = &self.attributes;
        if !attrs.firmware.code.is_empty() {
            out.add(format!("Firmware Code: {}", attrs.firmware.code));
        }
        if !attrs.firmware.vars.is_empty() {
            out.add(format!("Firmware Vars: {}", attrs.firmware.vars));
        }
        let cpu = &attrs.cpu;
        if cpu.sockets > 0 || cpu.cores > 0 || cpu.threads > 0 {
            out.add(format!(
                "CPU: {} socket(s), {} core(s), {} thread(s)",
                cpu.sockets, cpu.cores, cpu.threads
            ));
        }
        if attrs.memory.ram > 0 {
            out.add(format!("RAM: {} MiB", attrs.memory.ram));
        }
        if attrs.enlightenments.enabled {
            out.add("Enlightenments: Enabled");
        }
        if attrs.qmp.enabled {
            out.add("QMP: Enabled");
        }
        if attrs.agent.qemu.enabled {
            out.add("QEMU Guest Agent: Enabled");
        }
        if attrs.spice.enabled {
            out.add("SPICE: Enabled");
        }
        if attrs.tpm.enabled {
            out.add("TPM: Enabled");
        }
        out.section("Volumes:", &self.volumes);
        out.section("Connections:", &self.connections);
        out.section("Devices:", &self.devices);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_definition(ram: u32, volumes: &[(&str, &str)]) -> Definition {
        let mut def = Definition::default();
        def.attributes.memory.ram = ram;
        def.volumes = volumes
            .iter()
            .map(|(name, storage)| Volume::new(*name, *storage))
            .collect();
        def
    }

    #[test]
    fn test_merge_scalar_precedence() {
        let d0 = create_test_definition(0, &[]);
        let d1 = create_test_definition(1024, &[]);
        let d2 = create_test_definition(4096, &[]);
        assert_eq!(Definition::merge([&d0, &d1, &d2]).attributes.memory.ram, 1024);

        let d0 = create_test_definition(512, &[]);
        assert_eq!(Definition::merge([&d0, &d1, &d2]).attributes.memory.ram, 512);

        let d1 = create_test_definition(0, &[]);
        let d0 = create_test_definition(0, &[]);
        assert_eq!(Definition::merge([&d0, &d1, &d2]).attributes.memory.ram, 4096);
    }

    #[test]
    fn test_merge_named_entries_first_wins() {
        let d0 = create_test_definition(0, &[("os", "fast")]);
        let d1 = create_test_definition(0, &[("data", "bulk"), ("os", "slow")]);

        let merged = Definition::merge([&d0, &d1]);
        let names: Vec<_> = merged.volumes.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["os", "data"]);
        assert_eq!(merged.volume("os").unwrap().storage, "fast");
    }

    #[test]
    fn test_merge_empty_is_default() {
        assert_eq!(Definition::merge([]), Definition::default());
    }
}
