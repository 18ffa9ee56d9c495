//! Machine data model.
//!
//! A [`Machine`] carries a permanent id, a name and its own [`Definition`],
//! plus references to tags defined in the system catalog. Resolving a
//! machine merges its definition with its tags and fills any identities the
//! configuration left absent.

pub mod attributes;
pub mod connection;
pub mod definition;
pub mod device;
pub mod merge;
pub mod privileges;
pub mod vars;
pub mod volume;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use qforge_shared::errors::QforgeResult;

use crate::identity::IdentitySeed;
use crate::summary::Summary;
use crate::system::System;

pub use attributes::Attributes;
pub use connection::{Connection, link_name};
pub use definition::Definition;
pub use device::Device;
pub use privileges::Privileges;
pub use vars::{PortPattern, StringPattern, Vars};
pub use volume::Volume;

pub type MachineName = String;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    #[serde(default)]
    pub name: MachineName,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Permanent machine id; every derived identity depends on it.
    #[serde(default)]
    pub id: Uuid,
    /// Tags merged after the machine's own definition, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub definition: Definition,
}

/// Identifying details of a machine, without its definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineInfo {
    pub id: Uuid,
    pub name: MachineName,
    pub description: String,
}

impl MachineInfo {
    pub fn seed(&self) -> IdentitySeed {
        IdentitySeed::new(self.id, self.name.clone())
    }

    /// Built-in variables describing the machine.
    pub fn vars(&self) -> Vars {
        let mut vars = Vars::new();
        vars.insert("machine-name", self.name.clone());
        vars.insert("machine-description", self.description.clone());
        vars.insert("machine-id", self.id.to_string());
        vars
    }
}

impl Machine {
    pub fn info(&self) -> MachineInfo {
        MachineInfo {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    /// Merge the machine's definition with its tags and seed absent
    /// identities.
    ///
    /// Identities are populated after merging, so an entity receives the
    /// same identity no matter which fragment supplied it.
    pub fn resolve(&self, system: &System) -> QforgeResult<Definition> {
        let tags = system.collect_tags(&self.name, &self.tags)?;
        let mut merged =
            Definition::merge(std::iter::once(&self.definition).chain(tags.into_iter()));
        merged.populate(&self.name, &self.info().seed());

        tracing::debug!(
            machine = %self.name,
            tags = self.tags.len(),
            volumes = merged.volumes.len(),
            connections = merged.connections.len(),
            devices = merged.devices.len(),
            "Resolved machine definition"
        );
        Ok(merged)
    }

    /// Multi-line description of the machine as configured.
    pub fn summary(&self) -> String {
        let mut out = Summary::new();
        out.descend();
        if !self.name.is_empty() {
            out.add(format!("Name: {}", self.name));
        }
        if !self.description.is_empty() {
            out.add(format!("Description: {}", self.description));
        }
        if !self.id.is_nil() {
            out.add(format!("ID: {}", self.id));
        }
        if !self.tags.is_empty() {
            out.add(format!("Tags: {}", self.tags.join(",")));
        }
        self.definition.summarize(&mut out);
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::System;

    fn create_test_machine() -> Machine {
        let mut machine = Machine {
            name: "alpha".into(),
            id: Uuid::parse_str("8d2c0cb0-5b1e-4d0e-9f5b-4f6f6b1e2a10").unwrap(),
            tags: vec!["base".into()],
            ..Default::default()
        };
        machine.definition.volumes.push(Volume::new("os", "local"));
        machine
    }

    fn create_test_system() -> System {
        let mut base = Definition::default();
        base.attributes.memory.ram = 1024;
        base.volumes.push(Volume::new("os", "remote"));
        base.volumes.push(Volume::new("scratch", "local"));

        let mut system = System::default();
        system.tag.insert("base".into(), base);
        system
    }

    #[test]
    fn test_resolve_merges_tags_and_populates() {
        let def = create_test_machine().resolve(&create_test_system()).unwrap();
        assert_eq!(def.attributes.memory.ram, 1024);
        assert_eq!(def.volume("os").unwrap().storage, "local");
        assert!(def.volumes.iter().all(|v| v.wwn.is_some()));
        assert_eq!(def.privileges.file_system.group.name, "qforge-alpha");
    }

    #[test]
    fn test_resolve_missing_tag() {
        let mut machine = create_test_machine();
        machine.tags.push("gpu".into());
        let err = machine.resolve(&create_test_system()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("gpu"));
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn test_identity_stable_when_other_volume_renamed() {
        let system = create_test_system();
        let mut machine = create_test_machine();
        machine.definition.volumes.push(Volume::new("logs", "local"));
        let before = machine.resolve(&system).unwrap();

        machine.definition.volumes[1].name = "journal".into();
        let after = machine.resolve(&system).unwrap();

        assert_eq!(before.volume("os").unwrap().wwn, after.volume("os").unwrap().wwn);
        assert_eq!(
            before.volume("scratch").unwrap().serial,
            after.volume("scratch").unwrap().serial
        );
    }

    #[test]
    fn test_machine_json_flattens_definition() {
        let machine: Machine = serde_json::from_str(
            r#"{
                "name": "alpha",
                "id": "8d2c0cb0-5b1e-4d0e-9f5b-4f6f6b1e2a10",
                "tags": ["base"],
                "attrs": {"memory": {"ram": 2048}},
                "volumes": [{"name": "os", "storage": "local", "bootable": true}]
            }"#,
        )
        .unwrap();
        assert_eq!(machine.definition.attributes.memory.ram, 2048);
        assert!(machine.definition.volumes[0].bootable);
    }

    #[test]
    fn test_vars() {
        let vars = create_test_machine().info().vars();
        assert_eq!(vars.lookup("machine-name"), "alpha");
        assert_eq!(vars.lookup("machine-id"), "8d2c0cb0-5b1e-4d0e-9f5b-4f6f6b1e2a10");
    }

    #[test]
    fn test_summary() {
        let summary = create_test_machine().summary();
        assert!(summary.contains("  Name: alpha"));
        assert!(summary.contains("Volumes:"));
        assert!(summary.contains("    os: local"));
    }
}
