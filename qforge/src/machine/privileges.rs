//! Host privileges granted to a machine's processes.

use serde::{Deserialize, Serialize};

use super::merge::{Overlay, take_int, take_string};
use crate::constants::{domain, privileges::GROUP_PREFIX};
use crate::identity::IdentitySeed;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privileges {
    #[serde(default, rename = "filesystem")]
    pub file_system: FileSystemPrivileges,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystemPrivileges {
    #[serde(default)]
    pub group: Group,
}

/// POSIX group that owns the machine's files. Zero id means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: u32,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

impl Overlay for Privileges {
    fn overlay(&mut self, other: &Self) {
        let merged = &mut self.file_system.group;
        let overlay = &other.file_system.group;
        take_string(&mut merged.name, &overlay.name);
        take_int(&mut merged.id, overlay.id);
    }
}

impl Privileges {
    /// Fill the group name and id when unset.
    pub fn populate(&mut self, machine: &str, seed: &IdentitySeed) {
        let group = &mut self.file_system.group;
        if group.name.is_empty() {
            group.name = format!("{GROUP_PREFIX}{machine}");
        }
        if group.id == 0 {
            group.id = seed.group_id(domain::FILESYSTEM_GROUP, 0);
        }
    }
}
