//! Reading machine and system records from the configuration directory.
//!
//! This is the only module that touches the filesystem. Compilation itself
//! works on values already in memory.

use std::fs;
use std::path::Path;

use qforge_shared::errors::{QforgeError, QforgeResult};

use crate::constants::paths::CONF_SUFFIX;
use crate::machine::Machine;
use crate::options::QforgeOptions;
use crate::system::System;

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> QforgeResult<T> {
    let data = fs::read(path).map_err(|e| {
        QforgeError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    serde_json::from_slice(&data)
        .map_err(|e| QforgeError::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Names of every `*.conf.json` file in `dir`, without the suffix, sorted.
///
/// A missing directory yields no names.
fn conf_names(dir: &Path) -> QforgeResult<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(stem) = file_name.strip_suffix(CONF_SUFFIX) {
            if !stem.is_empty() {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Load the system configuration.
///
/// `qforge.conf.json` is read first, then each file in `system.conf.d` in
/// name order. The first definition of any pool, processor or tag wins.
pub fn load_system(options: &QforgeOptions) -> QforgeResult<System> {
    let main = options.system_file();
    let mut system = if main.exists() {
        read_json::<System>(&main)?
    } else {
        tracing::debug!(path = %main.display(), "No main system configuration");
        System::default()
    };

    let dir = options.system_dir();
    for name in conf_names(&dir)? {
        let path = dir.join(format!("{name}{CONF_SUFFIX}"));
        let extra: System = read_json(&path)?;
        system.absorb(extra);
        tracing::debug!(path = %path.display(), "Loaded system configuration fragment");
    }
    Ok(system)
}

/// Load a machine by name. A record without a name takes it from the file.
pub fn load_machine(options: &QforgeOptions, name: &str) -> QforgeResult<Machine> {
    let path = options.machine_file(name);
    if !path.exists() {
        return Err(QforgeError::UnresolvedReference {
            kind: "machine",
            referencer: format!("machine directory {}", options.machine_dir().display()),
            reference: name.to_string(),
        });
    }
    let mut machine: Machine = read_json(&path)?;
    if machine.name.is_empty() {
        machine.name = name.to_string();
    }
    tracing::debug!(machine = %machine.name, path = %path.display(), "Loaded machine");
    Ok(machine)
}

/// Sorted names of every machine in the machine directory.
pub fn list_machines(options: &QforgeOptions) -> QforgeResult<Vec<String>> {
    conf_names(&options.machine_dir())
}
