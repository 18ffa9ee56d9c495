//! Machine attributes: independently overridable groups of settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::merge::{Overlay, take_bool, take_int, take_string, union};
use super::vars::PortPattern;
use super::volume::Volume;

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero<T: Default + PartialEq>(v: &T) -> bool {
    *v == T::default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub firmware: Firmware,
    pub cpu: Cpu,
    pub memory: Memory,
    pub enlightenments: Enlightenments,
    pub qmp: Qmp,
    pub agent: Agent,
    pub spice: Spice,
    pub tpm: Tpm,
}

impl Overlay for Attributes {
    fn overlay(&mut self, other: &Self) {
        self.firmware.overlay(&other.firmware);
        self.cpu.overlay(&other.cpu);
        self.memory.overlay(&other.memory);
        self.enlightenments.overlay(&other.enlightenments);
        self.qmp.overlay(&other.qmp);
        self.agent.overlay(&other.agent);
        self.spice.overlay(&other.spice);
        self.tpm.overlay(&other.tpm);
    }
}

// ============================================================================
// Firmware
// ============================================================================

/// UEFI firmware: a read-only code volume and a per-machine vars volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Firmware {
    #[serde(skip_serializing_if = "Volume::is_empty")]
    pub code: Volume,
    #[serde(skip_serializing_if = "Volume::is_empty")]
    pub vars: Volume,
}

impl Firmware {
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.vars.is_empty()
    }
}

impl Overlay for Firmware {
    fn overlay(&mut self, other: &Self) {
        if self.code.is_empty() {
            self.code = other.code.clone();
        }
        if self.vars.is_empty() {
            self.vars = other.vars.clone();
        }
    }
}

// ============================================================================
// CPU, memory, enlightenments
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cpu {
    /// Named processor from the system configuration.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub processor: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub sockets: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub cores: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub threads: u32,
}

impl Overlay for Cpu {
    fn overlay(&mut self, other: &Self) {
        take_string(&mut self.processor, &other.processor);
        take_int(&mut self.sockets, other.sockets);
        take_int(&mut self.cores, other.cores);
        take_int(&mut self.threads, other.threads);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Memory {
    /// RAM in MiB.
    #[serde(skip_serializing_if = "is_zero")]
    pub ram: u32,
}

impl Overlay for Memory {
    fn overlay(&mut self, other: &Self) {
        take_int(&mut self.ram, other.ram);
    }
}

/// Hyper-V enlightenments for Windows guests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enlightenments {
    #[serde(skip_serializing_if = "is_false")]
    pub enabled: bool,
}

impl Overlay for Enlightenments {
    fn overlay(&mut self, other: &Self) {
        take_bool(&mut self.enabled, other.enabled);
    }
}

// ============================================================================
// QMP
// ============================================================================

/// QEMU Machine Protocol sockets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Qmp {
    #[serde(skip_serializing_if = "is_false")]
    pub enabled: bool,
    pub sockets: QmpSockets,
}

/// Extra sockets beyond the standard system and command sockets.
///
/// Named sockets live in the runtime directory; pathed sockets are used
/// verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QmpSockets {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

/// Socket names every QMP-enabled machine receives.
const SYSTEM_SOCKETS: &[&str] = &["systemd.0"];
const COMMAND_SOCKETS: &[&str] = &["command.0", "command.1"];

impl Overlay for Qmp {
    fn overlay(&mut self, other: &Self) {
        take_bool(&mut self.enabled, other.enabled);
        union(&mut self.sockets.names, &other.sockets.names);
        union(&mut self.sockets.paths, &other.sockets.paths);
    }
}

impl Qmp {
    /// `{run_dir}/{machine}.qmp.{name}.sock`.
    pub fn socket_path(run_dir: &Path, machine: &str, name: &str) -> PathBuf {
        run_dir.join(format!("{machine}.qmp.{name}.sock"))
    }

    /// System, command, named and pathed sockets, deduplicated in that order.
    pub fn all_socket_paths(&self, run_dir: &Path, machine: &str) -> Vec<PathBuf> {
        let named = SYSTEM_SOCKETS
            .iter()
            .chain(COMMAND_SOCKETS)
            .copied()
            .chain(self.sockets.names.iter().map(String::as_str))
            .map(|name| Self::socket_path(run_dir, machine, name));
        let pathed = self.sockets.paths.iter().map(PathBuf::from);

        let mut out: Vec<PathBuf> = Vec::new();
        for path in named.chain(pathed) {
            if !out.contains(&path) {
                out.push(path);
            }
        }
        out
    }
}

// ============================================================================
// Guest agent
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Agent {
    pub qemu: QemuAgent,
}

/// QEMU guest agent reached over a loopback TCP port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QemuAgent {
    #[serde(skip_serializing_if = "is_false")]
    pub enabled: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub port: u16,
    #[serde(rename = "port-pattern", skip_serializing_if = "PortPattern::is_empty")]
    pub port_pattern: PortPattern,
}

impl Overlay for Agent {
    fn overlay(&mut self, other: &Self) {
        let (merged, overlay) = (&mut self.qemu, &other.qemu);
        take_bool(&mut merged.enabled, overlay.enabled);
        take_int(&mut merged.port, overlay.port);
        take_string(&mut merged.port_pattern.0, &overlay.port_pattern.0);
    }
}

// ============================================================================
// SPICE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spice {
    #[serde(skip_serializing_if = "is_false")]
    pub enabled: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub port: u16,
    #[serde(rename = "port-pattern", skip_serializing_if = "PortPattern::is_empty")]
    pub port_pattern: PortPattern,
    /// Number of QXL display heads.
    #[serde(skip_serializing_if = "is_zero")]
    pub displays: u32,
}

impl Overlay for Spice {
    fn overlay(&mut self, other: &Self) {
        take_bool(&mut self.enabled, other.enabled);
        take_int(&mut self.port, other.port);
        take_string(&mut self.port_pattern.0, &other.port_pattern.0);
        take_int(&mut self.displays, other.displays);
    }
}

// ============================================================================
// TPM
// ============================================================================

/// Emulated TPM backed by a software TPM listening on a socket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tpm {
    #[serde(skip_serializing_if = "is_false")]
    pub enabled: bool,
}

impl Overlay for Tpm {
    fn overlay(&mut self, other: &Self) {
        take_bool(&mut self.enabled, other.enabled);
    }
}

impl Tpm {
    /// `{run_dir}/{machine}.swtpm.sock`, served by the software TPM.
    pub fn socket_path(run_dir: &Path, machine: &str) -> PathBuf {
        run_dir.join(format!("{machine}.swtpm.sock"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qmp_socket_union() {
        let mut machine = Qmp::default();
        machine.sockets.names = vec!["mine".into()];

        let mut tag1 = Qmp {
            enabled: true,
            ..Default::default()
        };
        tag1.sockets.names = vec!["monitor".into(), "mine".into()];

        let mut tag2 = Qmp::default();
        tag2.sockets.names = vec!["audit".into(), "monitor".into()];

        let merged: Qmp = crate::machine::merge::fold([&machine, &tag1, &tag2]);
        assert!(merged.enabled);
        assert_eq!(merged.sockets.names, vec!["mine", "monitor", "audit"]);
    }

    #[test]
    fn test_qmp_all_socket_paths() {
        let mut qmp = Qmp::default();
        qmp.sockets.names = vec!["command.0".into(), "extra".into()];
        qmp.sockets.paths = vec!["/tmp/q.sock".into()];

        let paths = qmp.all_socket_paths(Path::new("/run/qforge"), "alpha");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/run/qforge/alpha.qmp.systemd.0.sock"),
                PathBuf::from("/run/qforge/alpha.qmp.command.0.sock"),
                PathBuf::from("/run/qforge/alpha.qmp.command.1.sock"),
                PathBuf::from("/run/qforge/alpha.qmp.extra.sock"),
                PathBuf::from("/tmp/q.sock"),
            ]
        );
    }

    #[test]
    fn test_firmware_volume_taken_when_empty() {
        let machine = Firmware::default();
        let tag = Firmware {
            code: Volume::new("OVMF_CODE", "firmware"),
            vars: Volume::new("vars", "nvram"),
        };
        let mut merged = machine.clone();
        merged.overlay(&tag);
        assert_eq!(merged.code.name, "OVMF_CODE");
        assert_eq!(merged.vars.storage, "nvram");
    }

    #[test]
    fn test_attributes_deserialize_wire_names() {
        let attrs: Attributes = serde_json::from_str(
            r#"{"cpu":{"sockets":2,"cores":4},"memory":{"ram":2048},
                "agent":{"qemu":{"enabled":true,"port-pattern":"${base}"}}}"#,
        )
        .unwrap();
        assert_eq!(attrs.cpu.sockets, 2);
        assert_eq!(attrs.memory.ram, 2048);
        assert!(attrs.agent.qemu.enabled);
        assert_eq!(attrs.agent.qemu.port_pattern.0, "${base}");
    }
}
