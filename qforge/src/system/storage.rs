//! Storage pools.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::machine::{MachineInfo, StringPattern};

/// A directory of volume images sharing one attachment strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub path: PathBuf,
    /// File name pattern; may reference `${name}`, `${id}` and `${volume}`.
    #[serde(skip_serializing_if = "StringPattern::is_empty")]
    pub pattern: StringPattern,
    /// Attachment strategy, such as `raw-scsi` or `iso-ahci`.
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(rename = "readonly", skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

impl Storage {
    /// Host path of `volume` for the given machine.
    ///
    /// A pattern wins when present; otherwise the file is named after the
    /// volume, with the pool type's format prefix (`iso` for `iso-ahci`) or
    /// `raw` as extension. The result always stays under the pool path.
    pub fn volume_path(&self, machine: &MachineInfo, volume: &str) -> PathBuf {
        let file = if !self.pattern.is_empty() {
            let id = machine.id.to_string();
            self.pattern.expand(|name| match name {
                "name" => machine.name.as_str(),
                "id" => id.as_str(),
                "volume" => volume,
                _ => "",
            })
        } else if let Some(ext) = self.kind.split('-').next().filter(|e| !e.is_empty()) {
            format!("{volume}.{ext}")
        } else {
            format!("{volume}.raw")
        };
        self.path.join(file.trim_start_matches('/'))
    }
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if !self.kind.is_empty() {
            write!(f, " ({})", self.kind)?;
        }
        if self.read_only {
            f.write_str(" [read-only]")?;
        }
        Ok(())
    }
}
