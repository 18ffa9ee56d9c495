//! Filesystem locations used to load records and name runtime sockets.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{env, paths};

/// Where configuration lives and where runtime sockets are placed.
///
/// `QforgeOptions::default()` uses the standard system locations;
/// [`QforgeOptions::from_env`] applies `QFORGE_CONF_DIR` and
/// `QFORGE_RUN_DIR` on top of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QforgeOptions {
    /// Directory holding `qforge.conf.json` and the `.conf.d` directories.
    pub conf_dir: PathBuf,
    /// Directory for QMP and TPM sockets.
    pub run_dir: PathBuf,
}

impl Default for QforgeOptions {
    fn default() -> Self {
        Self {
            conf_dir: PathBuf::from(paths::CONF_DIR),
            run_dir: PathBuf::from(paths::RUN_DIR),
        }
    }
}

impl QforgeOptions {
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(dir) = std::env::var_os(env::CONF_DIR).filter(|v| !v.is_empty()) {
            options.conf_dir = PathBuf::from(dir);
        }
        if let Some(dir) = std::env::var_os(env::RUN_DIR).filter(|v| !v.is_empty()) {
            options.run_dir = PathBuf::from(dir);
        }
        options
    }

    pub fn system_file(&self) -> PathBuf {
        self.conf_dir.join(paths::SYSTEM_FILE)
    }

    pub fn system_dir(&self) -> PathBuf {
        self.conf_dir.join(paths::SYSTEM_DIR)
    }

    pub fn machine_dir(&self) -> PathBuf {
        self.conf_dir.join(paths::MACHINE_DIR)
    }

    pub fn machine_file(&self, name: &str) -> PathBuf {
        self.machine_dir().join(format!("{name}{}", paths::CONF_SUFFIX))
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let options = QforgeOptions::default();
        assert_eq!(options.system_file(), PathBuf::from("/etc/qforge/qforge.conf.json"));
        assert_eq!(
            options.machine_file("alpha"),
            PathBuf::from("/etc/qforge/machine.conf.d/alpha.conf.json")
        );
        assert_eq!(options.run_dir(), Path::new("/run/qforge"));
    }

    #[test]
    fn test_partial_json() {
        let options: QforgeOptions = serde_json::from_str(r#"{"run_dir": "/tmp/run"}"#).unwrap();
        assert_eq!(options.run_dir, PathBuf::from("/tmp/run"));
        assert_eq!(options.conf_dir, PathBuf::from("/etc/qforge"));
    }
}
