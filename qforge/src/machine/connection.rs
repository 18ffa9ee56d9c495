//! Network connections.

use serde::{Deserialize, Serialize};

use crate::constants::domain;
use crate::identity::{IdentitySeed, MacAddr, empty_as_none};

pub type ConnectionName = String;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub name: ConnectionName,
    /// Name of the network pool the connection joins.
    #[serde(default)]
    pub network: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ip: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub mac: Option<MacAddr>,
}

impl Connection {
    pub fn new(name: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            network: network.into(),
            ..Default::default()
        }
    }

    pub fn populate(&mut self, seed: &IdentitySeed) {
        if !self.name.is_empty() && self.mac.is_none() {
            self.mac = Some(seed.hardware_addr(domain::CONNECTION_MAC, &self.name));
        }
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.network)?;
        if !self.ip.is_empty() {
            write!(f, " (ip: {})", self.ip)?;
        }
        if let Some(mac) = &self.mac {
            write!(f, " (mac: {mac})")?;
        }
        Ok(())
    }
}

/// Host-side tap interface name for a connection, `{machine}-{connection}`.
///
/// Slashes, whitespace and control characters are removed since the kernel
/// rejects them in interface names.
pub fn link_name(machine: &str, conn: &Connection) -> String {
    format!("{machine}-{}", conn.name)
        .chars()
        .filter(|c| *c != '/' && !c.is_whitespace() && !c.is_control())
        .collect()
}
