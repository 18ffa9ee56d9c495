use std::fmt;

use serde::{Deserialize, Serialize};

/// A host network that machine connections join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    /// Bridge device the taps are attached to.
    pub device: String,
    /// Script run when a tap comes up; none when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub up: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub down: String,
}

impl Network {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.device)
    }
}
