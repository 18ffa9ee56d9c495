use serde::{Deserialize, Serialize};

/// A processor model available on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Processor {
    pub brand: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub model: String,
    /// Threads per core.
    pub threads: u32,
    pub default: bool,
}

impl Processor {
    pub fn is_amd(&self) -> bool {
        self.brand.eq_ignore_ascii_case("AMD")
    }

    pub fn is_intel(&self) -> bool {
        self.brand.eq_ignore_ascii_case("Intel")
    }
}
