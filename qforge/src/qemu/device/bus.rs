use std::collections::HashMap;
use std::fmt;

/// Per-prefix counters producing `prefix.N` identifiers.
#[derive(Debug, Clone, Default)]
pub struct BusMap(HashMap<String, usize>);

impl BusMap {
    pub fn allocate(&mut self, prefix: &str) -> String {
        let counter = self.0.entry(prefix.to_string()).or_insert(0);
        let id = format!("{prefix}.{counter}");
        *counter += 1;
        id
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.0.get(prefix).copied().unwrap_or(0)
    }
}

/// Slot and function on the root complex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciAddr {
    pub slot: usize,
    pub function: usize,
}

impl fmt::Display for PciAddr {
    /// QEMU parses the slot as hexadecimal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}.{}", self.slot, self.function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_per_prefix() {
        let mut buses = BusMap::default();
        assert_eq!(buses.allocate("scsi"), "scsi.0");
        assert_eq!(buses.allocate("usb"), "usb.0");
        assert_eq!(buses.allocate("scsi"), "scsi.1");
        assert_eq!(buses.count("scsi"), 2);
        assert_eq!(buses.count("vfio"), 0);
    }

    #[test]
    fn test_addr_format() {
        assert_eq!(PciAddr { slot: 1, function: 7 }.to_string(), "1.7");
        assert_eq!(PciAddr { slot: 26, function: 0 }.to_string(), "1a.0");
    }
}
