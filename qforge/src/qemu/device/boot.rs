use std::fmt;

/// Position of a device in the firmware boot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BootIndex(pub u32);

impl fmt::Display for BootIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out boot indices starting at 1.
#[derive(Debug, Clone, Default)]
pub struct BootOrder {
    index: u32,
}

impl BootOrder {
    pub fn next_index(&mut self) -> BootIndex {
        self.index += 1;
        BootIndex(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_from_one() {
        let mut order = BootOrder::default();
        assert_eq!(order.next_index(), BootIndex(1));
        assert_eq!(order.next_index(), BootIndex(2));
    }
}
