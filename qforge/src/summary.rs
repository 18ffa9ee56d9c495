//! Indented multi-line summaries of configuration.

use std::fmt::Display;

/// Builder for indented summaries, two spaces per level.
#[derive(Debug, Default)]
pub struct Summary {
    out: String,
    indent: usize,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descend(&mut self) {
        self.indent += 1;
    }

    pub fn ascend(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Start a new line at the current indent.
    pub fn add(&mut self, line: impl AsRef<str>) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(line.as_ref());
    }

    /// A heading followed by one indented line per item. Skipped when empty.
    pub fn section<T: Display>(&mut self, heading: &str, items: &[T]) {
        if items.is_empty() {
            return;
        }
        self.add(heading);
        self.descend();
        for item in items {
            self.add(item.to_string());
        }
        self.ascend();
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation() {
        let mut out = Summary::new();
        out.add("Top");
        out.section("Items:", &["a", "b"]);
        out.section::<&str>("Empty:", &[]);
        assert_eq!(out.finish(), "Top\nItems:\n  a\n  b");
    }
}
