//! Uniqueness-checked, insertion-ordered collections.

use std::collections::HashMap;

use qforge_shared::errors::{QforgeError, QforgeResult};

/// Something registered under a unique name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Entries keyed by name, iterated in insertion order.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    label: &'static str,
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Named> Registry<T> {
    /// `label` names the registry in error messages.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add an entry, rejecting empty and duplicate names.
    pub fn add(&mut self, entry: T) -> QforgeResult<&T> {
        let name = entry.name();
        if name.is_empty() {
            return Err(QforgeError::InvalidArgument(format!(
                "{} entries require a name",
                self.label
            )));
        }
        if self.index.contains_key(name) {
            return Err(QforgeError::DuplicateName {
                registry: self.label,
                name: name.to_string(),
            });
        }
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    pub fn find(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Entry(&'static str);

    impl Named for Entry {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_add_find_and_order() {
        let mut reg = Registry::new("test registry");
        reg.add(Entry("b")).unwrap();
        reg.add(Entry("a")).unwrap();

        assert!(reg.find("a").is_some());
        assert!(reg.find("c").is_none());
        let names: Vec<_> = reg.iter().map(|e| e.0).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_duplicate_rejected_and_unchanged() {
        let mut reg = Registry::new("test registry");
        reg.add(Entry("a")).unwrap();
        let err = reg.add(Entry("a")).unwrap_err();
        assert!(err.is_duplicate_name());
        assert!(err.to_string().contains("test registry"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut reg = Registry::new("test registry");
        assert!(reg.add(Entry("")).is_err());
        assert!(reg.is_empty());
    }
}
