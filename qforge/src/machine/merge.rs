//! Overlay engine.
//!
//! Fragments are folded in precedence order (machine first, then tags as
//! listed) into a default accumulator. A field is only written while the
//! accumulator still holds its unset value, so the first fragment that sets
//! a field wins. Set-valued fields are unioned instead.

/// A record that can absorb lower-precedence values into its unset fields.
pub trait Overlay {
    fn overlay(&mut self, other: &Self);
}

/// Fold fragments in precedence order into a fresh accumulator.
pub fn fold<'a, T, I>(fragments: I) -> T
where
    T: Overlay + Default + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut merged = T::default();
    for fragment in fragments {
        merged.overlay(fragment);
    }
    merged
}

/// Keep the first entry per key, preserving first-appearance order.
pub fn first_by_key<'a, T, K, F>(lists: impl IntoIterator<Item = &'a [T]>, key: F) -> Vec<T>
where
    T: Clone + 'a,
    K: Eq + std::hash::Hash,
    F: Fn(&T) -> K,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for list in lists {
        for item in list {
            if seen.insert(key(item)) {
                out.push(item.clone());
            }
        }
    }
    out
}

pub(crate) fn take_int<T: Default + PartialEq + Copy>(merged: &mut T, overlay: T) {
    if *merged == T::default() {
        *merged = overlay;
    }
}

pub(crate) fn take_string(merged: &mut String, overlay: &str) {
    if merged.is_empty() {
        *merged = overlay.to_string();
    }
}

pub(crate) fn take_bool(merged: &mut bool, overlay: bool) {
    *merged |= overlay;
}

/// Union two lists, dropping duplicates and keeping first-seen order.
pub(crate) fn union(merged: &mut Vec<String>, overlay: &[String]) {
    let mut out: Vec<String> = Vec::with_capacity(merged.len() + overlay.len());
    for item in merged.iter().chain(overlay) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    *merged = out;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        count: u32,
        label: String,
        flag: bool,
        names: Vec<String>,
    }

    impl Overlay for Sample {
        fn overlay(&mut self, other: &Self) {
            take_int(&mut self.count, other.count);
            take_string(&mut self.label, &other.label);
            take_bool(&mut self.flag, other.flag);
            union(&mut self.names, &other.names);
        }
    }

    #[test]
    fn test_fold_first_set_value_wins() {
        let d0 = Sample {
            count: 0,
            label: "machine".into(),
            ..Default::default()
        };
        let d1 = Sample {
            count: 2,
            label: "tag1".into(),
            ..Default::default()
        };
        let d2 = Sample {
            count: 3,
            flag: true,
            ..Default::default()
        };

        let merged: Sample = fold([&d0, &d1, &d2]);
        assert_eq!(merged.count, 2);
        assert_eq!(merged.label, "machine");
        assert!(merged.flag);
    }

    #[test]
    fn test_union_dedups_in_first_seen_order() {
        let mut names = vec!["a".to_string(), "b".to_string()];
        union(&mut names, &["c".to_string(), "a".to_string(), "c".to_string()]);
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_first_by_key() {
        let a = vec![("os", 1), ("data", 1)];
        let b = vec![("os", 2), ("swap", 2)];
        let merged = first_by_key([a.as_slice(), b.as_slice()], |item| item.0);
        assert_eq!(merged, vec![("os", 1), ("data", 1), ("swap", 2)]);
    }
}
