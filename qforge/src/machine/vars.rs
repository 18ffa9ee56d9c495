//! Machine variables and the patterns that expand them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use qforge_shared::errors::{QforgeError, QforgeResult};

/// Named variables available to patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vars(BTreeMap<String, String>);

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Value of `name`, empty when undefined.
    pub fn lookup(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge variable sets in order; the first set defining a name wins.
    pub fn merge<'a>(sets: impl IntoIterator<Item = &'a Vars>) -> Vars {
        let mut out = Vars::new();
        for vars in sets {
            for (key, value) in &vars.0 {
                out.0.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        out
    }
}

/// Replace `$name` and `${name}` references using `lookup`.
///
/// A bare `$name` runs over ASCII alphanumerics and underscores; names with
/// other characters (such as `machine-name`) need braces. A `$` that starts
/// no reference is kept verbatim.
pub fn expand<'a>(pattern: &str, lookup: impl Fn(&str) -> &'a str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => {
                    out.push_str(lookup(&braced[..end]));
                    rest = &braced[end + 1..];
                }
                None => {
                    out.push_str(&rest[pos..]);
                    rest = "";
                }
            }
            continue;
        }
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(lookup(&after[..len]));
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}

/// A string that undergoes variable expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringPattern(pub String);

impl StringPattern {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expand<'a>(&self, lookup: impl Fn(&str) -> &'a str) -> String {
        expand(&self.0, lookup)
    }
}

/// A pattern that expands to a TCP port number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortPattern(pub String);

impl PortPattern {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expand(&self, vars: &Vars) -> QforgeResult<u16> {
        let s = expand(&self.0, |name| vars.lookup(name));
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|e| QforgeError::Config(format!("port pattern \"{}\": {e}", self.0)))?;
        u16::try_from(value)
            .ok()
            .filter(|port| *port >= 1)
            .ok_or_else(|| {
                QforgeError::Config(format!(
                    "port pattern \"{}\": invalid resulting port number {value}",
                    self.0
                ))
            })
    }
}
