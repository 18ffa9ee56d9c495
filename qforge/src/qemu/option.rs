//! Command-line options and their comma-joined parameters.

use std::fmt;

/// A single entry in a comma-separated parameter list.
///
/// Renders as `name=value`, or as the bare `name` or `value` when the other
/// half is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
        }
    }

    /// A parameter with a name and no value, such as `hv-relaxed`.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.value.is_empty()) {
            (true, _) => f.write_str(&self.value),
            (false, true) => f.write_str(&self.name),
            (false, false) => write!(f, "{}={}", self.name, self.value),
        }
    }
}

/// Ordered parameter list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(Vec<Parameter>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.0.push(Parameter::new(name, value));
        self
    }

    pub fn add_flag(&mut self, name: impl Into<String>) -> &mut Self {
        self.0.push(Parameter::flag(name));
        self
    }

    /// Add `name=value` only when `value` is present.
    pub fn add_opt<T: ToString>(&mut self, name: impl Into<String>, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.add(name, value);
        }
        self
    }

    /// Add `name=on` when `enabled` is set.
    pub fn add_on(&mut self, name: impl Into<String>, enabled: bool) -> &mut Self {
        if enabled {
            self.add(name, "on");
        }
        self
    }

    pub fn extend(&mut self, other: Parameters) -> &mut Self {
        self.0.extend(other.0);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.0.iter()
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, param) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{param}")?;
        }
        Ok(())
    }
}

impl FromIterator<Parameter> for Parameters {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One invocation option: a `-type` token and an optional parameter string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QemuOption {
    pub kind: String,
    pub params: Parameters,
}

impl QemuOption {
    pub fn new(kind: impl Into<String>, params: Parameters) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }

    /// An option with no parameters, such as `-nodefaults`.
    pub fn bare(kind: impl Into<String>) -> Self {
        Self::new(kind, Parameters::new())
    }

    /// The option as separate command-line tokens.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![format!("-{}", self.kind)];
        if !self.params.is_empty() {
            args.push(self.params.to_string());
        }
        args
    }
}

impl fmt::Display for QemuOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "-{}", self.kind)
        } else {
            write!(f, "-{} {}", self.kind, self.params)
        }
    }
}

/// Ordered list of invocation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(Vec<QemuOption>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, option: QemuOption) {
        self.0.push(option);
    }

    pub fn add(&mut self, kind: impl Into<String>, params: Parameters) {
        self.0.push(QemuOption::new(kind, params));
    }

    pub fn add_bare(&mut self, kind: impl Into<String>) {
        self.0.push(QemuOption::bare(kind));
    }

    pub fn append(&mut self, other: Options) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QemuOption> {
        self.0.iter()
    }

    /// Flatten into argv tokens, suitable for `std::process::Command::args`.
    pub fn args(&self) -> Vec<String> {
        self.0.iter().flat_map(QemuOption::args).collect()
    }

    /// One option per line, joined with shell line continuations.
    pub fn multiline(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" \\\n")
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, opt) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{opt}")?;
        }
        Ok(())
    }
}

impl IntoIterator for Options {
    type Item = QemuOption;
    type IntoIter = std::vec::IntoIter<QemuOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Options {
    type Item = &'a QemuOption;
    type IntoIter = std::slice::Iter<'a, QemuOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<QemuOption> for Options {
    fn from_iter<I: IntoIterator<Item = QemuOption>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_forms() {
        assert_eq!(Parameter::new("id", "scsi.0").to_string(), "id=scsi.0");
        assert_eq!(Parameter::flag("hv-relaxed").to_string(), "hv-relaxed");
        assert_eq!(Parameter::new("", "socket").to_string(), "socket");
    }

    #[test]
    fn test_parameters_join_with_commas() {
        let mut params = Parameters::new();
        params
            .add("driver", "virtio-scsi-pci")
            .add("id", "scsi.0")
            .add_opt("iothread", None::<&str>)
            .add_on("multifunction", false)
            .add("num_queues", 4);
        assert_eq!(params.to_string(), "driver=virtio-scsi-pci,id=scsi.0,num_queues=4");
        assert_eq!(params.get("id"), Some("scsi.0"));
    }

    #[test]
    fn test_option_args_and_display() {
        let mut params = Parameters::new();
        params.add("size", "2048M");

        let mut opts = Options::new();
        opts.add_bare("nodefaults");
        opts.add("m", params);

        assert_eq!(opts.args(), vec!["-nodefaults", "-m", "size=2048M"]);
        assert_eq!(opts.to_string(), "-nodefaults -m size=2048M");
        assert_eq!(opts.multiline(), "-nodefaults \\\n-m size=2048M");
    }
}
