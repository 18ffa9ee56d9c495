//! Global driver properties (`-global driver=..,property=..,value=..`).

use super::option::{Options, Parameters};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub driver: String,
    pub property: String,
    pub value: String,
}

impl Global {
    pub fn new(driver: impl Into<String>, property: impl Into<String>, value: impl ToString) -> Self {
        Self {
            driver: driver.into(),
            property: property.into(),
            value: value.to_string(),
        }
    }

    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params
            .add("driver", &self.driver)
            .add("property", &self.property)
            .add("value", &self.value);
        params
    }
}

/// Ordered set of globals. A driver/property pair is only recorded once;
/// the first value set wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Globals(Vec<Global>);

impl Globals {
    pub fn add(&mut self, global: Global) {
        let exists = self
            .0
            .iter()
            .any(|g| g.driver == global.driver && g.property == global.property);
        if exists {
            tracing::warn!(
                driver = %global.driver,
                property = %global.property,
                "Ignoring repeated global property"
            );
            return;
        }
        self.0.push(global);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Global> {
        self.0.iter()
    }

    pub fn options(&self) -> Options {
        let mut opts = Options::new();
        for global in &self.0 {
            opts.add("global", global.parameters());
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals_first_value_wins() {
        let mut globals = Globals::default();
        globals.add(Global::new("cfi.pflash01", "secure", "on"));
        globals.add(Global::new("cfi.pflash01", "secure", "off"));
        globals.add(Global::new("qxl-vga", "ram_size", 67108864));

        let rendered: Vec<String> = globals.options().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "-global driver=cfi.pflash01,property=secure,value=on",
                "-global driver=qxl-vga,property=ram_size,value=67108864",
            ]
        );
    }
}
