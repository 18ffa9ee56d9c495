use crate::qemu::option::Parameters;

/// SPICE remote display server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spice {
    pub enabled: bool,
    pub port: u16,
    pub addr: String,
    pub disable_ticketing: bool,
    pub disable_copy_paste: bool,
    pub disable_file_transfer: bool,
}

impl Spice {
    /// vmport emulation interferes with SPICE mouse input, so it is turned
    /// off whenever SPICE is on.
    pub fn machine_parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        if self.enabled {
            params.add("vmport", "off");
        }
        params
    }

    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        if self.port > 0 {
            params.add("port", self.port);
        }
        if !self.addr.is_empty() {
            params.add("addr", &self.addr);
        }
        params.add_on("disable-ticketing", self.disable_ticketing);
        if self.disable_copy_paste {
            params.add_flag("disable-copy-paste");
        }
        if self.disable_file_transfer {
            params.add_flag("disable-agent-file-xfer");
        }
        params
    }
}
