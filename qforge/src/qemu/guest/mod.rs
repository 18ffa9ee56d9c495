//! Guest-visible settings that are not devices.

mod clock;
mod processor;
mod spice;

pub use clock::{Clock, ClockBase, ClockIsolation, DriftFix};
pub use processor::Processor;
pub use spice::Spice;

use uuid::Uuid;

use super::globals::Globals;
use super::option::{Options, Parameters};
use crate::constants::qemu::MACHINE_TYPE;
use crate::qemu::host::NodeName;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub id: Option<Uuid>,
}

impl Identity {
    pub fn options(&self) -> Options {
        let mut opts = Options::new();
        if let Some(id) = self.id.filter(|id| !id.is_nil()) {
            let mut params = Parameters::new();
            params.add("", id);
            opts.add("uuid", params);
        }
        if !self.name.is_empty() {
            let mut params = Parameters::new();
            params.add("", &self.name);
            opts.add("name", params);
        }
        opts
    }
}

/// UEFI code and variable store, referenced by block node name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Firmware {
    pub code: Option<NodeName>,
    pub vars: Option<NodeName>,
}

impl Firmware {
    /// `pflash1` is only meaningful alongside `pflash0`.
    pub fn machine_parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        if let Some(code) = &self.code {
            params.add("pflash0", code).add_opt("pflash1", self.vars.as_ref());
        }
        params
    }
}

/// Guest RAM in mebibytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Memory {
    pub mebibytes: u32,
}

impl Memory {
    pub fn options(&self) -> Options {
        let mut opts = Options::new();
        if self.mebibytes > 0 {
            let mut params = Parameters::new();
            params.add("size", format!("{}M", self.mebibytes));
            opts.add("m", params);
        }
        opts
    }
}

/// A QMP monitor bound to a character device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub chardev: String,
    pub pretty: bool,
}

impl Monitor {
    pub fn new(chardev: impl Into<String>) -> Self {
        Self {
            chardev: chardev.into(),
            pretty: false,
        }
    }

    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.add("chardev", &self.chardev).add("mode", "control");
        if self.pretty {
            params.add_flag("pretty");
        }
        params
    }
}

/// Every non-device property of a guest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub identity: Identity,
    pub firmware: Firmware,
    pub clock: Clock,
    pub processor: Processor,
    pub memory: Memory,
    pub monitors: Vec<Monitor>,
    pub spice: Spice,
    pub globals: Globals,
}

impl Settings {
    /// Identity comes first; QEMU expects it ahead of the accelerator flags.
    pub fn options(&self) -> Options {
        let mut opts = self.identity.options();
        opts.add_bare("enable-kvm");
        opts.add_bare("nodefaults");
        opts.add_bare("nographic");

        let mut machine = Parameters::new();
        machine
            .add("type", MACHINE_TYPE)
            .extend(self.spice.machine_parameters())
            .extend(self.firmware.machine_parameters());
        opts.add("machine", machine);

        opts.add("cpu", self.processor.cpu());
        let smp = self.processor.smp();
        if !smp.is_empty() {
            opts.add("smp", smp);
        }
        opts.append(self.memory.options());
        let rtc = self.clock.parameters();
        if !rtc.is_empty() {
            opts.add("rtc", rtc);
        }
        for monitor in &self.monitors {
            opts.add("mon", monitor.parameters());
        }
        if self.spice.enabled {
            opts.add("spice", self.spice.parameters());
        }
        opts.append(self.globals.options());

        let mut boot = Parameters::new();
        boot.add("menu", "on").add("reboot-timeout", 5000);
        opts.add("boot", boot);
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qemu::globals::Global;

    fn kinds(opts: &Options) -> Vec<String> {
        opts.iter().map(|o| o.args()[0].clone()).collect()
    }

    #[test]
    fn test_minimal_settings() {
        let opts = Settings::default().options();
        assert_eq!(
            kinds(&opts),
            vec!["-enable-kvm", "-nodefaults", "-nographic", "-machine", "-cpu", "-boot"]
        );
        assert_eq!(opts.to_string(), "-enable-kvm -nodefaults -nographic -machine type=q35 -cpu host -boot menu=on,reboot-timeout=5000");
    }

    #[test]
    fn test_full_settings_order() {
        let mut settings = Settings {
            identity: Identity {
                name: "alpha".into(),
                id: Some(Uuid::from_u128(0x1234)),
            },
            firmware: Firmware {
                code: Some("alpha-fw-code".into()),
                vars: Some("alpha-fw-vars".into()),
            },
            clock: Clock {
                base: Some(ClockBase::Utc),
                ..Default::default()
            },
            processor: Processor {
                sockets: 1,
                ..Default::default()
            },
            memory: Memory { mebibytes: 512 },
            monitors: vec![Monitor::new("qmp.0")],
            spice: Spice {
                enabled: true,
                port: 5900,
                addr: "127.0.0.1".into(),
                disable_ticketing: true,
                ..Default::default()
            },
            globals: Globals::default(),
        };
        settings.globals.add(Global::new("cfi.pflash01", "secure", "on"));

        let opts = settings.options();
        assert_eq!(
            kinds(&opts),
            vec![
                "-uuid", "-name", "-enable-kvm", "-nodefaults", "-nographic", "-machine", "-cpu", "-smp", "-m",
                "-rtc", "-mon", "-spice", "-global", "-boot",
            ]
        );
        let rendered: Vec<String> = opts.iter().map(ToString::to_string).collect();
        assert_eq!(rendered[0], "-uuid 00000000-0000-0000-0000-000000001234");
        assert_eq!(
            rendered[5],
            "-machine type=q35,vmport=off,pflash0=alpha-fw-code,pflash1=alpha-fw-vars"
        );
        assert_eq!(rendered[8], "-m size=512M");
        assert_eq!(rendered[10], "-mon chardev=qmp.0,mode=control");
        assert_eq!(rendered[11], "-spice port=5900,addr=127.0.0.1,disable-ticketing=on");
    }

    #[test]
    fn test_vars_without_code_ignored() {
        let fw = Firmware {
            code: None,
            vars: Some("v".into()),
        };
        assert!(fw.machine_parameters().is_empty());
    }
}
