use crate::qemu::option::Parameters;

/// Whether the guest's real time clock follows UTC or local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockBase {
    Utc,
    Local,
}

/// Which clock the guest's real time clock is driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockIsolation {
    Host,
    Realtime,
    Vm,
}

/// What to do when the guest misses timer interrupts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftFix {
    None,
    /// Replay missed ticks faster until the guest catches up.
    Slew,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clock {
    pub base: Option<ClockBase>,
    pub isolation: Option<ClockIsolation>,
    pub drift_fix: Option<DriftFix>,
}

impl Clock {
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params
            .add_opt(
                "base",
                self.base.map(|b| match b {
                    ClockBase::Utc => "utc",
                    ClockBase::Local => "localtime",
                }),
            )
            .add_opt(
                "clock",
                self.isolation.map(|i| match i {
                    ClockIsolation::Host => "host",
                    ClockIsolation::Realtime => "rt",
                    ClockIsolation::Vm => "vm",
                }),
            )
            .add_opt(
                "driftfix",
                self.drift_fix.map(|d| match d {
                    DriftFix::None => "none",
                    DriftFix::Slew => "slew",
                }),
            );
        params
    }
}
