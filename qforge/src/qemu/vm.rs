use super::device::Topology;
use super::guest::Settings;
use super::host::Resources;
use super::option::Options;

/// A fully compiled virtual machine.
#[derive(Debug, Clone, Default)]
pub struct VmDefinition {
    pub settings: Settings,
    pub resources: Resources,
    pub topology: Topology,
}

impl VmDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings, then host resources, then devices.
    pub fn options(&self) -> Options {
        let mut opts = self.settings.options();
        opts.append(self.resources.options());
        opts.append(self.topology.options());
        opts
    }
}
