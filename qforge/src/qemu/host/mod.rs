//! Host-side resources a guest's devices are wired to.
//!
//! Options are emitted in a fixed order: I/O threads, block nodes,
//! character devices, TPM backends, network backends.

pub mod blockdev;
pub mod chardev;
pub mod registry;
pub mod tpmdev;

use std::fmt;

use qforge_shared::errors::{QforgeError, QforgeResult};

use super::option::{Options, Parameters};
use crate::constants::qemu::NO_SCRIPT;

pub use blockdev::{BlockGraph, BlockNode, NodeName};
pub use chardev::{CharDevice, CharDevices};
pub use tpmdev::{TpmDevice, TpmDevices};

/// An `iothread` object, identified positionally as `iothread.N`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IoThread(String);

impl IoThread {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IoThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tap network backend, identified positionally as `net.N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTap {
    pub id: String,
    /// Host interface name.
    pub ifname: String,
    pub up_script: String,
    pub down_script: String,
}

impl NetworkTap {
    pub fn parameters(&self) -> Parameters {
        let script = |s: &str| if s.is_empty() { NO_SCRIPT.to_string() } else { s.to_string() };
        let mut params = Parameters::new();
        params
            .add("", "tap")
            .add("id", &self.id)
            .add("ifname", &self.ifname)
            .add("script", script(&self.up_script))
            .add("downscript", script(&self.down_script));
        params
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resources {
    iothreads: Vec<IoThread>,
    pub blockdevs: BlockGraph,
    pub chardevs: CharDevices,
    pub tpmdevs: TpmDevices,
    netdevs: Vec<NetworkTap>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_iothread(&mut self) -> IoThread {
        let thread = IoThread(format!("iothread.{}", self.iothreads.len()));
        self.iothreads.push(thread.clone());
        tracing::trace!(iothread = %thread, "Added I/O thread");
        thread
    }

    /// Most recently added I/O thread.
    pub fn last_iothread(&self) -> Option<&IoThread> {
        self.iothreads.last()
    }

    /// Reuse the most recent I/O thread, adding one if there is none.
    pub fn shared_iothread(&mut self) -> IoThread {
        match self.iothreads.last() {
            Some(thread) => thread.clone(),
            None => self.add_iothread(),
        }
    }

    pub fn iothreads(&self) -> &[IoThread] {
        &self.iothreads
    }

    pub fn add_netdev_tap(
        &mut self,
        ifname: impl Into<String>,
        up_script: impl Into<String>,
        down_script: impl Into<String>,
    ) -> &NetworkTap {
        let tap = NetworkTap {
            id: format!("net.{}", self.netdevs.len()),
            ifname: ifname.into(),
            up_script: up_script.into(),
            down_script: down_script.into(),
        };
        tracing::trace!(netdev = %tap.id, ifname = %tap.ifname, "Added network tap");
        self.netdevs.push(tap);
        let last = self.netdevs.len() - 1;
        &self.netdevs[last]
    }

    pub fn netdevs(&self) -> &[NetworkTap] {
        &self.netdevs
    }

    /// Bind an emulated TPM to an existing character device.
    pub fn add_emulated_tpm(&mut self, id: impl Into<String>, chardev: &str) -> QforgeResult<String> {
        let id = id.into();
        if self.chardevs.find(chardev).is_none() {
            return Err(QforgeError::UnresolvedReference {
                kind: "character device",
                referencer: format!("TPM device {id}"),
                reference: chardev.to_string(),
            });
        }
        self.tpmdevs.add(TpmDevice::Emulated {
            id,
            chardev: chardev.to_string(),
        })
    }

    pub fn options(&self) -> Options {
        let mut opts = Options::new();
        for thread in &self.iothreads {
            let mut params = Parameters::new();
            params.add("", "iothread").add("id", thread);
            opts.add("object", params);
        }
        opts.append(self.blockdevs.options());
        opts.append(self.chardevs.options());
        opts.append(self.tpmdevs.options());
        for tap in &self.netdevs {
            opts.add("netdev", tap.parameters());
        }
        opts
    }
}
