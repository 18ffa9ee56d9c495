//! Character devices (`-chardev`).

use std::path::PathBuf;

use qforge_shared::errors::{QforgeError, QforgeResult};

use super::registry::{Named, Registry};
use crate::constants::limits::MAX_CHARDEV_ID;
use crate::qemu::option::{Options, Parameters};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharDevice {
    /// Unix domain socket.
    UnixSocket {
        id: String,
        path: PathBuf,
        server: bool,
        wait: bool,
    },
    /// TCP socket; always a non-blocking server with Nagle disabled.
    TcpSocket { id: String, host: String, port: u16 },
    /// SPICE channel such as `vdagent` or `usbredir`.
    SpiceChannel { id: String, channel: String },
    /// SPICE port exposed to the client under a well-known name.
    SpicePort { id: String, name: String },
}

impl CharDevice {
    /// Listening unix socket that does not wait for a client.
    pub fn unix_server(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        CharDevice::UnixSocket {
            id: id.into(),
            path: path.into(),
            server: true,
            wait: false,
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            CharDevice::UnixSocket { .. } | CharDevice::TcpSocket { .. } => "socket",
            CharDevice::SpiceChannel { .. } => "spicevmc",
            CharDevice::SpicePort { .. } => "spiceport",
        }
    }

    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.add("", self.backend()).add("id", self.name());
        match self {
            CharDevice::UnixSocket {
                path, server, wait, ..
            } => {
                params.add_on("server", *server);
                if *server && !*wait {
                    params.add("wait", "off");
                }
                params.add("path", path.display());
            }
            CharDevice::TcpSocket { host, port, .. } => {
                params
                    .add("host", host)
                    .add("port", port)
                    .add("server", "on")
                    .add("wait", "off")
                    .add("nodelay", "on");
            }
            CharDevice::SpiceChannel { channel, .. } => {
                params.add("debug", 0).add("name", channel);
            }
            CharDevice::SpicePort { name, .. } => {
                params.add("debug", 0).add("name", name);
            }
        }
        params
    }
}

impl Named for CharDevice {
    fn name(&self) -> &str {
        match self {
            CharDevice::UnixSocket { id, .. }
            | CharDevice::TcpSocket { id, .. }
            | CharDevice::SpiceChannel { id, .. }
            | CharDevice::SpicePort { id, .. } => id,
        }
    }
}

/// Registry of the character devices of one machine.
#[derive(Debug, Clone)]
pub struct CharDevices(Registry<CharDevice>);

impl Default for CharDevices {
    fn default() -> Self {
        Self(Registry::new("character device registry"))
    }
}

impl CharDevices {
    pub fn add(&mut self, dev: CharDevice) -> QforgeResult<String> {
        let id = dev.name();
        if id.len() > MAX_CHARDEV_ID {
            return Err(QforgeError::InvalidArgument(format!(
                "character device id \"{id}\" exceeds {MAX_CHARDEV_ID} characters"
            )));
        }
        let id = id.to_string();
        self.0.add(dev)?;
        tracing::trace!(chardev = %id, "Added character device");
        Ok(id)
    }

    pub fn find(&self, id: &str) -> Option<&CharDevice> {
        self.0.find(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn options(&self) -> Options {
        let mut opts = Options::new();
        for dev in self.0.iter() {
            opts.add("chardev", dev.parameters());
        }
        opts
    }
}
