//! QEMU invocation model.
//!
//! - [`option`] - parameters and options as they appear on the command line
//! - [`host`] - host-side resources (iothreads, block graph, chardevs, ...)
//! - [`device`] - guest-visible device topology
//! - [`guest`] - guest settings that are not devices

pub mod device;
pub mod globals;
pub mod guest;
pub mod host;
pub mod option;
mod vm;

pub use globals::{Global, Globals};
pub use option::{Options, Parameter, Parameters, QemuOption};
pub use vm::VmDefinition;
