//! qforge: compiles declarative machine definitions into QEMU invocations.
//!
//! ## Architecture
//!
//! ```text
//! Machine + System
//!     │
//!     ├─ machine::Machine::resolve   tags merged, identities seeded
//!     │
//!     └─ compile::build              target context threaded through steps
//!            │
//!            ├─ qemu::guest::Settings      (-uuid, -machine, -cpu, -m, ...)
//!            ├─ qemu::host::Resources      (iothreads, blockdevs, chardevs, ...)
//!            └─ qemu::device::Topology     (root ports, controllers, endpoints)
//!                   │
//!                   └─ VmDefinition::options → ordered option list
//! ```
//!
//! Compilation is synchronous and performs no I/O. Loading records from disk
//! lives in [`loader`] and is kept apart from [`compile::build`].

pub mod compile;
pub mod constants;
pub mod identity;
pub mod loader;
pub mod machine;
pub mod options;
pub mod qemu;
pub mod summary;
pub mod system;

pub use compile::{build, build_with};
pub use machine::{Definition, Machine, MachineInfo};
pub use options::QforgeOptions;
pub use qemu::{Options, QemuOption, VmDefinition};
pub use qforge_shared::errors::{QforgeError, QforgeResult};
pub use system::System;
