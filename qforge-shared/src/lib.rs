//! Types shared by the qforge crates.

pub mod errors;

pub use errors::{QforgeError, QforgeResult};
