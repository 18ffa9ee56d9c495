//! Deterministic hardware identities.
//!
//! Every identity is derived from a machine's permanent id and name plus a
//! domain label and the entity's own name, so recompiling an unchanged
//! machine always yields the same addresses and renaming one entity never
//! disturbs another.

mod mac;
mod seed;
mod wwn;

pub use mac::MacAddr;
pub use seed::IdentitySeed;
pub use wwn::Wwn;

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// Deserialize an optional identity from its text form, reading an empty
/// string as absent so the seed can fill it later.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(text) if !text.is_empty() => text.parse().map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
