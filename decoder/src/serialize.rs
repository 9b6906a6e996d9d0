//! Serde helpers for values whose `Serialize` impl is not human readable.
//!
//! `Pubkey`, `Signature` and `BigUint` all serialize as raw bytes or digit
//! vectors by default; analysis output renders them through `Display`.

use std::fmt::Display;

use serde::Serializer;

pub(crate) fn display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

pub(crate) fn option_display<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}
