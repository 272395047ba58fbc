//! Parsing helpers for flat `key -> value` option lists.
//!
//! Experiment drivers select metrics and algorithms by name plus a flat option
//! map. These helpers pull typed values out of such a map and turn malformed
//! values and unknown keys into configuration errors.

use std::collections::HashMap;

use crate::{Error, Result};

/// A flat `key -> value` option list, as supplied by an experiment driver.
pub type Options = HashMap<String, String>;

/// Parses the value under `key`, if present.
pub fn get_parsed<T>(options: &Options, key: &'static str) -> Result<Option<T>>
where
    T: core::str::FromStr,
{
    options.get(key).map_or(Ok(None), |raw| {
        raw.parse::<T>().map(Some).map_err(|_| Error::InvalidParameter {
            name: key,
            message: format!("could not parse {raw:?}"),
        })
    })
}

/// Rejects any option key that is not in `allowed`.
///
/// Leftover keys are reported in sorted order so the error message is
/// deterministic.
pub fn reject_unknown(options: &Options, allowed: &[&str], target: &'static str) -> Result<()> {
    let mut unknown = options.keys().filter(|k| !allowed.contains(&k.as_str())).collect::<Vec<_>>();
    unknown.sort();
    unknown.first().map_or(Ok(()), |key| {
        Err(Error::UnknownOption {
            key: (*key).clone(),
            target,
        })
    })
}
