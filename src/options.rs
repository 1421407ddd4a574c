//! Construction options
//!
//! Fields are constructed from an ordered map of keyword options. A recursive
//! field captures its options verbatim and hands them to whichever schema it
//! eventually resolves to, so every field type accepts the same [`Options`]
//! shape and checks the keywords it understands.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered keyword options used to construct a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(IndexMap<String, Value>);

impl Options {
    /// Create an empty option map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert or replace an option
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get a raw option value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Check whether an option was given
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of options
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no options were given
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over options in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Keep only the named options
    pub fn filtered(&self, keys: &[&str]) -> Options {
        self.0
            .iter()
            .filter(|(k, _)| keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Drop the named options
    pub fn without(&self, keys: &[&str]) -> Options {
        self.0
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Fail if any option is not in `accepted`
    pub fn ensure_only(&self, accepted: &[&str], owner: &str) -> Result<()> {
        match self.0.keys().find(|k| !accepted.contains(&k.as_str())) {
            Some(key) => Err(Error::Options(format!(
                "{} got an unexpected option '{}'",
                owner, key
            ))),
            None => Ok(()),
        }
    }

    /// Read a boolean option
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(type_error(key, "a boolean", other)),
        }
    }

    /// Read a non-negative integer option
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| type_error(key, "a non-negative integer", value)),
        }
    }

    /// Read a signed integer option
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| type_error(key, "an integer", value)),
        }
    }

    /// Read a string option
    pub fn get_str(&self, key: &str) -> Result<Option<String>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(type_error(key, "a string", other)),
        }
    }
}

fn type_error(key: &str, expected: &str, found: &Value) -> Error {
    Error::Options(format!(
        "option '{}' must be {}, got {}",
        key, expected, found
    ))
}

impl FromIterator<(String, Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Options(iter.into_iter().collect())
    }
}

impl From<serde_json::Map<String, Value>> for Options {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}
