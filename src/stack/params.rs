//! Stack parameter handling.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::ConfigError;

/// A single key/value parameter as submitted to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackParameter {
    /// Parameter name.
    pub key: String,
    /// Parameter value.
    pub value: String,
}

/// Mapping from parameter name to value.
///
/// Keys are kept sorted so the submitted sequence is the same on every run.
/// Keys and values are not validated here; the backend enforces its own rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, String>);

impl ParameterSet {
    /// Creates an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets a parameter, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Adds every parameter from `other`, overriding existing keys.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Parses a `KEY=VALUE` argument. The value may contain further `=` signs.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no `=` or the key is empty.
    pub fn parse_assignment(spec: &str) -> Result<(String, String), ConfigError> {
        match spec.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(ConfigError::InvalidParameter {
                spec: spec.to_string(),
            }),
        }
    }

    /// Builds a parameter set from `KEY=VALUE` arguments.
    ///
    /// # Errors
    ///
    /// Returns an error for the first malformed argument.
    pub fn from_assignments<I, S>(specs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        specs
            .into_iter()
            .map(|spec| Self::parse_assignment(spec.as_ref()))
            .collect()
    }

    /// Returns the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts to the backend representation, one pair per entry, ordered by key.
    #[must_use]
    pub fn to_stack_parameters(&self) -> Vec<StackParameter> {
        self.0
            .iter()
            .map(|(key, value)| StackParameter {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<HashMap<String, String>> for ParameterSet {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<BTreeMap<String, String>> for ParameterSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl fmt::Display for StackParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}
