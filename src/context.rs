//! Shared key/value context that agents read from and publish into.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Text values published by agents, keyed by output key.
///
/// Lookup is by name only. Writing an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: BTreeMap<String, String>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value published under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Check whether `key` has been published.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Publish `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Apply a list of writes in order.
    pub fn apply<I>(&mut self, writes: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in writes {
            self.values.insert(key, value);
        }
    }

    /// Iterate over keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for Context {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut ctx = Context::new();
        ctx.apply(iter);
        ctx
    }
}
