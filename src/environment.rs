use std::{collections::BTreeMap, env};

/// Access to a host environment: read all, read a subset, write one key
///
/// The loaders never touch `std::env` directly; they go through this trait so
/// that tests and embedders can swap in [`MemoryEnv`].
pub trait EnvStore {
    /// Read a single variable
    fn get(&self, key: &str) -> Option<String>;

    /// Snapshot of every variable
    fn get_all(&self) -> BTreeMap<String, String>;

    /// Only the listed keys that are present; missing keys are omitted
    fn get_subset(&self, keys: &[String]) -> BTreeMap<String, String> {
        keys.iter()
            .filter_map(|key| self.get(key).map(|value| (key.clone(), value)))
            .collect()
    }

    /// Write (or overwrite) a variable
    fn set(&mut self, key: &str, value: &str);
}

/// The real process environment
///
/// Writes mutate process-wide state without any locking.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvStore for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn get_all(&self) -> BTreeMap<String, String> {
        // vars() panics on non-unicode entries, skip those instead
        env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    fn set(&mut self, key: &str, value: &str) {
        env::set_var(key, value);
    }
}

/// An in-memory environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryEnv {
    vars: BTreeMap<String, String>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvStore for MemoryEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn get_all(&self) -> BTreeMap<String, String> {
        self.vars.clone()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }
}
