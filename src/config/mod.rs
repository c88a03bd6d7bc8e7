use dashmap::DashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

/// Property store backed by process environment variables.
///
/// Every `ApplicationContext` registers one as a bean, so components can declare
/// `Arc<Environment>` fields to read settings.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    properties: Arc<DashMap<String, String>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every process environment variable.
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Load environment variables starting with `prefix`, keyed without it.
    ///
    /// `from_env_prefixed("APP_")` exposes `APP_PORT` as `PORT`.
    pub fn from_env_prefixed(prefix: &str) -> Self {
        Self::from_vars(env::vars().filter_map(|(key, value)| {
            key.strip_prefix(prefix)
                .filter(|stripped| !stripped.is_empty())
                .map(|stripped| (stripped.to_string(), value))
        }))
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let environment = Self::default();
        for (key, value) in vars {
            environment.properties.insert(key.into(), value.into());
        }
        environment
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.properties.get(key).map(|v| v.clone())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a property, `None` when it is absent or does not parse.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.properties.get(key).and_then(|v| v.parse().ok())
    }

    /// Split a comma separated property into trimmed, non-empty items.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.properties.insert(key.to_string(), value.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
