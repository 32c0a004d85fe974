//! Registry of secure property names and log censoring

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Session properties that are always secure
pub const DEFAULT_SECURE_PROPS: [&str; 4] = ["user", "password", "tokenValue", "passphrase"];

/// Additional names that are always censored in log output
const ALWAYS_CENSORED: [&str; 2] = ["base64EncodedAuth", "keyPassphrase"];

/// Process-scoped set of property names whose values must be masked.
///
/// Names are only ever added. Clones share the same set.
#[derive(Debug, Clone)]
pub struct SecurePropRegistry {
    names: Arc<RwLock<BTreeSet<String>>>,
}

impl Default for SecurePropRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurePropRegistry {
    /// Create a registry seeded with the default secure properties
    pub fn new() -> Self {
        let names = DEFAULT_SECURE_PROPS.iter().map(|s| s.to_string()).collect();
        Self {
            names: Arc::new(RwLock::new(names)),
        }
    }

    /// Record a secure property name
    pub fn add(&self, name: impl Into<String>) {
        self.names.write().insert(name.into());
    }

    /// Whether a name is secure
    pub fn has(&self, name: &str) -> bool {
        self.names.read().contains(name)
    }

    /// Snapshot of all known names
    pub fn names(&self) -> Vec<String> {
        self.names.read().iter().cloned().collect()
    }

    /// Whether a value for this name must be hidden in log output
    pub fn is_censored(&self, name: &str) -> bool {
        ALWAYS_CENSORED.contains(&name) || self.has(name)
    }

    /// Replace every secure value in a JSON object with `<name>_is_hidden`
    pub fn censor(&self, value: &Value) -> Value {
        let mut censored = value.clone();
        if let Value::Object(map) = &mut censored {
            for (name, v) in map.iter_mut() {
                if !v.is_null() && self.is_censored(name) {
                    *v = Value::String(format!("{}_is_hidden", name));
                }
            }
        }
        censored
    }
}
