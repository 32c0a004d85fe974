//! Team config document model
//!
//! A layer file looks like:
//!
//! ```json
//! {
//!   "profiles": {
//!     "lpar1": {
//!       "properties": { "host": "lpar1.example.com" },
//!       "profiles": {
//!         "zosmf": { "type": "zosmf", "properties": { "port": 443 } }
//!       },
//!       "secure": ["user", "password"]
//!     }
//!   },
//!   "defaults": { "zosmf": "lpar1.zosmf" },
//!   "autoStore": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One profile, possibly holding nested profiles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secure: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, Profile>,
}

impl Profile {
    /// Create an empty profile of a type
    pub fn of_type(profile_type: impl Into<String>) -> Self {
        Self {
            profile_type: Some(profile_type.into()),
            ..Default::default()
        }
    }

    /// Builder-style property insert
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Builder-style secure marker
    pub fn with_secure(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.secure.contains(&name) {
            self.secure.push(name);
        }
        self
    }

    /// Builder-style nested profile
    pub fn with_profile(mut self, name: impl Into<String>, profile: Profile) -> Self {
        self.profiles.insert(name.into(), profile);
        self
    }

    /// Drop the values of secure properties, recursively
    fn strip_secure_values(&mut self) {
        for name in &self.secure {
            self.properties.remove(name);
        }
        for child in self.profiles.values_mut() {
            child.strip_secure_values();
        }
    }
}

/// Contents of one config layer file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDoc {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
    #[serde(rename = "autoStore", default, skip_serializing_if = "Option::is_none")]
    pub auto_store: Option<bool>,
}

impl ConfigDoc {
    /// Find a profile by dotted name (`lpar1.zosmf`)
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        let mut segments = name.split('.');
        let mut current = self.profiles.get(segments.next()?)?;
        for segment in segments {
            current = current.profiles.get(segment)?;
        }
        Some(current)
    }

    /// Profiles along a dotted name, outermost first
    pub fn profile_chain(&self, name: &str) -> Vec<(String, &Profile)> {
        let mut chain = Vec::new();
        let mut level = &self.profiles;
        let mut prefix = String::new();
        for segment in name.split('.') {
            let Some(profile) = level.get(segment) else {
                break;
            };
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            chain.push((prefix.clone(), profile));
            level = &profile.profiles;
        }
        chain
    }

    /// Document without the values of secure properties
    pub fn plaintext(&self) -> ConfigDoc {
        let mut doc = self.clone();
        for profile in doc.profiles.values_mut() {
            profile.strip_secure_values();
        }
        doc
    }

    /// Values of all secure properties keyed by property path
    pub fn secure_values(&self) -> BTreeMap<String, Value> {
        fn collect(prefix: &str, profiles: &BTreeMap<String, Profile>, out: &mut BTreeMap<String, Value>) {
            for (name, profile) in profiles {
                let path = format!("{}profiles.{}", prefix, name);
                for secure_name in &profile.secure {
                    if let Some(value) = profile.properties.get(secure_name) {
                        out.insert(format!("{}.properties.{}", path, secure_name), value.clone());
                    }
                }
                collect(&format!("{}.", path), &profile.profiles, out);
            }
        }
        let mut out = BTreeMap::new();
        collect("", &self.profiles, &mut out);
        out
    }
}

/// `lpar1.zosmf` -> `profiles.lpar1.profiles.zosmf`
pub fn profile_path_from_name(name: &str) -> String {
    name.split('.')
        .map(|segment| format!("profiles.{}", segment))
        .collect::<Vec<_>>()
        .join(".")
}

/// `profiles.lpar1.profiles.zosmf` -> `lpar1.zosmf`
pub fn profile_name_from_path(path: &str) -> String {
    path.split('.')
        .collect::<Vec<_>>()
        .chunks(2)
        .filter_map(|pair| match pair {
            ["profiles", name] => Some(*name),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ConfigDoc {
        serde_json::from_value(json!({
            "profiles": {
                "lpar1": {
                    "properties": {"host": "lpar1.example.com", "password": "pw1"},
                    "secure": ["password"],
                    "profiles": {
                        "zosmf": {"type": "zosmf", "properties": {"port": 443, "user": "alice"}, "secure": ["user"]}
                    }
                }
            },
            "defaults": {"zosmf": "lpar1.zosmf"},
            "autoStore": true
        }))
        .unwrap()
    }

    #[test]
    fn test_profile_lookup() {
        let doc = sample();
        let zosmf = doc.profile("lpar1.zosmf").unwrap();
        assert_eq!(zosmf.profile_type.as_deref(), Some("zosmf"));
        assert!(doc.profile("lpar1.tso").is_none());
        assert_eq!(doc.profile_chain("lpar1.zosmf").len(), 2);
    }

    #[test]
    fn test_path_conversion() {
        assert_eq!(profile_path_from_name("lpar1.zosmf"), "profiles.lpar1.profiles.zosmf");
        assert_eq!(profile_name_from_path("profiles.lpar1.profiles.zosmf"), "lpar1.zosmf");
    }

    #[test]
    fn test_plaintext_strips_secure_values() {
        let plain = sample().plaintext();
        let text = serde_json::to_string(&plain).unwrap();
        assert!(!text.contains("pw1"));
        assert!(!text.contains("alice"));
        assert!(text.contains("lpar1.example.com"));
        assert!(text.contains("\"secure\":[\"password\"]"));
    }

    #[test]
    fn test_secure_values() {
        let values = sample().secure_values();
        assert_eq!(values["profiles.lpar1.properties.password"], json!("pw1"));
        assert_eq!(values["profiles.lpar1.profiles.zosmf.properties.user"], json!("alice"));
        assert_eq!(values.len(), 2);
    }
}
