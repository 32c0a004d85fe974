//! Layered team configuration store
//!
//! Four layers in precedence order: project user, project, global user,
//! global. Reads merge the layers (higher precedence wins); writes go to
//! the active layer.

use super::profile::{ConfigDoc, Profile, profile_name_from_path, profile_path_from_name};
use super::vault::{CredentialVault, load_json};
use crate::error::{ImperativeError, ImperativeResult};
use crate::session::CommandArguments;
use crate::settings::ImperativeSettings;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Vault key holding the secure values of every layer
pub const SECURE_CONFIG_KEY: &str = "secure_config_props";

/// One config file
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    pub path: PathBuf,
    pub user: bool,
    pub global: bool,
    pub exists: bool,
    pub properties: ConfigDoc,
}

impl ConfigLayer {
    fn empty(path: PathBuf, user: bool, global: bool) -> Self {
        Self {
            path,
            user,
            global,
            exists: false,
            properties: ConfigDoc::default(),
        }
    }

    fn read(path: PathBuf, user: bool, global: bool) -> ImperativeResult<Self> {
        if !path.is_file() {
            return Ok(Self::empty(path, user, global));
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| ImperativeError::io_with_path(e.to_string(), path.display().to_string()))?;
        let properties: ConfigDoc = if text.trim().is_empty() {
            ConfigDoc::default()
        } else {
            serde_json::from_str(&text).map_err(|e| {
                ImperativeError::config_with_context(
                    format!("Unable to parse {}: {}", path.display(), e),
                    "loading team configuration",
                )
            })?
        };
        debug!("Loaded config layer {}", path.display());
        Ok(Self {
            path,
            user,
            global,
            exists: true,
            properties,
        })
    }

    /// Path shown to users
    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

/// Secure marker found for a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureInfo {
    /// Path of the profile whose `secure` array lists the property,
    /// followed by `.properties.<name>`
    pub path: String,
    /// Property name
    pub prop: String,
}

/// The layered team configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    layers: Vec<ConfigLayer>,
    active: usize,
}

impl Config {
    /// Load every layer for the given project directory and settings.
    ///
    /// The project directory is found by walking up from `start_dir` to the
    /// first directory holding a project config file.
    pub fn load(settings: &ImperativeSettings, start_dir: &Path) -> ImperativeResult<Self> {
        let project_name = settings.config_file_name();
        let project_user_name = settings.user_config_file_name();

        let project_dir = start_dir
            .ancestors()
            .find(|dir| dir.join(&project_name).is_file() || dir.join(&project_user_name).is_file())
            .unwrap_or(start_dir)
            .to_path_buf();

        let layers = vec![
            ConfigLayer::read(project_dir.join(&project_user_name), true, false)?,
            ConfigLayer::read(project_dir.join(&project_name), false, false)?,
            ConfigLayer::read(settings.cli_home.join(&project_user_name), true, true)?,
            ConfigLayer::read(settings.cli_home.join(&project_name), false, true)?,
        ];
        Self::from_layers(layers)
    }

    /// Build a config from explicit layers (precedence order).
    ///
    /// The project layer is active, or the first layer if there are fewer.
    /// At least one layer is required.
    pub fn from_layers(layers: Vec<ConfigLayer>) -> ImperativeResult<Self> {
        if layers.is_empty() {
            return Err(ImperativeError::config("A config needs at least one layer"));
        }
        let active = layers
            .iter()
            .position(|l| !l.user && !l.global)
            .unwrap_or(0);
        Ok(Self { layers, active })
    }

    /// In-memory config with one existing project layer (useful for tests)
    pub fn in_memory(path: impl Into<PathBuf>, properties: ConfigDoc) -> Self {
        let layer = ConfigLayer {
            path: path.into(),
            user: false,
            global: false,
            exists: true,
            properties,
        };
        Self {
            layers: vec![layer],
            active: 0,
        }
    }

    /// Whether any layer exists on disk
    pub fn exists(&self) -> bool {
        self.layers.iter().any(|l| l.exists)
    }

    /// All layers in precedence order
    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    /// Make the layer matching the flags active
    pub fn activate(&mut self, user: bool, global: bool) {
        if let Some(idx) = self
            .layers
            .iter()
            .position(|l| l.user == user && l.global == global)
        {
            self.active = idx;
        }
    }

    /// The active layer
    pub fn active_layer(&self) -> &ConfigLayer {
        &self.layers[self.active]
    }

    /// `(user, global)` of the highest-precedence layer holding the profile
    pub fn find_layer(&self, profile_name: &str) -> Option<(bool, bool)> {
        self.layers
            .iter()
            .find(|l| l.properties.profile(profile_name).is_some())
            .map(|l| (l.user, l.global))
    }

    /// Merged properties of a profile and its parents.
    ///
    /// Nested profiles inherit their parents' properties; higher
    /// precedence layers win.
    pub fn get_profile(&self, profile_name: &str) -> Map<String, Value> {
        let mut merged = Map::new();
        for layer in self.layers.iter().rev() {
            for (_, profile) in layer.properties.profile_chain(profile_name) {
                for (k, v) in &profile.properties {
                    merged.insert(k.clone(), v.clone());
                }
            }
        }
        merged
    }

    /// Type of a profile, from the highest-precedence layer defining it
    pub fn profile_type(&self, profile_name: &str) -> Option<String> {
        self.layers
            .iter()
            .find_map(|l| l.properties.profile(profile_name)?.profile_type.clone())
    }

    /// Whether a profile exists in any layer
    pub fn profile_exists(&self, profile_name: &str) -> bool {
        self.layers
            .iter()
            .any(|l| l.properties.profile(profile_name).is_some())
    }

    /// `lpar1.zosmf` -> `profiles.lpar1.profiles.zosmf`
    pub fn profile_path_from_name(&self, profile_name: &str) -> String {
        profile_path_from_name(profile_name)
    }

    /// Names listed as secure for a profile or any of its parents, in any layer
    pub fn secure_props_for_profile(&self, profile_name: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for layer in &self.layers {
            for (_, profile) in layer.properties.profile_chain(profile_name) {
                for name in &profile.secure {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
        }
        names
    }

    /// Find where a property is marked secure.
    ///
    /// `prop_path` looks like `profiles.a.profiles.b.properties.password`.
    /// With `find_up`, parent profiles are searched too and the outermost
    /// match wins.
    pub fn secure_info_for_prop(&self, prop_path: &str, find_up: bool) -> Option<SecureInfo> {
        let (profile_path, prop) = prop_path.rsplit_once(".properties.")?;
        let profile_name = profile_name_from_path(profile_path);

        for layer in &self.layers {
            let chain = layer.properties.profile_chain(&profile_name);
            let candidates: Vec<&(String, &Profile)> = if find_up {
                chain.iter().collect()
            } else {
                chain.iter().filter(|(name, _)| *name == profile_name).collect()
            };
            if let Some((name, _)) = candidates
                .into_iter()
                .find(|(_, profile)| profile.secure.iter().any(|s| s == prop))
            {
                return Some(SecureInfo {
                    path: format!("{}.properties.{}", profile_path_from_name(name), prop),
                    prop: prop.to_string(),
                });
            }
        }
        None
    }

    /// Whether prompted values may be stored (default true)
    pub fn auto_store(&self) -> bool {
        self.layers
            .iter()
            .find_map(|l| l.properties.auto_store)
            .unwrap_or(true)
    }

    /// Name of the profile of a type to use for a command.
    ///
    /// Looks at the `<type>-profile` / `<type>Profile` argument, then the
    /// `defaults` of the layers, then `default_name`, then the type itself.
    pub fn active_profile_name(
        &self,
        profile_type: &str,
        args: Option<&CommandArguments>,
        default_name: Option<&str>,
    ) -> String {
        if let Some(args) = args {
            for key in [format!("{}-profile", profile_type), format!("{}Profile", profile_type)] {
                if let Some(name) = args.get_str(&key).filter(|n| !n.is_empty()) {
                    return name;
                }
            }
        }
        self.layers
            .iter()
            .find_map(|l| l.properties.defaults.get(profile_type).cloned())
            .or_else(|| default_name.map(str::to_string))
            .unwrap_or_else(|| profile_type.to_string())
    }

    /// Set a value in the active layer.
    ///
    /// A secure property is added to the `secure` array of the profile
    /// holding it.
    pub fn set(&mut self, path: &str, value: Value, secure: bool) -> ImperativeResult<()> {
        let layer = &mut self.layers[self.active];
        let mut doc = serde_json::to_value(&layer.properties)?;

        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ImperativeError::invalid_input_field(
                format!("Invalid config path '{}'", path),
                "path",
            ));
        }
        set_json_path(&mut doc, &segments, value)?;

        layer.properties = serde_json::from_value(doc).map_err(|e| {
            ImperativeError::config(format!("Setting '{}' produced an invalid config: {}", path, e))
        })?;

        if let Some((profile_path, prop)) = path.rsplit_once(".properties.") {
            let name = profile_name_from_path(profile_path);
            if let Some(profile) = profile_mut(&mut layer.properties, &name) {
                let listed = profile.secure.iter().any(|s| s == prop);
                if secure && !listed {
                    profile.secure.push(prop.to_string());
                }
            }
        }
        Ok(())
    }

    /// Write the active layer to disk, secure values to the vault
    pub async fn save(&mut self, vault: Option<&dyn CredentialVault>) -> ImperativeResult<()> {
        let layer = &self.layers[self.active];
        let plain = serde_json::to_string_pretty(&layer.properties.plaintext())?;
        if let Some(parent) = layer.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ImperativeError::io_with_path(e.to_string(), parent.display().to_string()))?;
        }
        fs::write(&layer.path, plain)
            .map_err(|e| ImperativeError::io_with_path(e.to_string(), layer.display_path()))?;
        self.layers[self.active].exists = true;

        let mut secure: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
        for layer in &self.layers {
            let values = layer.properties.secure_values();
            if !values.is_empty() {
                secure.insert(layer.display_path(), values);
            }
        }

        match vault {
            Some(vault) => {
                let text = serde_json::to_string(&secure)?;
                vault.save(SECURE_CONFIG_KEY, &text).await?;
            }
            None if !secure.is_empty() => {
                warn!("No credential vault is available. Secure properties were not saved.");
            }
            None => {}
        }
        Ok(())
    }

    /// Load secure values from the vault into the layers
    pub async fn load_secure(&mut self, vault: &dyn CredentialVault) -> ImperativeResult<()> {
        let Some(Value::Object(by_layer)) = load_json(vault, SECURE_CONFIG_KEY).await? else {
            return Ok(());
        };
        for layer in &mut self.layers {
            let Some(Value::Object(values)) = by_layer.get(&layer.display_path()) else {
                continue;
            };
            let mut doc = serde_json::to_value(&layer.properties)?;
            for (prop_path, value) in values {
                let segments: Vec<&str> = prop_path.split('.').collect();
                set_json_path(&mut doc, &segments, value.clone())?;
            }
            layer.properties = serde_json::from_value(doc)?;
        }
        Ok(())
    }

    /// Layers rendered as JSON with secure values replaced by `(secure value)`.
    ///
    /// A layer whose secure values cannot be hidden is left out.
    pub fn censored_layers(&self) -> Vec<(String, Value)> {
        self.layers
            .iter()
            .filter(|l| l.exists)
            .filter_map(|l| match censored_doc(&l.properties) {
                Ok(doc) => Some((l.display_path(), doc)),
                Err(e) => {
                    warn!("Not showing {}: unable to hide its secure values: {}", l.display_path(), e);
                    None
                }
            })
            .collect()
    }
}

fn censored_doc(properties: &ConfigDoc) -> ImperativeResult<Value> {
    let mut doc = serde_json::to_value(properties)?;
    for prop_path in properties.secure_values().keys() {
        let segments: Vec<&str> = prop_path.split('.').collect();
        set_json_path(&mut doc, &segments, Value::String("(secure value)".into()))?;
    }
    Ok(doc)
}

fn profile_mut<'a>(doc: &'a mut ConfigDoc, name: &str) -> Option<&'a mut Profile> {
    let mut segments = name.split('.');
    let mut current = doc.profiles.get_mut(segments.next()?)?;
    for segment in segments {
        current = current.profiles.get_mut(segment)?;
    }
    Some(current)
}

fn set_json_path(doc: &mut Value, segments: &[&str], value: Value) -> ImperativeResult<()> {
    let Some((last, parents)) = segments.split_last() else {
        return Err(ImperativeError::invalid_input("Empty config path"));
    };
    let mut current = doc;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = current
            .as_object_mut()
            .map(|obj| obj.entry(segment.to_string()).or_insert_with(|| Value::Object(Map::new())))
            .ok_or_else(|| ImperativeError::config(format!("'{}' is not an object", segment)))?;
    }
    match current.as_object_mut() {
        Some(obj) => {
            obj.insert(last.to_string(), value);
            Ok(())
        }
        None => Err(ImperativeError::config(format!(
            "Cannot set '{}' on a non-object value",
            last
        ))),
    }
}
