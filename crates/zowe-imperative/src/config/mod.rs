//! Team configuration: layered config files, profile schemas, the secure
//! vault and automatic storage of prompted values

pub mod auto_store;
pub mod imperative;
pub mod profile;
pub mod schema;
pub mod store;
pub mod vault;

pub use auto_store::{AuthHandler, AutoStore, ConfigAutoStore};
pub use imperative::ImperativeConfig;
pub use profile::{ConfigDoc, Profile, profile_name_from_path, profile_path_from_name};
pub use schema::{LoadedConfig, ProfileSchema, PropertySchema, PropertyType};
pub use store::{Config, ConfigLayer, SECURE_CONFIG_KEY, SecureInfo};
#[cfg(feature = "keyring")]
pub use vault::KeyringVault;
pub use vault::{CredentialVault, MemoryVault, load_json};
