//! Profile type schemas known to the application

use std::collections::BTreeMap;

/// Value type of a profile property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Number,
    Boolean,
}

/// Schema of one profile property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    pub prop_type: PropertyType,
    pub description: String,
    pub secure: bool,
}

impl PropertySchema {
    pub fn new(prop_type: PropertyType, description: &str) -> Self {
        Self {
            prop_type,
            description: description.to_string(),
            secure: false,
        }
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }
}

/// Schema of one profile type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSchema {
    pub profile_type: String,
    pub properties: BTreeMap<String, PropertySchema>,
}

impl ProfileSchema {
    /// Create an empty schema
    pub fn new(profile_type: impl Into<String>) -> Self {
        Self {
            profile_type: profile_type.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Add a property
    pub fn with_property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Whether every named property is defined
    pub fn defines_all<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        names.into_iter().all(|name| self.properties.contains_key(name))
    }

    /// Schema of a property
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }
}

/// Schemas of every profile type the application knows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedConfig {
    pub profiles: Vec<ProfileSchema>,
    pub base_profile: Option<ProfileSchema>,
}

impl LoadedConfig {
    /// Schema of a profile type
    pub fn schema_for(&self, profile_type: &str) -> Option<&ProfileSchema> {
        if profile_type == "base" {
            if let Some(base) = &self.base_profile {
                return Some(base);
            }
        }
        self.profiles.iter().find(|p| p.profile_type == profile_type)
    }

    /// Whether a property is numeric in the given profile type or the base profile
    pub fn is_numeric(&self, profile_type: Option<&str>, prop_name: &str) -> bool {
        profile_type
            .and_then(|t| self.schema_for(t))
            .into_iter()
            .chain(self.base_profile.iter())
            .find_map(|schema| schema.property(prop_name))
            .is_some_and(|p| p.prop_type == PropertyType::Number)
    }

    /// Whether a property is declared secure in the given profile type or the base profile
    pub fn is_secure(&self, profile_type: Option<&str>, prop_name: &str) -> bool {
        profile_type
            .and_then(|t| self.schema_for(t))
            .into_iter()
            .chain(self.base_profile.iter())
            .find_map(|schema| schema.property(prop_name))
            .is_some_and(|p| p.secure)
    }

    /// Schemas for base, z/OSMF and SSH profiles
    pub fn zowe_defaults() -> Self {
        use PropertyType::*;

        let base = ProfileSchema::new("base")
            .with_property("host", PropertySchema::new(String, "Host name of service on the mainframe."))
            .with_property("port", PropertySchema::new(Number, "Port number of service on the mainframe."))
            .with_property("user", PropertySchema::new(String, "User name to authenticate to service on the mainframe.").secure())
            .with_property("password", PropertySchema::new(String, "Password to authenticate to service on the mainframe.").secure())
            .with_property("rejectUnauthorized", PropertySchema::new(Boolean, "Reject self-signed certificates."))
            .with_property("tokenType", PropertySchema::new(String, "The type of token to get and use for the API."))
            .with_property("tokenValue", PropertySchema::new(String, "The value of the token to pass to the API.").secure())
            .with_property("certFile", PropertySchema::new(String, "The file path to a certificate file to use for authentication."))
            .with_property("certKeyFile", PropertySchema::new(String, "The file path to a certificate key file to use for authentication."));

        let zosmf = ProfileSchema::new("zosmf")
            .with_property("host", PropertySchema::new(String, "The z/OSMF server host name."))
            .with_property("port", PropertySchema::new(Number, "The z/OSMF server port."))
            .with_property("user", PropertySchema::new(String, "Mainframe (z/OSMF) user name.").secure())
            .with_property("password", PropertySchema::new(String, "Mainframe (z/OSMF) password.").secure())
            .with_property("rejectUnauthorized", PropertySchema::new(Boolean, "Reject self-signed certificates."))
            .with_property("certFile", PropertySchema::new(String, "The file path to a certificate file to use for authentication."))
            .with_property("certKeyFile", PropertySchema::new(String, "The file path to a certificate key file to use for authentication."))
            .with_property("basePath", PropertySchema::new(String, "The base path for your API mediation layer instance."))
            .with_property("protocol", PropertySchema::new(String, "The protocol used (HTTP or HTTPS)."))
            .with_property("encoding", PropertySchema::new(String, "The encoding for download and upload of z/OS data set and USS files."))
            .with_property("responseTimeout", PropertySchema::new(Number, "The maximum amount of time in seconds the z/OSMF Files TSO servlet should run."));

        let ssh = ProfileSchema::new("ssh")
            .with_property("host", PropertySchema::new(String, "The z/OS SSH server host name."))
            .with_property("port", PropertySchema::new(Number, "The z/OS SSH server port."))
            .with_property("user", PropertySchema::new(String, "Mainframe user name.").secure())
            .with_property("password", PropertySchema::new(String, "Mainframe password.").secure())
            .with_property("privateKey", PropertySchema::new(String, "Path to a file containing your private key."))
            .with_property("keyPassphrase", PropertySchema::new(String, "Private key passphrase.").secure())
            .with_property("handshakeTimeout", PropertySchema::new(Number, "How long in milliseconds to wait for the SSH handshake."));

        Self {
            profiles: vec![base.clone(), zosmf, ssh],
            base_profile: Some(base),
        }
    }
}
