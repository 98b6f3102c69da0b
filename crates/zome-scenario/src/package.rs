//! Application package descriptors.
//!
//! A package names the zomes an application instance exposes. Each zome is
//! exposed as a capability under its `name` and implemented by whatever the
//! [`ZomeRegistry`](crate::application::ZomeRegistry) registers for its
//! `kind`. Descriptors are JSON documents, conventionally `*.dna.json`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::ConfigurationError;

/// One zome in a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZomeDescriptor {
    /// Capability name callers use (e.g. "main").
    pub name: String,

    /// Registered implementation kind (e.g. "matchmaking").
    pub kind: String,
}

/// A loadable application package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    pub zomes: Vec<ZomeDescriptor>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

impl PackageDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            zomes: Vec::new(),
        }
    }

    /// Add a zome to the package.
    pub fn with_zome(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.zomes.push(ZomeDescriptor {
            name: name.into(),
            kind: kind.into(),
        });
        self
    }

    /// The game-matchmaking package: one `main` capability backed by the
    /// built-in matchmaking zome.
    pub fn game_matchmaking() -> Self {
        Self::new("game-matchmaking").with_zome("main", crate::zomes::matchmaking::KIND)
    }

    /// Load and validate a descriptor from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.is_file() {
            return Err(ConfigurationError::PackageNotFound {
                path: path.to_path_buf(),
            });
        }
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let descriptor: PackageDescriptor =
            serde_json::from_str(&content).map_err(|e| ConfigurationError::InvalidPackage {
                package: path.display().to_string(),
                reason: e.to_string(),
            })?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check structural invariants: a name, at least one zome, unique zome names.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidPackage {
            package: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("package name must not be empty".to_string()));
        }
        if self.zomes.is_empty() {
            return Err(invalid("package defines no zomes".to_string()));
        }
        let mut seen = HashSet::new();
        for zome in &self.zomes {
            if zome.name.trim().is_empty() {
                return Err(invalid("zome name must not be empty".to_string()));
            }
            if !seen.insert(zome.name.as_str()) {
                return Err(invalid(format!("duplicate zome name: {}", zome.name)));
            }
        }
        Ok(())
    }
}
