use std::{collections::HashMap, io::ErrorKind, path::Path, sync::Arc};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AppIdentity, IconRef, IdentityResolver, ResolveError};

/// Registry entry of an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntity {
    pub label: Arc<str>,
    #[serde(default)]
    pub icon: Option<IconRef>,
    #[serde(default)]
    pub system: bool,
}

/// Package registry backed by a JSON object of `package name -> entry`.
#[derive(Debug, Default)]
pub struct JsonPackageRegistry {
    packages: HashMap<Arc<str>, PackageEntity>,
}

impl JsonPackageRegistry {
    pub fn new(packages: HashMap<Arc<str>, PackageEntity>) -> Self {
        Self { packages }
    }

    /// Loads the registry. A missing file means nothing is installed, so every lookup will
    /// report [ResolveError::NotFound].
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Package registry {path:?} doesn't exist, treating every package as uninstalled");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read registry {path:?}")),
        };
        let packages = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse registry {path:?}"))?;
        Ok(Self::new(packages))
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl IdentityResolver for JsonPackageRegistry {
    fn resolve(&self, package_name: &str) -> Result<AppIdentity, ResolveError> {
        match self.packages.get(package_name) {
            Some(entity) => Ok(AppIdentity {
                name: entity.label.clone(),
                icon: entity.icon.clone(),
                is_system: entity.system,
            }),
            None => {
                debug!("Package {package_name} isn't installed");
                Err(ResolveError::NotFound(package_name.into()))
            }
        }
    }
}
