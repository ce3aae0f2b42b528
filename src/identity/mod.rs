//! Resolves package identifiers into something a person can recognise.
//! Packages might be uninstalled after they were used, so [ResolveError::NotFound] is an expected
//! outcome rather than a failure.

pub mod registry;

use std::{fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque reference to an app icon. Turning it into pixels is up to whoever renders the list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconRef(Arc<str>);

impl IconRef {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IconRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    /// Label shown to the user. For example 'Chrome'
    pub name: Arc<str>,
    pub icon: Option<IconRef>,
    /// Whether the package ships with the system image.
    pub is_system: bool,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("package {0} is not installed")]
    NotFound(Arc<str>),
    #[error("failed to resolve package {package}: {reason}")]
    Unexpected { package: Arc<str>, reason: String },
}

#[cfg_attr(test, mockall::automock)]
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, package_name: &str) -> Result<AppIdentity, ResolveError>;
}
