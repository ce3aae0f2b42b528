//! Turns raw usage records into the list of apps shown to the user.
//! [builder::UsageListBuilder] combines a [UsageSource](crate::usage::UsageSource) with an
//! [IdentityResolver](crate::identity::IdentityResolver). Every build produces a complete list;
//! previous lists are never patched.

pub mod builder;

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::{
    identity::{IconRef, ResolveError},
    usage::SourceError,
};

/// A used app as presented to the user. `name` and `icon` are absent when the package was
/// uninstalled after it was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub package_name: Arc<str>,
    pub name: Option<Arc<str>>,
    pub icon: Option<IconRef>,
    pub is_system: bool,
    pub last_time_used: NaiveDateTime,
    pub last_time_visible: NaiveDateTime,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Resolution(ResolveError),
    #[error("build was cancelled")]
    Cancelled,
    #[error("build worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
