//! License lookup collaborator.
//!
//! A [`LicenseResolver`] maps a locked package to its license identifier.
//! The gate only compares that identifier against the banned list, so any
//! source of license data can be plugged in.

mod pub_dev;

pub use pub_dev::PubDevResolver;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves the license of a package version.
#[async_trait]
pub trait LicenseResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the license identifier, or `None` when it is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails (network, bad response).
    async fn resolve(&self, package: &str, version: &str) -> Result<Option<String>>;
}

/// Resolver backed by a fixed map. Unlisted packages are unknown.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    licenses: HashMap<String, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_license(mut self, package: impl Into<String>, license: impl Into<String>) -> Self {
        self.licenses.insert(package.into(), license.into());
        self
    }
}

#[async_trait]
impl LicenseResolver for StaticResolver {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn resolve(&self, package: &str, _version: &str) -> Result<Option<String>> {
        Ok(self.licenses.get(package).cloned())
    }
}
