use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::cache::Cache;

const PUB_DEV_API: &str = "https://pub.dev/api/packages";

/// `license:` tags that classify a license rather than name it.
const CLASSIFICATION_TAGS: [&str; 3] = ["osi-approved", "fsf-libre", "unknown"];

/// Looks licenses up from pub.dev package analysis.
///
/// pub.dev tags each package with `license:<spdx-id>` (lowercase) when it
/// scores it. The score endpoint describes the latest published version,
/// so an older locked version is judged by its successor's license.
pub struct PubDevResolver {
    client: reqwest::Client,
    cache: Cache,
    base_url: String,
}

#[derive(Deserialize)]
struct PackageScore {
    #[serde(default)]
    tags: Vec<String>,
}

impl PubDevResolver {
    pub fn new() -> Self {
        Self::with_cache(Cache::new())
    }

    pub fn with_cache(cache: Cache) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache,
            base_url: PUB_DEV_API.to_string(),
        }
    }

    /// Points the resolver at a pub.dev mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch(&self, package: &str) -> Result<Option<String>> {
        let url = format!("{}/{}/score", self.base_url, package);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to query {}", url))?;

        // SDK, git and path dependencies are not on pub.dev.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let score: PackageScore = response
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))?;

        Ok(license_from_tags(&score.tags))
    }
}

impl Default for PubDevResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::LicenseResolver for PubDevResolver {
    fn name(&self) -> &'static str {
        "pub.dev"
    }

    async fn resolve(&self, package: &str, _version: &str) -> Result<Option<String>> {
        let cache_key = format!("pub_license_{}", package);

        if let Some(license) = self.cache.get::<Option<String>>(&cache_key) {
            debug!("License for {} served from cache", package);
            return Ok(license);
        }

        let license = self.fetch(package).await?;

        // Cache the result
        let _ = self.cache.set(&cache_key, &license);

        Ok(license)
    }
}

/// Picks the SPDX identifier out of pub.dev package tags.
pub(crate) fn license_from_tags(tags: &[String]) -> Option<String> {
    tags.iter()
        .filter_map(|tag| tag.strip_prefix("license:"))
        .find(|id| !CLASSIFICATION_TAGS.contains(id))
        .map(str::to_string)
}
