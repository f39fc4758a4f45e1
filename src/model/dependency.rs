use serde::{Deserialize, Serialize};
use std::fmt;

/// Where pub resolved a locked package from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencySource {
    Hosted,
    Sdk,
    Git,
    Path,
    #[serde(other)]
    Other,
}

impl DependencySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencySource::Hosted => "hosted",
            DependencySource::Sdk => "sdk",
            DependencySource::Git => "git",
            DependencySource::Path => "path",
            DependencySource::Other => "other",
        }
    }
}

impl fmt::Display for DependencySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `pubspec.lock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub source: DependencySource,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>, source: DependencySource) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            source,
        }
    }

    pub fn hosted(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(name, version, DependencySource::Hosted)
    }
}
