use serde::{Deserialize, Serialize};

use super::SeverityLabel;

/// A vulnerability reported for a locked dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityFinding {
    pub package: String,
    pub version: String,
    pub vulnerability_id: String,
    pub severity: SeverityLabel,
    pub summary: String,
    pub details: String,
    pub references: Vec<String>,
}

/// A dependency whose resolved license is on the banned list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseFinding {
    pub package: String,
    pub version: String,
    pub license: String,
    pub reason: String,
}

impl LicenseFinding {
    pub fn banned(package: impl Into<String>, version: impl Into<String>, license: &str) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
            license: license.to_string(),
            reason: format!("License '{}' is banned", license),
        }
    }
}
