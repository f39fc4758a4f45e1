use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;

use super::cvss;

/// Runs the `osv-scanner` CLI.
pub struct OsvScanner {
    program: String,
}

impl OsvScanner {
    pub fn new() -> Self {
        Self {
            program: "osv-scanner".to_string(),
        }
    }

    /// Uses a different executable, e.g. an absolute path.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for OsvScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::VulnerabilityScanner for OsvScanner {
    fn name(&self) -> &'static str {
        "OSV Scanner"
    }

    async fn scan(&self, lockfile: &Path) -> Result<serde_json::Value> {
        let output = Command::new(&self.program)
            .args(["--format", "json", "--lockfile"])
            .arg(lockfile)
            .output()
            .await
            .with_context(|| format!("Failed to execute {}. Is it installed?", self.program))?;

        // osv-scanner exits non-zero when it finds vulnerabilities, so the
        // exit status only matters when there is nothing on stdout.
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            if output.status.success() {
                return Ok(serde_json::json!({ "results": [] }));
            }
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        serde_json::from_slice(&output.stdout)
            .with_context(|| format!("Failed to parse {} output", self.program))
    }
}

/// Top level of an osv-scanner JSON report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsvReport {
    #[serde(default)]
    pub results: Vec<OsvResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsvResult {
    #[serde(default)]
    pub packages: Vec<OsvPackageResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsvPackageResult {
    #[serde(default)]
    pub package: OsvPackage,
    #[serde(default)]
    pub vulnerabilities: Vec<OsvVulnerability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsvPackage {
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsvVulnerability {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub details: Option<String>,
    #[serde(default)]
    pub severity: Vec<OsvSeverity>,
    pub database_specific: Option<DatabaseSpecific>,
    #[serde(default)]
    pub references: Vec<OsvReference>,
}

impl OsvVulnerability {
    /// The advisory database's own severity label, if it published one.
    pub fn database_severity(&self) -> Option<&str> {
        self.database_specific
            .as_ref()?
            .severity
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSpecific {
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsvSeverity {
    #[serde(rename = "type")]
    pub severity_type: Option<String>,
    pub score: Option<serde_json::Value>,
}

impl OsvSeverity {
    pub fn is_cvss_v3(&self) -> bool {
        self.severity_type.as_deref() == Some("CVSS_V3")
    }

    /// Numeric score, from a number, a numeric string or a CVSS v3 vector.
    pub fn numeric_score(&self) -> Option<f64> {
        match self.score.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => cvss::parse_score(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsvReference {
    pub url: Option<String>,
}
