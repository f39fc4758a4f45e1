//! Vulnerability scanning collaborator.
//!
//! The gate does not detect vulnerabilities itself. A [`VulnerabilityScanner`]
//! produces an OSV-shaped JSON report for a lockfile and [`scan_lockfile`]
//! turns any failure into an empty report with a distinct [`ScanStatus`].

pub mod cvss;
mod osv;

pub use osv::{
    DatabaseSpecific, OsvPackage, OsvPackageResult, OsvReference, OsvReport, OsvResult,
    OsvScanner, OsvSeverity, OsvVulnerability,
};

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Runs an external scanner against a lockfile.
#[async_trait]
pub trait VulnerabilityScanner: Send + Sync {
    /// Returns the human-readable name of this scanner.
    fn name(&self) -> &'static str;

    /// Scans `lockfile` and returns the raw JSON report.
    ///
    /// # Errors
    ///
    /// Returns an error if the scanner cannot be run or its output is not JSON.
    async fn scan(&self, lockfile: &Path) -> Result<serde_json::Value>;
}

/// How the vulnerability scan went.
///
/// `Unavailable` and `Failed` both produce an empty report, so they look
/// the same as a clean `Ran` in the findings. They only differ in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Ran,
    Unavailable,
    Failed,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanStatus::Ran => "ran",
            ScanStatus::Unavailable => "unavailable",
            ScanStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of [`scan_lockfile`].
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub status: ScanStatus,
    /// Scanner output exactly as received, or an empty report.
    pub raw: serde_json::Value,
    pub report: OsvReport,
}

impl ScanOutcome {
    fn empty(status: ScanStatus) -> Self {
        Self {
            status,
            raw: serde_json::json!({ "results": [] }),
            report: OsvReport::default(),
        }
    }
}

/// Scans a lockfile, degrading every failure to an empty report.
pub async fn scan_lockfile(scanner: &dyn VulnerabilityScanner, lockfile: &Path) -> ScanOutcome {
    if !lockfile.exists() {
        warn!(
            "{} not found; vulnerability scan unavailable, treating as no vulnerabilities",
            lockfile.display()
        );
        return ScanOutcome::empty(ScanStatus::Unavailable);
    }

    info!("Running {} on {}", scanner.name(), lockfile.display());

    let raw = match scanner.scan(lockfile).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(
                "{} failed: {:#}; treating as no vulnerabilities",
                scanner.name(),
                e
            );
            return ScanOutcome::empty(ScanStatus::Failed);
        }
    };

    match serde_json::from_value::<OsvReport>(raw.clone()) {
        Ok(report) => {
            info!("{} scan complete", scanner.name());
            ScanOutcome {
                status: ScanStatus::Ran,
                raw,
                report,
            }
        }
        Err(e) => {
            warn!(
                "{} produced an unexpected report shape: {}; treating as no vulnerabilities",
                scanner.name(),
                e
            );
            ScanOutcome {
                status: ScanStatus::Failed,
                raw,
                report: OsvReport::default(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::fs;

    struct FixedScanner(serde_json::Value);

    #[async_trait]
    impl VulnerabilityScanner for FixedScanner {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn scan(&self, _lockfile: &Path) -> Result<serde_json::Value> {
            Ok(self.0.clone())
        }
    }

    struct BrokenScanner;

    #[async_trait]
    impl VulnerabilityScanner for BrokenScanner {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn scan(&self, _lockfile: &Path) -> Result<serde_json::Value> {
            bail!("osv-scanner: command not found")
        }
    }

    fn lockfile() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pubspec.lock");
        fs::write(&path, "packages: {}\n").unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_missing_lockfile_is_unavailable() {
        let scanner = FixedScanner(serde_json::json!({ "results": [] }));
        let outcome = scan_lockfile(&scanner, Path::new("/nonexistent/pubspec.lock")).await;

        assert_eq!(outcome.status, ScanStatus::Unavailable);
        assert!(outcome.report.results.is_empty());
    }

    #[tokio::test]
    async fn test_scanner_error_is_failed() {
        let (_dir, path) = lockfile();
        let outcome = scan_lockfile(&BrokenScanner, &path).await;

        assert_eq!(outcome.status, ScanStatus::Failed);
        assert!(outcome.report.results.is_empty());
        assert_eq!(outcome.raw, serde_json::json!({ "results": [] }));
    }

    #[tokio::test]
    async fn test_successful_scan_keeps_raw_output() {
        let (_dir, path) = lockfile();
        let raw = serde_json::json!({
            "results": [{
                "source": { "path": "pubspec.lock", "type": "lockfile" },
                "packages": [{
                    "package": { "name": "http", "version": "0.13.0", "ecosystem": "Pub" },
                    "vulnerabilities": [{ "id": "GHSA-4rgh-jx4f-qfcq" }]
                }]
            }]
        });
        let outcome = scan_lockfile(&FixedScanner(raw.clone()), &path).await;

        assert_eq!(outcome.status, ScanStatus::Ran);
        assert_eq!(outcome.raw, raw);
        assert_eq!(outcome.report.results[0].packages[0].vulnerabilities.len(), 1);
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_failed() {
        let (_dir, path) = lockfile();
        let outcome =
            scan_lockfile(&FixedScanner(serde_json::json!({ "results": "nope" })), &path).await;

        assert_eq!(outcome.status, ScanStatus::Failed);
        assert!(outcome.report.results.is_empty());
    }
}
