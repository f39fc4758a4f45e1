//! The gate pipeline: scan, normalize, evaluate, write reports.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::checker::{scan_lockfile, ScanStatus, VulnerabilityScanner};
use crate::config::Config;
use crate::license::LicenseResolver;
use crate::lockfile::{read_lockfile, LOCKFILE_NAME};
use crate::model::{LicenseFinding, VulnerabilityFinding};
use crate::normalize::{collect_license_findings, normalize_vulnerabilities};
use crate::output::{write_artifacts, Artifacts, ReportInputs};
use crate::policy::{evaluate, ScanVerdict};

/// A configured gate, ready to run once.
pub struct Gate {
    config: Config,
    scanner: Box<dyn VulnerabilityScanner>,
    resolver: Box<dyn LicenseResolver>,
    lockfile: PathBuf,
    output_dir: PathBuf,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct GateRun {
    pub scan_status: ScanStatus,
    pub vulnerabilities: Vec<VulnerabilityFinding>,
    pub license_issues: Vec<LicenseFinding>,
    pub verdict: ScanVerdict,
    pub artifacts: Artifacts,
}

impl Gate {
    /// Creates a gate scanning `pubspec.lock` and writing reports to the
    /// current directory.
    pub fn new(
        config: Config,
        scanner: Box<dyn VulnerabilityScanner>,
        resolver: Box<dyn LicenseResolver>,
    ) -> Self {
        Self {
            config,
            scanner,
            resolver,
            lockfile: PathBuf::from(LOCKFILE_NAME),
            output_dir: PathBuf::from("."),
        }
    }

    pub fn with_lockfile(mut self, lockfile: impl Into<PathBuf>) -> Self {
        self.lockfile = lockfile.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the gate.
    ///
    /// Scanner and license lookup failures degrade to empty findings.
    ///
    /// # Errors
    ///
    /// Returns an error only if the report files cannot be written.
    pub async fn run(&self) -> Result<GateRun> {
        let outcome = scan_lockfile(self.scanner.as_ref(), &self.lockfile).await;
        let vulnerabilities = normalize_vulnerabilities(&outcome.report, &self.config);
        info!(
            "Vulnerability scan {}: {} findings after ignore rules",
            outcome.status,
            vulnerabilities.len()
        );

        let license_issues = self.scan_licenses().await;

        info!("Applying security policy");
        let verdict = evaluate(&vulnerabilities, &license_issues, &self.config);

        let artifacts = write_artifacts(
            &self.output_dir,
            &ReportInputs {
                raw_scan: &outcome.raw,
                vulnerabilities: &vulnerabilities,
                license_issues: &license_issues,
                verdict: &verdict,
                config: &self.config,
            },
        )?;
        info!("Reports written to {}", self.output_dir.display());

        Ok(GateRun {
            scan_status: outcome.status,
            vulnerabilities,
            license_issues,
            verdict,
            artifacts,
        })
    }

    async fn scan_licenses(&self) -> Vec<LicenseFinding> {
        info!("Scanning licenses via {}", self.resolver.name());

        let dependencies = match read_lockfile(&self.lockfile) {
            Ok(deps) => deps,
            Err(e) => {
                warn!("Error reading lockfile: {:#}; skipping license scan", e);
                return Vec::new();
            }
        };

        let progress = spinner(&self.lockfile, dependencies.len());
        let findings =
            collect_license_findings(&dependencies, &self.config, self.resolver.as_ref()).await;
        progress.finish_and_clear();

        info!("License scan complete. Found {} issues", findings.len());
        findings
    }
}

fn spinner(lockfile: &Path, count: usize) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!(
        "Resolving licenses for {} packages in {}...",
        count,
        lockfile.display()
    ));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::license::StaticResolver;
    use crate::model::Severity;
    use crate::output::{FINAL_REPORT, LICENSE_REPORT, MARKDOWN_REPORT, RAW_SCAN_REPORT};
    use async_trait::async_trait;
    use serde_json::json;
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

    const LOCK: &str = r#"
packages:
  archive:
    dependency: "direct main"
    source: hosted
    version: "3.1.0"
  gpl_pkg:
    dependency: transitive
    source: hosted
    version: "1.0.0"
"#;

    fn osv(severity: &str) -> serde_json::Value {
        json!({
            "results": [{
                "packages": [{
                    "package": { "name": "archive", "version": "3.1.0", "ecosystem": "Pub" },
                    "vulnerabilities": [{
                        "id": "GHSA-9v85-q87q-g4vg",
                        "summary": "Zip slip",
                        "database_specific": { "severity": severity }
                    }]
                }]
            }]
        })
    }

    fn gate(
        dir: &Path,
        config: Config,
        raw: serde_json::Value,
        resolver: StaticResolver,
    ) -> Gate {
        let lockfile = dir.join(LOCKFILE_NAME);
        fs::write(&lockfile, LOCK).unwrap();

        Gate::new(config, Box::new(FixedScanner(raw)), Box::new(resolver))
            .with_lockfile(lockfile)
            .with_output_dir(dir.join("out"))
    }

    fn config(mode: Mode, threshold: Severity) -> Config {
        Config {
            mode,
            severity_threshold: threshold,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_medium_finding_under_high_threshold_passes() {
        let dir = tempfile::tempdir().unwrap();
        let run = gate(
            dir.path(),
            config(Mode::Block, Severity::High),
            osv("MEDIUM"),
            StaticResolver::new(),
        )
        .run()
        .await
        .unwrap();

        assert_eq!(run.scan_status, ScanStatus::Ran);
        assert_eq!(run.vulnerabilities.len(), 1);
        assert!(run.license_issues.is_empty());
        assert!(run.verdict.passed);
        assert_eq!(run.verdict.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_critical_finding_fails() {
        let dir = tempfile::tempdir().unwrap();
        let run = gate(
            dir.path(),
            config(Mode::Block, Severity::High),
            osv("CRITICAL"),
            StaticResolver::new(),
        )
        .run()
        .await
        .unwrap();

        assert!(!run.verdict.passed);
        assert_eq!(run.verdict.exit_code(), 1);
        assert!(run.artifacts.markdown_body.contains("### CRITICAL (1)"));
    }

    #[tokio::test]
    async fn test_annotate_mode_passes_but_reports() {
        let dir = tempfile::tempdir().unwrap();
        let run = gate(
            dir.path(),
            config(Mode::Annotate, Severity::High),
            osv("CRITICAL"),
            StaticResolver::new(),
        )
        .run()
        .await
        .unwrap();

        assert!(run.verdict.passed);
        assert_eq!(run.verdict.exit_code(), 0);
        assert!(run.artifacts.markdown_body.contains("GHSA-9v85-q87q-g4vg"));
    }

    #[tokio::test]
    async fn test_banned_license_fails_without_vulnerabilities() {
        let dir = tempfile::tempdir().unwrap();
        let run = gate(
            dir.path(),
            Config::default(),
            json!({ "results": [] }),
            StaticResolver::new()
                .with_license("gpl_pkg", "GPL-3.0")
                .with_license("archive", "MIT"),
        )
        .run()
        .await
        .unwrap();

        assert!(run.vulnerabilities.is_empty());
        assert_eq!(run.license_issues.len(), 1);
        assert_eq!(run.license_issues[0].package, "gpl_pkg");
        assert!(!run.verdict.passed);

        let written: Vec<LicenseFinding> = serde_json::from_str(
            &fs::read_to_string(dir.path().join("out").join(LICENSE_REPORT)).unwrap(),
        )
        .unwrap();
        assert_eq!(written, run.license_issues);
    }

    #[tokio::test]
    async fn test_missing_lockfile_still_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        let run = Gate::new(
            Config::default(),
            Box::new(FixedScanner(osv("CRITICAL"))),
            Box::new(StaticResolver::new().with_license("gpl_pkg", "GPL-3.0")),
        )
        .with_lockfile(dir.path().join(LOCKFILE_NAME))
        .with_output_dir(dir.path())
        .run()
        .await
        .unwrap();

        assert_eq!(run.scan_status, ScanStatus::Unavailable);
        assert!(run.vulnerabilities.is_empty());
        assert!(run.license_issues.is_empty());
        assert!(run.verdict.passed);

        for name in [RAW_SCAN_REPORT, LICENSE_REPORT, MARKDOWN_REPORT, FINAL_REPORT] {
            assert!(dir.path().join(name).exists(), "{} not written", name);
        }
        assert!(run.artifacts.markdown_body.contains("## ✅ No Vulnerabilities Found"));
        assert!(run.artifacts.markdown_body.contains("## ✅ No License Issues Found"));
    }

    #[tokio::test]
    async fn test_final_report_counts_match_findings() {
        let dir = tempfile::tempdir().unwrap();
        let run = gate(
            dir.path(),
            Config::default(),
            osv("LOW"),
            StaticResolver::new().with_license("gpl_pkg", "AGPL-3.0"),
        )
        .run()
        .await
        .unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&run.artifacts.final_report).unwrap())
                .unwrap();

        assert_eq!(
            report["summary"]["total_vulnerabilities"],
            run.vulnerabilities.len()
        );
        assert_eq!(
            report["summary"]["total_license_issues"],
            run.license_issues.len()
        );
    }
}
