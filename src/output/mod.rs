//! Report rendering and report artifacts.
//!
//! Every run writes four files into the output directory:
//!
//! | File | Contents |
//! |------|----------|
//! | `osv-report.json` | scanner output, unchanged |
//! | `license-report.json` | license findings |
//! | `report.md` | human-readable report |
//! | `final-report.json` | summary, findings and effective config |

mod cli;
mod json;
mod markdown;

pub use cli::{format_cli_summary, print_cli_summary};
pub use json::{ReportSummary, StructuredReport};
pub use markdown::render_markdown;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::model::{LicenseFinding, VulnerabilityFinding};
use crate::policy::ScanVerdict;

pub const RAW_SCAN_REPORT: &str = "osv-report.json";
pub const LICENSE_REPORT: &str = "license-report.json";
pub const MARKDOWN_REPORT: &str = "report.md";
pub const FINAL_REPORT: &str = "final-report.json";

/// Everything the artifact writer needs from a run.
pub struct ReportInputs<'a> {
    pub raw_scan: &'a serde_json::Value,
    pub vulnerabilities: &'a [VulnerabilityFinding],
    pub license_issues: &'a [LicenseFinding],
    pub verdict: &'a ScanVerdict,
    pub config: &'a Config,
}

/// Paths written by [`write_artifacts`].
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub raw_scan: PathBuf,
    pub license_report: PathBuf,
    pub markdown: PathBuf,
    pub final_report: PathBuf,
    /// Rendered Markdown, reused as the PR comment body.
    pub markdown_body: String,
}

/// Writes all report files into `dir`, creating it if needed.
pub fn write_artifacts(dir: &Path, inputs: &ReportInputs<'_>) -> Result<Artifacts> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let raw_scan = dir.join(RAW_SCAN_REPORT);
    write_file(&raw_scan, &serde_json::to_string_pretty(inputs.raw_scan)?)?;

    let license_report = dir.join(LICENSE_REPORT);
    write_file(
        &license_report,
        &serde_json::to_string_pretty(inputs.license_issues)?,
    )?;

    let markdown_body = render_markdown(
        inputs.vulnerabilities,
        inputs.license_issues,
        inputs.verdict,
        inputs.config,
    );
    let markdown = dir.join(MARKDOWN_REPORT);
    write_file(&markdown, &markdown_body)?;

    let final_report = dir.join(FINAL_REPORT);
    let structured = StructuredReport::new(
        inputs.vulnerabilities,
        inputs.license_issues,
        inputs.verdict,
        inputs.config,
    );
    write_file(&final_report, &structured.to_json()?)?;

    Ok(Artifacts {
        raw_scan,
        license_report,
        markdown,
        final_report,
        markdown_body,
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::evaluate;

    #[test]
    fn test_write_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let config = Config::default();
        let licenses = vec![LicenseFinding::banned("gpl_pkg", "1.0.0", "GPL-3.0")];
        let verdict = evaluate(&[], &licenses, &config);
        let raw = serde_json::json!({ "results": [] });

        let artifacts = write_artifacts(
            &out,
            &ReportInputs {
                raw_scan: &raw,
                vulnerabilities: &[],
                license_issues: &licenses,
                verdict: &verdict,
                config: &config,
            },
        )
        .unwrap();

        let raw_back: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&artifacts.raw_scan).unwrap()).unwrap();
        assert_eq!(raw_back, raw);

        let licenses_back: Vec<LicenseFinding> =
            serde_json::from_str(&fs::read_to_string(&artifacts.license_report).unwrap()).unwrap();
        assert_eq!(licenses_back, licenses);

        let md = fs::read_to_string(&artifacts.markdown).unwrap();
        assert_eq!(md, artifacts.markdown_body);
        assert!(md.contains("## ✅ No Vulnerabilities Found"));

        let final_report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&artifacts.final_report).unwrap()).unwrap();
        assert_eq!(final_report["summary"]["total_license_issues"], 1);
        assert_eq!(final_report["summary"]["status"], "failed");
        assert_eq!(artifacts.final_report.file_name().unwrap(), FINAL_REPORT);
    }
}
