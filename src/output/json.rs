use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::{Config, Mode};
use crate::model::{LicenseFinding, Severity, VulnerabilityFinding};
use crate::policy::ScanVerdict;

/// Summary block of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_vulnerabilities: usize,
    pub total_license_issues: usize,
    pub mode: Mode,
    pub threshold: Severity,
    pub status: String,
}

/// Machine-readable report: summary, both finding lists and the
/// configuration that produced them.
#[derive(Debug, Serialize)]
pub struct StructuredReport<'a> {
    pub summary: ReportSummary,
    pub vulnerabilities: &'a [VulnerabilityFinding],
    pub license_issues: &'a [LicenseFinding],
    pub config: &'a Config,
}

impl<'a> StructuredReport<'a> {
    pub fn new(
        vulnerabilities: &'a [VulnerabilityFinding],
        license_issues: &'a [LicenseFinding],
        verdict: &ScanVerdict,
        config: &'a Config,
    ) -> Self {
        Self {
            summary: ReportSummary {
                total_vulnerabilities: vulnerabilities.len(),
                total_license_issues: license_issues.len(),
                mode: config.mode,
                threshold: config.severity_threshold,
                status: verdict.status_str().to_string(),
            },
            vulnerabilities,
            license_issues,
            config,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SeverityLabel;
    use crate::policy::evaluate;

    fn vulns() -> Vec<VulnerabilityFinding> {
        ["GHSA-1", "GHSA-2", "GHSA-3"]
            .iter()
            .map(|id| VulnerabilityFinding {
                package: "archive".to_string(),
                version: "3.1.0".to_string(),
                vulnerability_id: id.to_string(),
                severity: SeverityLabel::Known(Severity::Low),
                summary: "Path traversal".to_string(),
                details: String::new(),
                references: vec!["https://osv.dev/".to_string()],
            })
            .collect()
    }

    #[test]
    fn test_summary_counts_read_back() {
        let vulnerabilities = vulns();
        let licenses = vec![LicenseFinding::banned("gpl_pkg", "1.0.0", "GPL-3.0")];
        let config = Config::default();
        let verdict = evaluate(&vulnerabilities, &licenses, &config);

        let json = StructuredReport::new(&vulnerabilities, &licenses, &verdict, &config)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let summary: ReportSummary = serde_json::from_value(value["summary"].clone()).unwrap();

        assert_eq!(summary.total_vulnerabilities, vulnerabilities.len());
        assert_eq!(summary.total_license_issues, licenses.len());
        assert_eq!(summary.mode, Mode::Block);
        assert_eq!(summary.threshold, Severity::High);
        assert_eq!(summary.status, "failed");
        assert_eq!(value["vulnerabilities"].as_array().unwrap().len(), 3);
        assert_eq!(value["vulnerabilities"][0]["severity"], "LOW");
        assert_eq!(value["license_issues"][0]["license"], "GPL-3.0");
    }

    #[test]
    fn test_effective_config_is_included() {
        let config = Config {
            mode: Mode::Annotate,
            whitelist: vec!["internal".to_string()],
            ..Config::default()
        };
        let verdict = evaluate(&[], &[], &config);
        let json = StructuredReport::new(&[], &[], &verdict, &config).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["config"]["mode"], "annotate");
        assert_eq!(value["config"]["severity_threshold"], "HIGH");
        assert_eq!(value["config"]["whitelist"][0], "internal");
        assert_eq!(value["config"]["banned_licenses"].as_array().unwrap().len(), 4);
        assert_eq!(value["summary"]["mode"], "annotate");
    }
}
