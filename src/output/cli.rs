use tabled::{settings::Style, Table, Tabled};

use crate::model::{LicenseFinding, Severity, SeverityLabel, VulnerabilityFinding};
use crate::policy::ScanVerdict;

#[derive(Tabled)]
struct VulnRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Summary")]
    summary: String,
}

#[derive(Tabled)]
struct LicenseRow {
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "License")]
    license: String,
}

/// Builds the console summary printed at the end of a run.
pub fn format_cli_summary(
    vulnerabilities: &[VulnerabilityFinding],
    license_issues: &[LicenseFinding],
    verdict: &ScanVerdict,
) -> String {
    let mut out = String::new();

    if !vulnerabilities.is_empty() {
        let mut sorted: Vec<&VulnerabilityFinding> = vulnerabilities.iter().collect();
        sorted.sort_by_key(|v| std::cmp::Reverse(v.severity.known().map(|s| s.rank())));

        let rows: Vec<VulnRow> = sorted
            .iter()
            .map(|v| VulnRow {
                severity: format_severity(&v.severity),
                package: format!("{}@{}", v.package, v.version),
                id: v.vulnerability_id.clone(),
                summary: truncate(&v.summary, 60),
            })
            .collect();

        out.push_str(&format!("Found {} vulnerabilities:\n", vulnerabilities.len()));
        out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
        out.push('\n');
    }

    if !license_issues.is_empty() {
        let rows: Vec<LicenseRow> = license_issues
            .iter()
            .map(|l| LicenseRow {
                package: format!("{}@{}", l.package, l.version),
                license: l.license.clone(),
            })
            .collect();

        out.push_str(&format!("Found {} license issues:\n", license_issues.len()));
        out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
        out.push('\n');
    }

    out.push_str(&format!(
        "Summary: {} vulnerabilities ({} blocking at {}+), {} license issues, mode {}\n",
        verdict.vulnerability_count,
        verdict.blocking_vulnerabilities,
        verdict.threshold,
        verdict.license_issue_count,
        verdict.mode
    ));

    out
}

pub fn print_cli_summary(
    vulnerabilities: &[VulnerabilityFinding],
    license_issues: &[LicenseFinding],
    verdict: &ScanVerdict,
) {
    println!();
    print!("{}", format_cli_summary(vulnerabilities, license_issues, verdict));
}

fn format_severity(severity: &SeverityLabel) -> String {
    match severity.known() {
        Some(Severity::Critical) => "\x1b[31mCRITICAL\x1b[0m".to_string(),
        Some(Severity::High) => "\x1b[91mHIGH\x1b[0m".to_string(),
        Some(Severity::Medium) => "\x1b[33mMEDIUM\x1b[0m".to_string(),
        Some(Severity::Low) => "\x1b[32mLOW\x1b[0m".to_string(),
        Some(Severity::Info) => "INFO".to_string(),
        None => severity.as_str().to_string(),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }
}
