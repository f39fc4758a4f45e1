use crate::config::Config;
use crate::model::{LicenseFinding, Severity, SeverityLabel, VulnerabilityFinding};
use crate::policy::ScanVerdict;

/// Number of reference URLs listed per vulnerability.
const MAX_REFERENCES: usize = 2;

/// Renders the human-readable report, also used as the PR comment body.
///
/// Vulnerabilities are grouped by severity from CRITICAL down to INFO,
/// keeping normalizer order inside each group. Labels outside the fixed
/// levels follow in order of first appearance.
pub fn render_markdown(
    vulnerabilities: &[VulnerabilityFinding],
    license_issues: &[LicenseFinding],
    verdict: &ScanVerdict,
    config: &Config,
) -> String {
    let mut md = String::new();

    md.push_str("# 🛡️ SecureGate Security Scan Report\n\n");

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- **Vulnerabilities Found:** {}\n", vulnerabilities.len()));
    md.push_str(&format!("- **License Issues:** {}\n", license_issues.len()));
    md.push_str(&format!("- **Mode:** {}\n", config.mode));
    md.push_str(&format!("- **Severity Threshold:** {}\n", config.severity_threshold));
    md.push_str(&format!("- **Status:** {}\n\n", verdict.status_str()));

    if vulnerabilities.is_empty() {
        md.push_str("## ✅ No Vulnerabilities Found\n\n");
    } else {
        md.push_str("## 🔴 Vulnerabilities\n\n");
        for (label, group) in group_by_severity(vulnerabilities) {
            md.push_str(&format!("### {} ({})\n\n", label, group.len()));
            for v in group {
                push_vulnerability(&mut md, v);
            }
        }
    }

    if license_issues.is_empty() {
        md.push_str("## ✅ No License Issues Found\n");
    } else {
        md.push_str("## ⚠️ License Issues\n\n");
        for issue in license_issues {
            md.push_str(&format!("- **{}@{}**\n", issue.package, issue.version));
            md.push_str(&format!("  - License: `{}`\n", issue.license));
            md.push_str(&format!("  - Reason: {}\n\n", issue.reason));
        }
    }

    md
}

fn push_vulnerability(md: &mut String, v: &VulnerabilityFinding) {
    md.push_str(&format!("- **{}@{}**\n", v.package, v.version));
    md.push_str(&format!("  - ID: `{}`\n", v.vulnerability_id));
    md.push_str(&format!("  - Summary: {}\n", v.summary));
    if !v.references.is_empty() {
        let refs: Vec<&str> = v
            .references
            .iter()
            .take(MAX_REFERENCES)
            .map(String::as_str)
            .collect();
        md.push_str(&format!("  - References: {}\n", refs.join(", ")));
    }
    md.push('\n');
}

/// Non-empty severity buckets, most severe first.
fn group_by_severity(
    vulnerabilities: &[VulnerabilityFinding],
) -> Vec<(&SeverityLabel, Vec<&VulnerabilityFinding>)> {
    let mut groups: Vec<(&SeverityLabel, Vec<&VulnerabilityFinding>)> = Vec::new();

    for severity in Severity::ALL.iter().rev() {
        let group: Vec<_> = vulnerabilities
            .iter()
            .filter(|v| v.severity.known() == Some(*severity))
            .collect();
        if let Some(&first) = group.first() {
            groups.push((&first.severity, group));
        }
    }

    for v in vulnerabilities.iter().filter(|v| v.severity.known().is_none()) {
        match groups.iter_mut().find(|(label, _)| **label == v.severity) {
            Some((_, group)) => group.push(v),
            None => groups.push((&v.severity, vec![v])),
        }
    }

    groups
}
