//! Turns raw scanner and license data into findings.

use tracing::{debug, warn};

use crate::checker::{OsvReport, OsvVulnerability};
use crate::config::Config;
use crate::license::LicenseResolver;
use crate::model::{
    Dependency, DependencySource, LicenseFinding, Severity, SeverityLabel, VulnerabilityFinding,
};

/// Derives the severity of an advisory.
///
/// In order: the database label (uppercased, kept even if unrecognized),
/// then the first `CVSS_V3` entry with a positive score, then `fallback`.
/// A CVSS score of exactly zero does not map to a level, so it also ends
/// up at `fallback`.
pub fn derive_severity(vuln: &OsvVulnerability, fallback: Severity) -> SeverityLabel {
    if let Some(label) = vuln.database_severity() {
        return SeverityLabel::from_label(label);
    }

    vuln.severity
        .iter()
        .filter(|s| s.is_cvss_v3())
        .filter_map(|s| s.numeric_score())
        .find_map(Severity::from_cvss)
        .unwrap_or(fallback)
        .into()
}

/// Flattens an OSV report into findings, in report order.
///
/// Ignored packages and ignored advisory IDs are dropped before their
/// severity is looked at.
pub fn normalize_vulnerabilities(report: &OsvReport, config: &Config) -> Vec<VulnerabilityFinding> {
    let mut findings = Vec::new();

    for package in report.results.iter().flat_map(|r| &r.packages) {
        let name = package.package.name.as_deref().unwrap_or("unknown");
        let version = package.package.version.as_deref().unwrap_or("unknown");

        if config.should_ignore_package(name) {
            debug!("Ignoring vulnerabilities in package {}", name);
            continue;
        }

        for vuln in &package.vulnerabilities {
            let id = vuln.id.as_deref().unwrap_or("unknown");

            if config.should_ignore_vulnerability(id) {
                debug!("Ignoring vulnerability {} in {}", id, name);
                continue;
            }

            findings.push(VulnerabilityFinding {
                package: name.to_string(),
                version: version.to_string(),
                vulnerability_id: id.to_string(),
                severity: derive_severity(vuln, config.unscored_severity),
                summary: vuln
                    .summary
                    .clone()
                    .unwrap_or_else(|| "No description available".to_string()),
                details: vuln.details.clone().unwrap_or_default(),
                references: vuln.references.iter().filter_map(|r| r.url.clone()).collect(),
            });
        }
    }

    findings
}

/// Looks up the license of every non-whitelisted hosted dependency and
/// reports those on the banned list.
///
/// SDK, path and git dependencies are never looked up, since a registry
/// package of the same name says nothing about them. Unknown licenses and
/// failed lookups never produce a finding.
pub async fn collect_license_findings(
    dependencies: &[Dependency],
    config: &Config,
    resolver: &dyn LicenseResolver,
) -> Vec<LicenseFinding> {
    let mut findings = Vec::new();

    for dep in dependencies {
        if config.is_whitelisted(&dep.name) {
            debug!("Skipping license check for whitelisted package {}", dep.name);
            continue;
        }

        if dep.source != DependencySource::Hosted {
            debug!(
                "License of {}@{} ({}) is unknown; not a hosted package",
                dep.name, dep.version, dep.source
            );
            continue;
        }

        let license = match resolver.resolve(&dep.name, &dep.version).await {
            Ok(Some(license)) => license,
            Ok(None) => {
                debug!("License of {}@{} is unknown", dep.name, dep.version);
                continue;
            }
            Err(e) => {
                warn!(
                    "License lookup for {}@{} via {} failed: {:#}",
                    dep.name,
                    dep.version,
                    resolver.name(),
                    e
                );
                continue;
            }
        };

        if let Some(banned) = config.banned_license(&license) {
            findings.push(LicenseFinding::banned(&dep.name, &dep.version, banned));
        }
    }

    findings
}
