//! Pass/fail policy.
//!
//! A vulnerability blocks when its severity is at or above the configured
//! threshold. Any license finding blocks. In annotate mode nothing fails
//! the run.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, Mode};
use crate::model::{LicenseFinding, Severity, SeverityLabel, VulnerabilityFinding};

/// Exit codes for CI integration
pub mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const FAILED: u8 = 1;
}

/// Outcome of [`evaluate`]. Always recomputable from findings and config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanVerdict {
    pub passed: bool,
    /// Whether findings exceeded the policy, regardless of mode.
    pub should_block: bool,
    pub blocking_vulnerabilities: usize,
    pub vulnerability_count: usize,
    pub license_issue_count: usize,
    pub mode: Mode,
    pub threshold: Severity,
}

impl ScanVerdict {
    pub fn status_str(&self) -> &'static str {
        if self.passed {
            "passed"
        } else {
            "failed"
        }
    }

    pub fn exit_code(&self) -> u8 {
        if self.passed {
            exit_codes::SUCCESS
        } else {
            exit_codes::FAILED
        }
    }
}

/// Severity used for threshold comparison.
///
/// Labels outside the fixed ordering rank as the unscored default.
pub fn effective_severity(label: &SeverityLabel, unscored: Severity) -> Severity {
    label.known().unwrap_or(unscored)
}

/// Whether a finding of `severity` blocks under `threshold`.
pub fn meets_threshold(severity: Severity, threshold: Severity) -> bool {
    severity.rank() >= threshold.rank()
}

/// Applies the configured policy to a run's findings.
pub fn evaluate(
    vulnerabilities: &[VulnerabilityFinding],
    license_issues: &[LicenseFinding],
    config: &Config,
) -> ScanVerdict {
    let threshold = config.severity_threshold;

    let blocking_vulnerabilities = vulnerabilities
        .iter()
        .filter(|v| {
            meets_threshold(
                effective_severity(&v.severity, config.unscored_severity),
                threshold,
            )
        })
        .count();

    if blocking_vulnerabilities > 0 {
        warn!(
            "Found {} vulnerabilities at or above {} severity",
            blocking_vulnerabilities, threshold
        );
    }
    if !license_issues.is_empty() {
        warn!("Found {} license violations", license_issues.len());
    }

    let should_block = blocking_vulnerabilities > 0 || !license_issues.is_empty();

    let passed = match config.mode {
        Mode::Annotate => {
            info!("Mode is 'annotate'; the run will not be blocked");
            true
        }
        Mode::Block => !should_block,
    };

    if config.mode == Mode::Block {
        if should_block {
            warn!("Blocking due to security/license issues");
        } else {
            info!("No blocking issues found");
        }
    }

    ScanVerdict {
        passed,
        should_block,
        blocking_vulnerabilities,
        vulnerability_count: vulnerabilities.len(),
        license_issue_count: license_issues.len(),
        mode: config.mode,
        threshold,
    }
}
