//! GitHub Actions integration: step outputs and PR comments.
//!
//! Both are best effort. Nothing here changes the verdict or exit code.

use anyhow::{bail, Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

use crate::policy::ScanVerdict;

/// CI-related environment, captured once.
#[derive(Debug, Clone, Default)]
pub struct CiEnvironment {
    /// `GITHUB_OUTPUT` step output file.
    pub output_path: Option<PathBuf>,
    /// `GITHUB_EVENT_NAME`.
    pub event_name: Option<String>,
    /// `PR_NUMBER`.
    pub pr_number: Option<String>,
    /// `GITHUB_TOKEN`, handed to `gh` as `GH_TOKEN`.
    pub token: Option<String>,
}

impl CiEnvironment {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            output_path: var("GITHUB_OUTPUT").map(PathBuf::from),
            event_name: var("GITHUB_EVENT_NAME"),
            pr_number: var("PR_NUMBER"),
            token: var("GITHUB_TOKEN"),
        }
    }

    /// PR number to comment on, if this is a pull request run.
    pub fn pull_request(&self) -> Option<&str> {
        if !self.is_pull_request_event() {
            return None;
        }
        self.pr_number.as_deref()
    }

    fn is_pull_request_event(&self) -> bool {
        self.event_name.as_deref() == Some("pull_request")
    }
}

/// The three step outputs published for later workflow steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiOutputs {
    pub vulnerabilities_found: usize,
    pub license_issues_found: usize,
    pub status: &'static str,
}

impl CiOutputs {
    pub fn from_verdict(verdict: &ScanVerdict) -> Self {
        Self {
            vulnerabilities_found: verdict.vulnerability_count,
            license_issues_found: verdict.license_issue_count,
            status: verdict.status_str(),
        }
    }

    pub fn to_lines(&self) -> String {
        format!(
            "vulnerabilities-found={}\nlicense-issues-found={}\nstatus={}\n",
            self.vulnerabilities_found, self.license_issues_found, self.status
        )
    }

    /// Appends the outputs to the step output file.
    pub fn append_to(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        file.write_all(self.to_lines().as_bytes())?;
        Ok(())
    }
}

/// Publishes step outputs when `GITHUB_OUTPUT` is set.
pub fn set_outputs(env: &CiEnvironment, verdict: &ScanVerdict) {
    let Some(path) = env.output_path.as_deref() else {
        return;
    };

    if let Err(e) = CiOutputs::from_verdict(verdict).append_to(path) {
        warn!("Could not write step outputs: {:#}", e);
    }
}

/// Posts the report as a PR comment through the GitHub CLI.
pub async fn post_pr_comment(env: &CiEnvironment, body: &str) {
    let Some(pr_number) = env.pull_request() else {
        if env.is_pull_request_event() {
            info!("No PR number found; skipping comment");
        } else {
            info!("Not a pull request event; skipping comment");
        }
        return;
    };

    info!("Posting comment to PR #{}", pr_number);

    match run_gh_comment(env, pr_number, body).await {
        Ok(()) => info!("Comment posted"),
        Err(e) => warn!("Could not post comment: {:#}", e),
    }
}

async fn run_gh_comment(env: &CiEnvironment, pr_number: &str, body: &str) -> Result<()> {
    let status = Command::new("gh")
        .args(["pr", "comment", pr_number, "--body", body])
        .env("GH_TOKEN", env.token.as_deref().unwrap_or_default())
        .status()
        .await
        .context("Failed to execute gh. Is the GitHub CLI installed?")?;

    if !status.success() {
        bail!("gh pr comment exited with {}", status);
    }
    Ok(())
}
