//! Policy configuration.
//!
//! The gate reads an optional YAML (or TOML) document and overlays it onto
//! fixed defaults, key by key. A key present in the file replaces the
//! default for that key entirely; lists are never merged.
//!
//! # Configuration Location
//!
//! `.github/security-gate.yml` unless `CONFIG_PATH` points elsewhere.
//! Files ending in `.toml` are parsed as TOML, everything else as YAML.
//!
//! # Example Configuration
//!
//! ```yaml
//! mode: block
//! severity_threshold: HIGH
//! banned_licenses: ["GPL-3.0", "AGPL-3.0"]
//! whitelist: ["internal_widgets"]
//! ignore_packages: ["http"]
//! ignore_vulnerabilities: ["GHSA-xxxx-xxxx-xxxx"]
//! ```

use anyhow::{Context, Result};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::model::Severity;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Configuration file location when `CONFIG_PATH` is unset.
pub const DEFAULT_CONFIG_PATH: &str = ".github/security-gate.yml";

/// Licenses banned when the configuration does not say otherwise.
pub const DEFAULT_BANNED_LICENSES: [&str; 4] = ["GPL-3.0", "AGPL-3.0", "SSPL-1.0", "proprietary"];

/// Fatal configuration problems. Everything else falls back to defaults.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid mode '{0}': expected 'block' or 'annotate'")]
    InvalidMode(String),

    #[error("invalid severity_threshold '{0}': expected one of INFO, LOW, MEDIUM, HIGH, CRITICAL")]
    InvalidThreshold(String),

    #[error("invalid unscored_severity '{0}': expected one of INFO, LOW, MEDIUM, HIGH, CRITICAL")]
    InvalidUnscoredSeverity(String),
}

/// What the gate does when blocking findings exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Fail the run.
    Block,
    /// Report only; the run always passes.
    Annotate,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Block => "block",
            Mode::Annotate => "annotate",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "block" => Ok(Mode::Block),
            "annotate" => Ok(Mode::Annotate),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

/// Effective policy for one run.
///
/// Built once at start-up and never mutated afterwards.
///
/// # Example
///
/// ```
/// use securegate::config::{Config, Mode};
/// use securegate::model::Severity;
///
/// let config = Config::default();
/// assert_eq!(config.mode, Mode::Block);
/// assert_eq!(config.severity_threshold, Severity::High);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub mode: Mode,

    /// License identifiers that produce a finding.
    pub banned_licenses: Vec<String>,

    /// Lowest severity that blocks.
    pub severity_threshold: Severity,

    /// Packages exempt from license checks.
    pub whitelist: Vec<String>,

    /// Packages exempt from vulnerability checks.
    pub ignore_packages: Vec<String>,

    /// Vulnerability IDs to suppress (e.g. "GHSA-xxxx", "CVE-2021-12345").
    pub ignore_vulnerabilities: Vec<String>,

    /// Severity assigned when an advisory has neither a label nor a usable
    /// CVSS v3 score.
    pub unscored_severity: Severity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Block,
            banned_licenses: DEFAULT_BANNED_LICENSES.iter().map(|s| s.to_string()).collect(),
            severity_threshold: Severity::High,
            whitelist: Vec::new(),
            ignore_packages: Vec::new(),
            ignore_vulnerabilities: Vec::new(),
            unscored_severity: Severity::Medium,
        }
    }
}

/// Keys read from a configuration file. Absent keys keep their default.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigOverlay {
    pub mode: Option<String>,
    pub banned_licenses: Option<Vec<String>>,
    pub severity_threshold: Option<String>,
    pub whitelist: Option<Vec<String>>,
    pub ignore_packages: Option<Vec<String>>,
    pub ignore_vulnerabilities: Option<Vec<String>>,
    pub unscored_severity: Option<String>,

    #[serde(flatten)]
    unknown: BTreeMap<String, IgnoredAny>,
}

impl ConfigOverlay {
    /// Parses an overlay, picking TOML or YAML from the file extension.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            toml::from_str(content).context("Failed to parse TOML configuration")
        } else {
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")
        }
    }

    /// Keys that were present but are not configuration fields.
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        self.unknown.keys().map(String::as_str)
    }
}

impl Config {
    /// Resolves the configuration for a run.
    ///
    /// A missing, unreadable or unparsable file yields the defaults with a
    /// log message. Only an invalid enum value is an error.
    pub fn resolve(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config file found at {}. Using defaults", path.display());
            return Ok(Self::default());
        }

        let overlay = match Self::read_overlay(path) {
            Ok(overlay) => overlay,
            Err(e) => {
                warn!("Error loading config from {}: {:#}. Using defaults", path.display(), e);
                return Ok(Self::default());
            }
        };

        let config = Self::default().overlay(overlay)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn read_overlay(path: &Path) -> Result<ConfigOverlay> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        ConfigOverlay::parse(&content, path)
    }

    /// Returns a new configuration with every key present in `overlay`
    /// replacing the corresponding value of `self`.
    pub fn overlay(&self, overlay: ConfigOverlay) -> Result<Self, ConfigError> {
        for key in overlay.unknown_keys() {
            warn!("Ignoring unknown config key '{}'", key);
        }

        let mode = match overlay.mode {
            Some(raw) => raw.parse::<Mode>()?,
            None => self.mode,
        };

        let severity_threshold = match overlay.severity_threshold {
            Some(raw) => raw
                .parse::<Severity>()
                .map_err(|_| ConfigError::InvalidThreshold(raw))?,
            None => self.severity_threshold,
        };

        let unscored_severity = match overlay.unscored_severity {
            Some(raw) => raw
                .parse::<Severity>()
                .map_err(|_| ConfigError::InvalidUnscoredSeverity(raw))?,
            None => self.unscored_severity,
        };

        Ok(Self {
            mode,
            banned_licenses: overlay
                .banned_licenses
                .unwrap_or_else(|| self.banned_licenses.clone()),
            severity_threshold,
            whitelist: overlay.whitelist.unwrap_or_else(|| self.whitelist.clone()),
            ignore_packages: overlay
                .ignore_packages
                .unwrap_or_else(|| self.ignore_packages.clone()),
            ignore_vulnerabilities: overlay
                .ignore_vulnerabilities
                .unwrap_or_else(|| self.ignore_vulnerabilities.clone()),
            unscored_severity,
        })
    }

    pub fn is_whitelisted(&self, package: &str) -> bool {
        self.whitelist.iter().any(|p| p == package)
    }

    pub fn should_ignore_package(&self, package: &str) -> bool {
        self.ignore_packages.iter().any(|p| p == package)
    }

    pub fn should_ignore_vulnerability(&self, vuln_id: &str) -> bool {
        self.ignore_vulnerabilities.iter().any(|id| id == vuln_id)
    }

    /// Returns the banned-list entry matching `license`, ignoring ASCII case.
    pub fn banned_license(&self, license: &str) -> Option<&str> {
        self.banned_licenses
            .iter()
            .find(|banned| banned.eq_ignore_ascii_case(license))
            .map(String::as_str)
    }

    /// Renders the default configuration as YAML.
    pub fn generate_default_config() -> String {
        serde_yaml::to_string(&Config::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn yaml(content: &str) -> ConfigOverlay {
        ConfigOverlay::parse(content, Path::new("security-gate.yml")).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.mode, Mode::Block);
        assert_eq!(config.severity_threshold, Severity::High);
        assert_eq!(
            config.banned_licenses,
            vec!["GPL-3.0", "AGPL-3.0", "SSPL-1.0", "proprietary"]
        );
        assert!(config.whitelist.is_empty());
        assert!(config.ignore_packages.is_empty());
        assert!(config.ignore_vulnerabilities.is_empty());
        assert_eq!(config.unscored_severity, Severity::Medium);
    }

    #[test]
    fn test_overlay_replaces_lists_without_merging() {
        let overlay = yaml("banned_licenses: [\"MIT\"]\nwhitelist: [\"foo\"]\n");
        let config = Config::default().overlay(overlay).unwrap();

        assert_eq!(config.banned_licenses, vec!["MIT"]);
        assert_eq!(config.whitelist, vec!["foo"]);
        assert_eq!(config.mode, Mode::Block);
        assert_eq!(config.severity_threshold, Severity::High);
    }

    #[test]
    fn test_overlay_leaves_defaults_untouched() {
        let defaults = Config::default();
        let _ = defaults
            .overlay(yaml("mode: annotate\nignore_packages: [\"http\"]\n"))
            .unwrap();

        assert_eq!(defaults, Config::default());
    }

    #[test]
    fn test_overlay_parses_enums() {
        let config = Config::default()
            .overlay(yaml("mode: annotate\nseverity_threshold: medium\n"))
            .unwrap();

        assert_eq!(config.mode, Mode::Annotate);
        assert_eq!(config.severity_threshold, Severity::Medium);
    }

    #[test]
    fn test_invalid_threshold_is_fatal() {
        let err = Config::default()
            .overlay(yaml("severity_threshold: SEVERE\n"))
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidThreshold(ref v) if v == "SEVERE"));
    }

    #[test]
    fn test_invalid_mode_is_fatal() {
        let err = Config::default().overlay(yaml("mode: warn\n")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMode(_)));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let overlay = yaml("mode: block\nfail_fast: true\n");
        assert_eq!(overlay.unknown_keys().collect::<Vec<_>>(), vec!["fail_fast"]);

        let config = Config::default().overlay(overlay).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_toml_by_extension() {
        let overlay = ConfigOverlay::parse(
            "mode = \"annotate\"\nignore_vulnerabilities = [\"GHSA-1\"]\n",
            Path::new("gate.toml"),
        )
        .unwrap();
        let config = Config::default().overlay(overlay).unwrap();

        assert_eq!(config.mode, Mode::Annotate);
        assert_eq!(config.ignore_vulnerabilities, vec!["GHSA-1"]);
    }

    #[test]
    fn test_resolve_missing_file_uses_defaults() {
        let config = Config::resolve(&PathBuf::from("/nonexistent/security-gate.yml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_resolve_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("security-gate.yml");
        fs::write(&path, "mode: [unclosed\n").unwrap();

        let config = Config::resolve(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_resolve_empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("security-gate.yml");
        fs::write(&path, "").unwrap();

        assert_eq!(Config::resolve(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_resolve_invalid_threshold_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("security-gate.yml");
        fs::write(&path, "severity_threshold: URGENT\n").unwrap();

        assert!(matches!(
            Config::resolve(&path),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_banned_license_ignores_case() {
        let config = Config::default();
        assert_eq!(config.banned_license("gpl-3.0"), Some("GPL-3.0"));
        assert_eq!(config.banned_license("Proprietary"), Some("proprietary"));
        assert_eq!(config.banned_license("MIT"), None);
    }

    #[test]
    fn test_generate_default_config_round_trips() {
        let rendered = Config::generate_default_config();
        let config = Config::default().overlay(yaml(&rendered)).unwrap();
        assert_eq!(config, Config::default());
    }
}
