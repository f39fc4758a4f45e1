use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed severity ordering used for threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All levels, lowest first.
    pub const ALL: [Severity; 5] = [
        Severity::Info,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Position in [`Severity::ALL`].
    pub fn rank(&self) -> usize {
        *self as usize
    }

    /// Maps a numeric CVSS v3 base score to a level.
    ///
    /// Each tier is inclusive at its lower bound. Scores of zero or below
    /// have no level and return `None`.
    pub fn from_cvss(score: f64) -> Option<Self> {
        match score {
            s if s >= 9.0 => Some(Severity::Critical),
            s if s >= 7.0 => Some(Severity::High),
            s if s >= 4.0 => Some(Severity::Medium),
            s if s > 0.0 => Some(Severity::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INFO" => Ok(Severity::Info),
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(format!(
                "Unknown severity: {}. Use INFO, LOW, MEDIUM, HIGH or CRITICAL",
                s
            )),
        }
    }
}

/// Severity attached to a vulnerability finding.
///
/// Advisory databases may publish labels outside the fixed ordering
/// (GitHub uses `MODERATE`, for instance). Those are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SeverityLabel {
    Known(Severity),
    Unrecognized(String),
}

impl SeverityLabel {
    /// Builds a label from a database string, uppercased.
    pub fn from_label(label: &str) -> Self {
        let upper = label.to_uppercase();
        match upper.parse::<Severity>() {
            Ok(severity) => SeverityLabel::Known(severity),
            Err(_) => SeverityLabel::Unrecognized(upper),
        }
    }

    pub fn known(&self) -> Option<Severity> {
        match self {
            SeverityLabel::Known(severity) => Some(*severity),
            SeverityLabel::Unrecognized(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SeverityLabel::Known(severity) => severity.as_str(),
            SeverityLabel::Unrecognized(label) => label,
        }
    }
}

impl From<Severity> for SeverityLabel {
    fn from(severity: Severity) -> Self {
        SeverityLabel::Known(severity)
    }
}

impl From<String> for SeverityLabel {
    fn from(label: String) -> Self {
        SeverityLabel::from_label(&label)
    }
}

impl From<SeverityLabel> for String {
    fn from(label: SeverityLabel) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
