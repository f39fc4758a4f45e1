//! Core data types shared by the normalizer, policy and renderers.
//!
//! - [`Severity`] - the fixed `INFO < LOW < MEDIUM < HIGH < CRITICAL` ordering
//! - [`SeverityLabel`] - the severity carried by a finding
//! - [`VulnerabilityFinding`] / [`LicenseFinding`] - normalized findings
//! - [`Dependency`] - a locked package from `pubspec.lock`
//!
//! # Example
//!
//! ```
//! use securegate::model::{LicenseFinding, Severity};
//!
//! let finding = LicenseFinding::banned("left_pad", "1.0.0", "GPL-3.0");
//! assert_eq!(finding.reason, "License 'GPL-3.0' is banned");
//! assert!(Severity::Critical > Severity::High);
//! ```

mod dependency;
mod finding;
mod severity;

pub use dependency::*;
pub use finding::*;
pub use severity::*;
