pub mod cache;
pub mod checker;
pub mod ci;
pub mod config;
pub mod gate;
pub mod license;
pub mod lockfile;
pub mod model;
pub mod normalize;
pub mod output;
pub mod policy;

pub use cache::Cache;
pub use config::{Config, ConfigError, Mode};
pub use gate::{Gate, GateRun};
pub use model::{LicenseFinding, Severity, SeverityLabel, VulnerabilityFinding};
pub use policy::{evaluate, ScanVerdict};
