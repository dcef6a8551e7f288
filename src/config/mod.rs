//! Configuration types and loading

mod loader;
mod oracle;
mod pipeline;

pub use loader::{AceConfig, Defaults};
pub use oracle::OracleConfig;
pub use pipeline::{DataConfig, NormalizationConfig, RuleConfig};
