//! SQLGuard taint — SQL-injection detection over flow-graph IR.
//!
//! Scans each function's instruction stream in dominance-respecting order,
//! resolves calls against a validated sink catalog, and classifies the
//! query-text argument of every sink call as safe, unsafe, or unknown.

pub mod analysis;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod resolver;

pub use analysis::{AnalysisOutput, AnalysisStats, TaintAnalyzer};
pub use catalog::{CatalogError, SinkCatalog, SinkSpec};
pub use classifier::{TaintVerdict, UnknownReason};
pub use config::{load_config, TaintConfig, DEFAULT_CONFIG_TOML};
pub use resolver::{CallSite, Resolution};
