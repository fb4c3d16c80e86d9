//! SQLGuard diagnostics — finding types produced by analysis passes.

pub mod finding;

pub use finding::{Evidence, Finding, Location, Severity};
