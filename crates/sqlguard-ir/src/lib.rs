//! SQLGuard IR — intermediate representation for flow-graph analysis.
//!
//! The IR is built by an external compiler front-end and handed to this
//! crate in serialized form. This crate provides:
//! - Owned IR types matching the builder's output (JSON)
//! - CFG navigation helpers, including dominance-respecting traversal

pub mod cfg;
pub mod ir;

/// Load a serialized IR file and convert it to the owned representation.
pub fn load_ir_file(path: &std::path::Path) -> Result<ir::AnalysisInput, String> {
    let data = std::fs::read_to_string(path).map_err(|e| format!("read error: {e}"))?;
    serde_json::from_str(&data).map_err(|e| format!("invalid IR JSON: {e}"))
}
