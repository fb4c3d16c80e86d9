//! Owned IR types for flow-graph analysis.
//!
//! These types mirror the JSON emitted by the external flow-graph builder:
//! SSA-style functions organized into basic blocks of instructions, with
//! explicit CFG edges. Instruction kinds form a closed set so analysis
//! passes dispatch exhaustively instead of via runtime type inspection.

use serde::{Deserialize, Serialize};

/// Root type — complete analysis input from the flow-graph builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub packages: Vec<Package>,
}

/// A package of analyzable functions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub import_path: String,
    pub name: String,
    pub functions: Vec<Function>,
}

/// Source location span.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub file: String,
    pub start_line: u32,
    pub start_col: u32,
    #[serde(default)]
    pub end_line: u32,
    #[serde(default)]
    pub end_col: u32,
}

impl Span {
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Self {
            file: file.into(),
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col,
        }
    }
}

/// SSA instruction.
///
/// Every value-producing instruction carries a function-unique `id`;
/// `operands` reference producer ids. Call instructions carry their
/// statically-resolved `callee` when the builder could determine it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: u32,
    pub kind: ValueKind,
    pub name: String,
    /// Declared type of the produced value, as spelled in the source
    /// program's type system (e.g. "string").
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub operands: Vec<u32>,

    // Call-specific
    #[serde(default)]
    pub callee: Option<String>,
    /// True when the call dispatches through an interface or function
    /// value, so no static callee exists.
    #[serde(default)]
    pub callee_is_interface: bool,

    // Const-specific
    #[serde(default)]
    pub const_value: Option<String>,

    // BinOp-specific
    #[serde(default)]
    pub bin_op: Option<String>,
}

impl Instruction {
    /// True if this instruction's declared result type is a string.
    pub fn is_string_typed(&self) -> bool {
        self.type_name.as_deref() == Some("string")
    }

    /// True if this instruction is a compile-time constant with a value.
    pub fn is_constant(&self) -> bool {
        self.kind == ValueKind::Const && self.const_value.is_some()
    }
}

/// Closed set of instruction kinds.
///
/// Unrecognized kinds from newer builders deserialize to `Unknown` rather
/// than failing the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValueKind {
    Const,
    Parameter,
    FreeVar,
    Global,
    Alloc,
    Call,
    BinOp,
    UnOp,
    Phi,
    Extract,
    Convert,
    ChangeType,
    MakeInterface,
    Lookup,
    Slice,
    Load,
    Store,
    Return,
    If,
    Jump,
    #[serde(other)]
    Unknown,
}

/// CFG edge between basic blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfgEdge {
    pub from_block: u32,
    pub to_block: u32,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum EdgeKind {
    Unconditional,
    CondTrue,
    CondFalse,
    #[serde(other)]
    Unknown,
}

/// SSA basic block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: u32,
    pub name: String,
    pub instructions: Vec<Instruction>,
}

/// SSA function with full CFG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub span: Option<Span>,
    pub blocks: Vec<BasicBlock>,
    #[serde(default)]
    pub cfg_edges: Vec<CfgEdge>,
}
