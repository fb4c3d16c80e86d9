//! Taint classification of query-argument values.
//!
//! Single-hop backward trace: the verdict is decided by the immediate
//! producer of the value flowing into the sink's query position, not by a
//! fixed-point data-flow analysis. Rules are evaluated in a fixed order
//! and the first match wins, so classification is deterministic for a
//! given producer instruction.

use crate::catalog::is_placeholder_safe;
use sqlguard_ir::ir::{Instruction, ValueKind};
use std::collections::HashMap;

/// Value id -> defining instruction, for one function.
pub type DefMap<'a> = HashMap<u32, &'a Instruction>;

/// Collect the defining instruction for every value id in `instrs`.
pub fn build_defs<'a>(instrs: impl Iterator<Item = &'a Instruction>) -> DefMap<'a> {
    instrs.map(|instr| (instr.id, instr)).collect()
}

/// Why a value could not be proven safe or unsafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownReason {
    /// String-typed function parameter; callers are not inspected.
    Parameter,
    /// Produced by a call whose target cannot be statically determined.
    DynamicCallee,
    /// No defining instruction is reachable for the value.
    OpaqueValue,
    /// Producer shape matches no classification rule.
    UnrecognizedProducer,
}

impl UnknownReason {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Parameter => "value is a function parameter; callers are not inspected",
            Self::DynamicCallee => "value comes from a dynamically dispatched call",
            Self::OpaqueValue => "value has no visible producer",
            Self::UnrecognizedProducer => "value's producer is not recognized",
        }
    }
}

/// Classification of one query-argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaintVerdict {
    Safe,
    Unsafe {
        /// Producer instruction that triggered the verdict.
        evidence: u32,
        /// Short description of the producer, for the finding message.
        description: String,
    },
    Unknown {
        reason: UnknownReason,
    },
}

/// String-formatting functions whose output embeds their operands.
const FORMAT_CALLEES: &[&str] = &[
    "fmt.Sprintf",
    "fmt.Sprint",
    "fmt.Sprintln",
    "strings.Join",
    "strings.Replace",
    "strings.ReplaceAll",
];

fn is_format_callee(callee: &str) -> bool {
    FORMAT_CALLEES.contains(&callee)
}

/// Classify the value `query_arg` by its immediate producer.
pub fn classify(query_arg: u32, defs: &DefMap<'_>) -> TaintVerdict {
    let Some(producer) = defs.get(&query_arg) else {
        // External input with no visible definition. Never SAFE.
        return TaintVerdict::Unknown {
            reason: UnknownReason::OpaqueValue,
        };
    };

    match producer.kind {
        // Rule 1: compile-time constant. The only SAFE outcome for an
        // otherwise-opaque value, and it shadows every later rule.
        ValueKind::Const => TaintVerdict::Safe,

        // Rule 2: parameter of the enclosing function. No
        // inter-procedural tracing, so safety cannot be proven.
        ValueKind::Parameter => TaintVerdict::Unknown {
            reason: UnknownReason::Parameter,
        },

        // Rule 3a: string concatenation.
        ValueKind::BinOp if producer.bin_op.as_deref() == Some("+") => {
            if all_constant(&producer.operands, defs) {
                // Every operand folds to a constant; the result is
                // compile-time determinable.
                TaintVerdict::Safe
            } else {
                TaintVerdict::Unsafe {
                    evidence: producer.id,
                    description: "string concatenation".into(),
                }
            }
        }

        ValueKind::Call => classify_call(producer, defs),

        // Everything else: unrecognized producer shape.
        _ => TaintVerdict::Unknown {
            reason: UnknownReason::UnrecognizedProducer,
        },
    }
}

fn classify_call(producer: &Instruction, defs: &DefMap<'_>) -> TaintVerdict {
    let callee = match producer.callee.as_deref() {
        Some(c) if !producer.callee_is_interface => c,
        _ => {
            return TaintVerdict::Unknown {
                reason: UnknownReason::DynamicCallee,
            }
        }
    };

    // Rule 3b: string formatting with any non-constant operand.
    if is_format_callee(callee) {
        if all_constant(&producer.operands, defs) {
            return TaintVerdict::Safe;
        }
        return TaintVerdict::Unsafe {
            evidence: producer.id,
            description: format!("call to {callee}"),
        };
    }

    // Rule 4: placeholder-safe constructor.
    if is_placeholder_safe(callee) {
        return TaintVerdict::Safe;
    }

    // Rule 5: some other call whose result we cannot characterize.
    TaintVerdict::Unknown {
        reason: UnknownReason::UnrecognizedProducer,
    }
}

/// Whether every operand folds to a compile-time constant. Follows
/// nested concatenations; any other producer shape is non-constant.
fn all_constant(operands: &[u32], defs: &DefMap<'_>) -> bool {
    operands.iter().all(|&id| is_constant(id, defs))
}

fn is_constant(id: u32, defs: &DefMap<'_>) -> bool {
    match defs.get(&id) {
        Some(instr) => match instr.kind {
            ValueKind::Const => true,
            ValueKind::BinOp if instr.bin_op.as_deref() == Some("+") => {
                all_constant(&instr.operands, defs)
            }
            _ => false,
        },
        None => false,
    }
}
