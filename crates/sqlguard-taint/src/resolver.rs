//! Call resolution: locate sink calls and extract their query argument.
//!
//! The builder encodes method callees as `(<receiver-type>).<method>`
//! (e.g. `(*database/sql.DB).Query`). A sink-shaped call dispatched
//! through an interface value cannot be matched against a concrete
//! receiver type and resolves to a distinct `Dynamic` outcome rather
//! than being silently skipped.

use crate::catalog::SinkCatalog;
use sqlguard_ir::ir::{Instruction, ValueKind};

/// A resolved sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite<'a> {
    pub instruction: &'a Instruction,
    pub receiver: &'a str,
    pub method: &'a str,
    /// Catalog position of the query-text argument.
    pub arg_index: usize,
    /// Value id of the argument at that position.
    pub query_arg: u32,
}

/// Outcome of resolving one instruction against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Not a call instruction.
    NotACall,
    /// A sink-shaped call whose target cannot be determined without
    /// runtime dispatch: the method name matches a catalog entry but the
    /// concrete receiver type is unknown.
    Dynamic,
    /// A call with no catalog entry. Covers dynamically dispatched calls
    /// whose method name no entry tracks; flagging every interface call
    /// in the program would drown real findings.
    NotASink,
    /// Catalog matched, but the call site carries fewer arguments than
    /// arg_index requires. Not an error: the call does not use the
    /// tracked parameter. Counted for catalog-quality diagnostics.
    NoQueryArgument {
        receiver: &'a str,
        method: &'a str,
        arg_index: usize,
        arg_count: usize,
    },
    /// A sink call with its query argument extracted.
    Sink(CallSite<'a>),
}

/// Resolve one instruction against the sink catalog.
pub fn resolve<'a>(instr: &'a Instruction, catalog: &SinkCatalog) -> Resolution<'a> {
    if instr.kind != ValueKind::Call {
        return Resolution::NotACall;
    }

    let Some(callee) = instr.callee.as_deref() else {
        // Closure or function-value invocation: no name to match
        // against the catalog.
        return Resolution::NotASink;
    };

    let Some((receiver, method)) = split_method_callee(callee) else {
        // Plain function, no receiver type: the catalog is keyed on
        // declared receiver types only.
        return Resolution::NotASink;
    };

    if instr.callee_is_interface {
        // The declared callee names the method but the concrete receiver
        // is decided at runtime. Only sink-shaped methods are worth
        // surfacing as unresolvable.
        return if catalog.tracks_method(method) {
            Resolution::Dynamic
        } else {
            Resolution::NotASink
        };
    }

    let Some(arg_index) = catalog.lookup(receiver, method) else {
        return Resolution::NotASink;
    };

    match instr.operands.get(arg_index) {
        Some(&query_arg) => Resolution::Sink(CallSite {
            instruction: instr,
            receiver,
            method,
            arg_index,
            query_arg,
        }),
        None => Resolution::NoQueryArgument {
            receiver,
            method,
            arg_index,
            arg_count: instr.operands.len(),
        },
    }
}

/// Split a `(<receiver>).<method>` callee into its parts.
fn split_method_callee(callee: &str) -> Option<(&str, &str)> {
    let rest = callee.strip_prefix('(')?;
    let close = rest.rfind(")." )?;
    let receiver = &rest[..close];
    let method = &rest[close + 2..];
    if receiver.is_empty() || method.is_empty() {
        return None;
    }
    Some((receiver, method))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlguard_ir::ir::Span;

    fn make_instr(id: u32, kind: ValueKind) -> Instruction {
        Instruction {
            id,
            kind,
            name: format!("t{id}"),
            type_name: None,
            span: Some(Span::new("test.go", id + 10, 1)),
            operands: vec![],
            callee: None,
            callee_is_interface: false,
            const_value: None,
            bin_op: None,
        }
    }

    fn make_call(id: u32, callee: &str, operands: Vec<u32>) -> Instruction {
        let mut instr = make_instr(id, ValueKind::Call);
        instr.callee = Some(callee.into());
        instr.operands = operands;
        instr
    }

    #[test]
    fn test_non_call_is_not_a_call() {
        let catalog = SinkCatalog::with_defaults();
        let instr = make_instr(0, ValueKind::Const);
        assert_eq!(resolve(&instr, &catalog), Resolution::NotACall);
    }

    #[test]
    fn test_sink_call_resolves() {
        let catalog = SinkCatalog::with_defaults();
        let instr = make_call(1, "(*database/sql.DB).Query", vec![7]);
        match resolve(&instr, &catalog) {
            Resolution::Sink(site) => {
                assert_eq!(site.receiver, "*database/sql.DB");
                assert_eq!(site.method, "Query");
                assert_eq!(site.arg_index, 0);
                assert_eq!(site.query_arg, 7);
            }
            other => panic!("expected Sink, got {other:?}"),
        }
    }

    #[test]
    fn test_context_variant_takes_second_argument() {
        let catalog = SinkCatalog::with_defaults();
        let instr = make_call(1, "(*database/sql.DB).QueryContext", vec![3, 9]);
        match resolve(&instr, &catalog) {
            Resolution::Sink(site) => {
                assert_eq!(site.arg_index, 1);
                assert_eq!(site.query_arg, 9);
            }
            other => panic!("expected Sink, got {other:?}"),
        }
    }

    #[test]
    fn test_interface_dispatch_is_dynamic() {
        let catalog = SinkCatalog::with_defaults();
        let mut instr = make_call(1, "(*database/sql.DB).QueryContext", vec![3, 9]);
        instr.callee_is_interface = true;
        assert_eq!(resolve(&instr, &catalog), Resolution::Dynamic);
    }

    #[test]
    fn test_closure_invocation_is_not_a_sink() {
        // No callee name at all: nothing to match the catalog against.
        let catalog = SinkCatalog::with_defaults();
        let mut instr = make_instr(1, ValueKind::Call);
        instr.operands = vec![0];
        assert_eq!(resolve(&instr, &catalog), Resolution::NotASink);
    }

    #[test]
    fn test_non_sink_interface_call_is_not_a_sink() {
        // Interface dispatch to a method no catalog entry tracks must
        // not count as an unresolvable sink.
        let catalog = SinkCatalog::with_defaults();
        let mut instr = make_call(1, "(io.Writer).Write", vec![3]);
        instr.callee_is_interface = true;
        assert_eq!(resolve(&instr, &catalog), Resolution::NotASink);
    }

    #[test]
    fn test_unlisted_method_is_not_a_sink() {
        let catalog = SinkCatalog::with_defaults();
        let instr = make_call(1, "(*database/sql.DB).Ping", vec![]);
        assert_eq!(resolve(&instr, &catalog), Resolution::NotASink);

        let plain = make_call(2, "fmt.Println", vec![0]);
        assert_eq!(resolve(&plain, &catalog), Resolution::NotASink);
    }

    #[test]
    fn test_unrelated_type_sharing_method_name_is_not_a_sink() {
        // Explicit per-type entries only: no structural matching.
        let catalog = SinkCatalog::with_defaults();
        let instr = make_call(1, "(*myapp.Cache).Query", vec![0]);
        assert_eq!(resolve(&instr, &catalog), Resolution::NotASink);
    }

    #[test]
    fn test_arity_mismatch_is_no_query_argument() {
        let catalog = SinkCatalog::with_defaults();
        // QueryContext wants arg 1 but only one operand is present.
        let instr = make_call(1, "(*database/sql.DB).QueryContext", vec![3]);
        assert_eq!(
            resolve(&instr, &catalog),
            Resolution::NoQueryArgument {
                receiver: "*database/sql.DB",
                method: "QueryContext",
                arg_index: 1,
                arg_count: 1,
            }
        );
    }

    #[test]
    fn test_arg_index_zero_with_one_argument_is_in_range() {
        // Prepare takes the query at position 0; a single-argument call
        // site must not be misreported as an arity mismatch.
        let catalog = SinkCatalog::with_defaults();
        let instr = make_call(1, "(*database/sql.Tx).Prepare", vec![4]);
        match resolve(&instr, &catalog) {
            Resolution::Sink(site) => assert_eq!(site.query_arg, 4),
            other => panic!("expected Sink, got {other:?}"),
        }
    }

    #[test]
    fn test_split_method_callee() {
        assert_eq!(
            split_method_callee("(*database/sql.DB).Query"),
            Some(("*database/sql.DB", "Query"))
        );
        assert_eq!(
            split_method_callee("(squirrel.SelectBuilder).ToSql"),
            Some(("squirrel.SelectBuilder", "ToSql"))
        );
        assert_eq!(split_method_callee("os.Getenv"), None);
        assert_eq!(split_method_callee("()."), None);
    }
}
