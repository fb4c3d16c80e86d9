//! Analysis driver: walk every function, resolve sink calls, classify
//! their query arguments, and collect findings.
//!
//! Functions are independent units of work over already-materialized IR,
//! so they are classified in parallel; per-function finding buffers are
//! merged in input order, keeping the output deterministic.

use crate::catalog::{CatalogError, SinkCatalog};
use crate::classifier::{self, DefMap, TaintVerdict, UnknownReason};
use crate::config::TaintConfig;
use crate::resolver::{self, CallSite, Resolution};
use rayon::prelude::*;
use serde::Serialize;
use sqlguard_ir::cfg::Cfg;
use sqlguard_ir::ir::{AnalysisInput, Function, Instruction};
use sqlguard_diagnostics::finding::{Evidence, Finding, Location, Severity};

/// Counters for catalog-quality diagnostics. These never become
/// user-facing findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    pub functions_analyzed: usize,
    /// Resolved sink calls whose query argument was classified.
    pub sink_calls: usize,
    /// Sink-shaped calls whose concrete receiver could not be resolved.
    pub dynamic_callees: usize,
    /// Catalog matches where the call site had too few arguments.
    pub arity_mismatches: usize,
}

impl AnalysisStats {
    fn merge(&mut self, other: AnalysisStats) {
        self.functions_analyzed += other.functions_analyzed;
        self.sink_calls += other.sink_calls;
        self.dynamic_callees += other.dynamic_callees;
        self.arity_mismatches += other.arity_mismatches;
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub findings: Vec<Finding>,
    pub stats: AnalysisStats,
}

/// The analysis pass. Holds the validated catalog; read-only after
/// construction, safe to share across workers.
#[derive(Debug, Clone)]
pub struct TaintAnalyzer {
    catalog: SinkCatalog,
    report_unknown: bool,
}

impl TaintAnalyzer {
    /// Build the analyzer from configuration. Catalog misconfiguration
    /// is the only failure mode of the whole run.
    pub fn new(config: &TaintConfig) -> Result<Self, CatalogError> {
        Ok(Self {
            catalog: SinkCatalog::build(&config.catalog)?,
            report_unknown: config.report_unknown,
        })
    }

    /// Analyze every function of every package.
    pub fn analyze(&self, input: &AnalysisInput) -> AnalysisOutput {
        let functions: Vec<&Function> = input
            .packages
            .iter()
            .flat_map(|pkg| pkg.functions.iter())
            .collect();

        let per_function: Vec<(Vec<Finding>, AnalysisStats)> = functions
            .par_iter()
            .map(|func| self.analyze_function(func))
            .collect();

        let mut findings = Vec::new();
        let mut stats = AnalysisStats::default();
        for (f, s) in per_function {
            findings.extend(f);
            stats.merge(s);
        }

        tracing::info!(
            functions = stats.functions_analyzed,
            sink_calls = stats.sink_calls,
            findings = findings.len(),
            "taint analysis complete"
        );
        AnalysisOutput { findings, stats }
    }

    /// Analyze one function. Sequential; findings are in visit order.
    fn analyze_function(&self, func: &Function) -> (Vec<Finding>, AnalysisStats) {
        let mut findings = Vec::new();
        let mut stats = AnalysisStats {
            functions_analyzed: 1,
            ..AnalysisStats::default()
        };

        let cfg = Cfg::from_function(func);
        let defs = classifier::build_defs(cfg.instructions());

        for instr in cfg.instructions() {
            match resolver::resolve(instr, &self.catalog) {
                Resolution::NotACall | Resolution::NotASink => {}
                Resolution::Dynamic => {
                    stats.dynamic_callees += 1;
                    if self.report_unknown {
                        findings.push(unknown_finding(
                            func,
                            instr,
                            UnknownReason::DynamicCallee,
                        ));
                    }
                }
                Resolution::NoQueryArgument {
                    receiver,
                    method,
                    arg_index,
                    arg_count,
                } => {
                    stats.arity_mismatches += 1;
                    tracing::debug!(
                        function = %func.name,
                        receiver,
                        method,
                        arg_index,
                        arg_count,
                        "sink call has no query argument"
                    );
                }
                Resolution::Sink(site) => {
                    stats.sink_calls += 1;
                    let verdict = classifier::classify(site.query_arg, &defs);
                    if let Some(finding) = self.verdict_to_finding(func, &site, verdict, &defs) {
                        findings.push(finding);
                    }
                }
            }
        }

        (findings, stats)
    }

    fn verdict_to_finding(
        &self,
        func: &Function,
        site: &CallSite<'_>,
        verdict: TaintVerdict,
        defs: &DefMap<'_>,
    ) -> Option<Finding> {
        match verdict {
            TaintVerdict::Safe => None,
            TaintVerdict::Unsafe {
                evidence,
                description,
            } => Some(Finding {
                rule: "SQL001".into(),
                severity: Severity::Warning,
                message: format!(
                    "query passed to {} is built by {} from non-constant input in {}",
                    site.method, description, func.name
                ),
                location: instr_location(site.instruction),
                evidence: Some(Evidence {
                    instruction_id: evidence,
                    description,
                    location: defs
                        .get(&evidence)
                        .and_then(|producer| producer.span.as_ref())
                        .map(span_location),
                }),
            }),
            TaintVerdict::Unknown { reason } => {
                if !self.report_unknown {
                    return None;
                }
                Some(Finding {
                    rule: "SQL002".into(),
                    severity: Severity::Info,
                    message: format!(
                        "query passed to {} could not be proven safe: {}",
                        site.method,
                        reason.describe()
                    ),
                    location: instr_location(site.instruction),
                    evidence: None,
                })
            }
        }
    }
}

fn unknown_finding(func: &Function, instr: &Instruction, reason: UnknownReason) -> Finding {
    Finding {
        rule: "SQL002".into(),
        severity: Severity::Info,
        message: format!(
            "call in {} could not be resolved: {}",
            func.name,
            reason.describe()
        ),
        location: instr_location(instr),
        evidence: None,
    }
}

/// Missing spans degrade to an unknown location; reporting never fails.
fn instr_location(instr: &Instruction) -> Location {
    instr
        .span
        .as_ref()
        .map(span_location)
        .unwrap_or_else(Location::unknown)
}

fn span_location(span: &sqlguard_ir::ir::Span) -> Location {
    Location {
        file: span.file.clone(),
        line: span.start_line,
        column: span.start_col,
    }
}
