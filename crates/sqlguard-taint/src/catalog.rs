//! Sink catalog: which database-API calls consume query text, and where.
//!
//! The catalog maps a declared receiver type plus method name to the
//! positional argument carrying the query string. Entries are explicit per
//! type — a handle type and a transaction type exposing the same query
//! methods are both listed, and no structural matching is attempted, so
//! unrelated types that happen to share method names never match.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// One catalog entry: (receiver type, method) -> query-argument position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkSpec {
    /// Declared receiver type as spelled in the program's type system
    /// (e.g. "*database/sql.DB").
    pub receiver: String,
    /// Method name on the receiver (e.g. "QueryContext").
    pub method: String,
    /// Zero-based position of the query-text argument.
    pub arg_index: usize,
}

impl SinkSpec {
    pub fn new(receiver: impl Into<String>, method: impl Into<String>, arg_index: usize) -> Self {
        Self {
            receiver: receiver.into(),
            method: method.into(),
            arg_index,
        }
    }
}

/// Catalog misconfiguration. Fatal to the run, surfaced before any
/// function is scanned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("conflicting catalog entries for {receiver}.{method}: arg_index {first} vs {second}")]
    ConflictingEntry {
        receiver: String,
        method: String,
        first: usize,
        second: usize,
    },
    #[error("catalog entry for method {method:?} has an empty receiver type")]
    EmptyReceiver { method: String },
    #[error("catalog entry for receiver {receiver:?} has an empty method name")]
    EmptyMethod { receiver: String },
}

/// Validated, immutable sink table. Built once at startup, read-only
/// thereafter.
#[derive(Debug, Clone)]
pub struct SinkCatalog {
    entries: HashMap<(String, String), usize>,
}

impl SinkCatalog {
    /// Compiled-in entries: the database/sql query-method families.
    /// Context variants take the query at position 1, after the context.
    pub fn default_specs() -> Vec<SinkSpec> {
        let mut specs = Vec::new();
        for receiver in ["*database/sql.DB", "*database/sql.Tx"] {
            for method in ["Exec", "Query", "QueryRow", "Prepare"] {
                specs.push(SinkSpec::new(receiver, method, 0));
                specs.push(SinkSpec::new(receiver, format!("{method}Context"), 1));
            }
        }
        specs
    }

    /// Build the catalog from the defaults extended/overridden by `extra`.
    ///
    /// A user entry replaces the default for the same (receiver, method).
    /// Two user entries for the same pair with differing arg_index are a
    /// contradiction and fail construction.
    pub fn build(extra: &[SinkSpec]) -> Result<Self, CatalogError> {
        let mut entries = HashMap::new();
        for spec in Self::default_specs() {
            entries.insert((spec.receiver, spec.method), spec.arg_index);
        }

        let mut seen: HashMap<(String, String), usize> = HashMap::new();
        for spec in extra {
            if spec.receiver.is_empty() {
                return Err(CatalogError::EmptyReceiver {
                    method: spec.method.clone(),
                });
            }
            if spec.method.is_empty() {
                return Err(CatalogError::EmptyMethod {
                    receiver: spec.receiver.clone(),
                });
            }
            let key = (spec.receiver.clone(), spec.method.clone());
            if let Some(&prev) = seen.get(&key) {
                if prev != spec.arg_index {
                    return Err(CatalogError::ConflictingEntry {
                        receiver: spec.receiver.clone(),
                        method: spec.method.clone(),
                        first: prev,
                        second: spec.arg_index,
                    });
                }
            }
            seen.insert(key.clone(), spec.arg_index);
            entries.insert(key, spec.arg_index);
        }

        Ok(Self { entries })
    }

    /// Catalog with only the compiled-in defaults.
    pub fn with_defaults() -> Self {
        let mut entries = HashMap::new();
        for spec in Self::default_specs() {
            entries.insert((spec.receiver, spec.method), spec.arg_index);
        }
        Self { entries }
    }

    /// Pure lookup. Absence means "not a sink we track", never an error.
    pub fn lookup(&self, receiver: &str, method: &str) -> Option<usize> {
        self.entries
            .get(&(receiver.to_owned(), method.to_owned()))
            .copied()
    }

    /// Whether any entry, under any receiver type, tracks this method
    /// name. Used to decide if a dynamically dispatched call is
    /// sink-shaped at all.
    pub fn tracks_method(&self, method: &str) -> bool {
        self.entries.keys().any(|(_, m)| m == method)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Check if a callee is a recognized placeholder-safe constructor: a
/// helper known to bind parameters separately from the query text, so a
/// value produced by it is safe to pass as query text.
pub fn is_placeholder_safe(callee: &str) -> bool {
    if callee == "database/sql.Named" {
        return true;
    }
    // Parameter-binding query builders expose a ToSql finalizer that
    // returns the placeholder query plus its bound arguments.
    callee.contains("squirrel.") && callee.ends_with(".ToSql")
}
