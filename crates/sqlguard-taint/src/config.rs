//! Configuration loading from sqlguard.toml.

use crate::catalog::SinkSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaintConfig {
    /// Extra sink entries; extend or override the compiled-in defaults.
    pub catalog: Vec<SinkSpec>,
    /// Also emit lower-severity findings for UNKNOWN verdicts.
    pub report_unknown: bool,
}

/// Find and load sqlguard.toml, walking up from `start_dir`.
/// Returns default config if no file found or the file is unreadable.
pub fn load_config(start_dir: &Path) -> TaintConfig {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = std::fs::read_to_string(&path).unwrap_or_default();
            toml::from_str(&content).unwrap_or_default()
        }
        None => TaintConfig::default(),
    }
}

/// Walk up directories looking for sqlguard.toml.
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join("sqlguard.toml");
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Annotated template consumers can write out as a starting
/// sqlguard.toml.
pub const DEFAULT_CONFIG_TOML: &str = r#"# report_unknown = false
#
# Extra sink entries; each extends or overrides the built-in
# database/sql table. arg_index is the zero-based position of the
# query-text argument.
#
# [[catalog]]
# receiver = "*github.com/jmoiron/sqlx.DB"
# method = "Queryx"
# arg_index = 0
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = TaintConfig::default();
        assert!(cfg.catalog.is_empty());
        assert!(!cfg.report_unknown);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
report_unknown = true

[[catalog]]
receiver = "*github.com/jmoiron/sqlx.DB"
method = "Queryx"
arg_index = 0

[[catalog]]
receiver = "*database/sql.DB"
method = "Query"
arg_index = 2
"#;
        let cfg: TaintConfig = toml::from_str(toml_str).unwrap();
        assert!(cfg.report_unknown);
        assert_eq!(cfg.catalog.len(), 2);
        assert_eq!(cfg.catalog[0].receiver, "*github.com/jmoiron/sqlx.DB");
        assert_eq!(cfg.catalog[0].method, "Queryx");
        assert_eq!(cfg.catalog[1].arg_index, 2);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: TaintConfig = toml::from_str("report_unknown = true").unwrap();
        assert!(cfg.report_unknown);
        assert!(cfg.catalog.is_empty());
    }

    #[test]
    fn test_default_config_toml_parses() {
        let cfg: TaintConfig = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert!(!cfg.report_unknown);
        assert!(cfg.catalog.is_empty());
    }

    #[test]
    fn test_load_config_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join("sqlguard.toml"),
            "report_unknown = true\n",
        )
        .unwrap();

        let cfg = load_config(&nested);
        assert!(cfg.report_unknown);
    }

    #[test]
    fn test_load_config_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(dir.path());
        assert!(!cfg.report_unknown);
        assert!(cfg.catalog.is_empty());
    }
}
