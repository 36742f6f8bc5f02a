//! The `ralph.json` document.

use ralph_analyzer::checker::CompileOptions;
use ralph_analyzer::SourceIndex;
use serde::{Deserialize, Serialize};
use url::Url;

/// The build file as written by the user. Paths are still relative here;
/// validation resolves them against the workspace root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RalphcConfig {
    #[serde(default)]
    pub compiler_options: CompilerOptionsConfig,
    pub contract_path: String,
    pub artifact_path: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CompilerOptionsConfig {
    #[serde(default)]
    pub ignore_unused_variables_warnings: bool,
    #[serde(default)]
    pub ignore_unused_constants_warnings: bool,
    #[serde(default)]
    pub ignore_unused_functions_warnings: bool,
    #[serde(default)]
    pub ignore_update_fields_check_warnings: bool,
    #[serde(default)]
    pub ignore_check_external_caller_warnings: bool,
}

impl CompilerOptionsConfig {
    pub fn to_options(self) -> CompileOptions {
        CompileOptions {
            ignore_unused_variables_warnings: self.ignore_unused_variables_warnings,
            ignore_unused_constants_warnings: self.ignore_unused_constants_warnings,
            ignore_unused_functions_warnings: self.ignore_unused_functions_warnings,
            ignore_update_fields_check_warnings: self.ignore_update_fields_check_warnings,
            ignore_check_external_caller_warnings: self.ignore_check_external_caller_warnings,
        }
    }
}

/// The validated configuration carried by a compiled build: both paths are
/// absolute and inside the workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledConfig {
    pub contract_uri: Url,
    pub artifact_uri: Url,
    pub options: CompileOptions,
}

pub fn parse_config(code: &str) -> Result<RalphcConfig, serde_json::Error> {
    serde_json::from_str(code)
}

/// Turn a serde_json error position (1-based line/column) into a byte
/// offset in `code`.
pub fn error_index(code: &str, error: &serde_json::Error, build_uri: &Url) -> SourceIndex {
    let line = error.line().saturating_sub(1);
    let column = error.column().saturating_sub(1);
    let offset = code
        .lines()
        .take(line)
        .map(|l| l.len() + 1)
        .sum::<usize>()
        + column;
    let offset = offset.min(code.len());
    let width = if offset < code.len() { 1 } else { 0 };
    SourceIndex::new(offset, width, build_uri.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("file:///w/ralph.json").unwrap()
    }

    #[test]
    fn test_parse_minimal_config() {
        let code = r#"{ "contractPath": "contracts", "artifactPath": "artifacts" }"#;
        let config = parse_config(code).unwrap();
        assert_eq!(config.contract_path, "contracts");
        assert_eq!(config.artifact_path, "artifacts");
        assert_eq!(config.compiler_options, CompilerOptionsConfig::default());
    }

    #[test]
    fn test_parse_compiler_options() {
        let code = r#"
{
  "compilerOptions": { "ignoreUnusedVariablesWarnings": true },
  "contractPath": "contracts",
  "artifactPath": "artifacts"
}
"#;
        let config = parse_config(code).unwrap();
        assert!(config.compiler_options.ignore_unused_variables_warnings);
        assert!(!config.compiler_options.ignore_unused_constants_warnings);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let code = r#"{ "contractPath": "c", "artifactPath": "a", "nope": 1 }"#;
        let error = parse_config(code).unwrap_err();
        assert!(error.to_string().contains("nope"));
    }

    #[test]
    fn test_error_index_points_at_the_offending_line() {
        let code = "{\n  \"contractPath\": 42\n}";
        let error = parse_config(code).unwrap_err();
        let index = error_index(code, &error, &uri());
        // The error is somewhere on line 2.
        assert!(index.offset > code.find('\n').unwrap());
        assert!(index.offset <= code.len());
        assert_eq!(index.file, uri());
    }
}
