//! Build file validation: location, path containment, path existence.

use ralph_analyzer::{CompilerMessage, SourceIndex};
use url::Url;

use crate::access::FileAccess;
use crate::build::{BuildParsed, BUILD_FILE_NAME};
use crate::build::config::CompiledConfig;
use crate::uri;

/// The build file must sit directly in the workspace root.
pub fn validate_build_uri(build_uri: &Url, workspace_uri: &Url) -> Result<(), CompilerMessage> {
    let expected = uri::join(workspace_uri, BUILD_FILE_NAME);
    if expected.as_ref() == Some(build_uri) {
        Ok(())
    } else {
        Err(CompilerMessage::error(
            format!(
                "Invalid build file location: expected `{BUILD_FILE_NAME}` in the workspace root `{workspace_uri}`"
            ),
            SourceIndex::zero(build_uri.clone()),
        ))
    }
}

/// Validate a parsed build's paths against the workspace.
///
/// All errors are accumulated; validation never fails hard. A path that
/// escapes the workspace is reported once and its existence probe is
/// skipped.
pub fn validate(
    parsed: &BuildParsed,
    workspace_uri: &Url,
    access: &dyn FileAccess,
) -> Result<CompiledConfig, Vec<CompilerMessage>> {
    let mut errors = Vec::new();

    let contract_uri = validate_path(
        &parsed.config.contract_path,
        parsed,
        workspace_uri,
        access,
        &mut errors,
    );
    let artifact_uri = validate_path(
        &parsed.config.artifact_path,
        parsed,
        workspace_uri,
        access,
        &mut errors,
    );

    match (contract_uri, artifact_uri) {
        (Some(contract_uri), Some(artifact_uri)) if errors.is_empty() => Ok(CompiledConfig {
            contract_uri,
            artifact_uri,
            options: parsed.config.compiler_options.to_options(),
        }),
        _ => Err(errors),
    }
}

fn validate_path(
    relative: &str,
    parsed: &BuildParsed,
    workspace_uri: &Url,
    access: &dyn FileAccess,
    errors: &mut Vec<CompilerMessage>,
) -> Option<Url> {
    let index = last_occurrence_index(&parsed.code, relative, &parsed.build_uri);

    let resolved = match uri::join(workspace_uri, relative) {
        Some(resolved) => resolved,
        None => {
            errors.push(CompilerMessage::error(
                format!("Directory \"{relative}\" is not a valid path"),
                index,
            ));
            return None;
        }
    };

    if !uri::contains(workspace_uri, &resolved) {
        errors.push(CompilerMessage::error(
            format!("Directory \"{relative}\" is outside the workspace"),
            index,
        ));
        return None;
    }

    match access.exists(&resolved) {
        Ok(true) => Some(resolved),
        Ok(false) => {
            errors.push(CompilerMessage::error(
                format!("Directory \"{relative}\" does not exist"),
                index,
            ));
            None
        }
        Err(error) => {
            errors.push(CompilerMessage::error(error.to_string(), index));
            None
        }
    }
}

/// Index of the last textual occurrence of `literal` in the build file.
///
/// Placeholder until the parsed build carries an index per value: reporting
/// the last occurrence matches what the diagnostics have always shown, but
/// an identical literal appearing twice anchors on the wrong one.
fn last_occurrence_index(code: &str, literal: &str, build_uri: &Url) -> SourceIndex {
    match code.rfind(literal) {
        Some(offset) => SourceIndex::new(offset, literal.len(), build_uri.clone()),
        None => SourceIndex::zero(build_uri.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::config::parse_config;

    fn url(path: &str) -> Url {
        Url::parse(&format!("file://{path}")).unwrap()
    }

    struct FixedAccess {
        existing: Vec<Url>,
    }

    impl FileAccess for FixedAccess {
        fn read(&self, uri: &Url) -> Result<String, crate::access::AccessError> {
            Err(crate::access::AccessError::NotFound(uri.clone()))
        }
        fn write(&self, uri: &Url, _code: &str) -> Result<Url, crate::access::AccessError> {
            Ok(uri.clone())
        }
        fn exists(&self, uri: &Url) -> Result<bool, crate::access::AccessError> {
            Ok(self.existing.contains(uri))
        }
        fn list(&self, _dir: &Url) -> Result<Vec<Url>, crate::access::AccessError> {
            Ok(Vec::new())
        }
    }

    fn parsed(code: &str) -> BuildParsed {
        BuildParsed {
            build_uri: url("/w/ralph.json"),
            code: code.to_string(),
            config: parse_config(code).unwrap(),
        }
    }

    #[test]
    fn test_build_file_must_be_in_the_workspace_root() {
        let workspace = url("/w");
        assert!(validate_build_uri(&url("/w/ralph.json"), &workspace).is_ok());

        let error = validate_build_uri(&url("/w/nested/ralph.json"), &workspace).unwrap_err();
        assert!(error.message.contains("Invalid build file location"));
    }

    #[test]
    fn test_valid_paths_become_absolute_uris() {
        let code = r#"{ "contractPath": "contracts", "artifactPath": "artifacts" }"#;
        let access = FixedAccess { existing: vec![url("/w/contracts"), url("/w/artifacts")] };

        let config = validate(&parsed(code), &url("/w"), &access).unwrap();
        assert_eq!(config.contract_uri, url("/w/contracts"));
        assert_eq!(config.artifact_uri, url("/w/artifacts"));
    }

    #[test]
    fn test_escaping_path_reports_one_error_anchored_at_last_occurrence() {
        let code = r#"{ "contractPath": "contracts", "artifactPath": "../outside" }"#;
        let access = FixedAccess { existing: vec![url("/w/contracts")] };

        let errors = validate(&parsed(code), &url("/w"), &access).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("outside the workspace"));
        assert_eq!(errors[0].index.offset, code.rfind("../outside").unwrap());
        assert_eq!(errors[0].index.width, "../outside".len());
    }

    #[test]
    fn test_missing_directories_accumulate() {
        let code = r#"{ "contractPath": "contracts", "artifactPath": "artifacts" }"#;
        let access = FixedAccess { existing: Vec::new() };

        let errors = validate(&parsed(code), &url("/w"), &access).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.message.contains("does not exist")));
    }
}
