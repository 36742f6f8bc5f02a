//! Import resolution.
//!
//! Two passes, per the pipeline: a syntactic pass extracting `import "..."`
//! statements straight from the raw text, and a type-check pass matching
//! each import against the `std` dependency sources and the workspace's own
//! files. Only `std` is importable from the dependency side; `built-in` is
//! compiler territory.

use ralph_analyzer::{CompilerMessage, SourceIndex};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use crate::access::RALPH_EXTENSION;
use crate::build::BuildCompiled;
use crate::build::dependency::DependencyId;
use crate::uri;
use crate::workspace::source::SourceParsed;

/// One `import "folder/file"` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// The path as written, quotes stripped.
    pub raw: String,
    pub folder: Option<String>,
    pub file: String,
    /// Range of the quoted literal, quotes included.
    pub index: SourceIndex,
}

/// Whitespace and `//` comments may sit between `import` and its literal.
fn import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\bimport(?:\s|//[^\n]*)*("([^"\n]*)")"#).expect("import pattern is valid")
    })
}

/// Syntactic pass: extract all import statements from `code`.
pub fn extract(code: &str, file_uri: &Url) -> Vec<ImportStatement> {
    import_pattern()
        .captures_iter(code)
        .map(|captures| {
            let quoted = captures.get(1).expect("group 1 always matches");
            let raw = captures.get(2).expect("group 2 always matches").as_str().to_string();
            let (folder, file) = match raw.rsplit_once('/') {
                Some((folder, file)) => (Some(folder.to_string()), file.to_string()),
                None => (None, raw.clone()),
            };
            ImportStatement {
                raw,
                folder,
                file,
                index: SourceIndex::new(quoted.start(), quoted.as_str().len(), file_uri.clone()),
            }
        })
        .collect()
}

/// Type-check pass: resolve every import of `parsed`.
///
/// Returns the dependency sources the imports actually referenced - the
/// extra inputs compilation needs. Imports of sibling workspace files
/// resolve too but add nothing: those files are compile inputs already.
pub fn type_check<'a>(
    parsed: &SourceParsed,
    build: &'a BuildCompiled,
    workspace_files: &[Url],
) -> Result<Vec<&'a SourceParsed>, Vec<CompilerMessage>> {
    let mut referenced = Vec::new();
    let mut errors = Vec::new();

    for statement in &parsed.import_statements {
        match resolve(statement, build, workspace_files) {
            Resolution::Dependency(source) => referenced.push(source),
            Resolution::Workspace => {}
            Resolution::Unknown => {
                errors.push(CompilerMessage::error(
                    format!("Unknown import: \"{}\"", statement.raw),
                    statement.index.clone(),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(referenced)
    } else {
        Err(errors)
    }
}

enum Resolution<'a> {
    Dependency(&'a SourceParsed),
    Workspace,
    Unknown,
}

/// A path matches with or without the `.ral` extension.
fn matches_import(relative: &str, import: &str) -> bool {
    relative == import || relative.strip_suffix(&format!(".{RALPH_EXTENSION}")) == Some(import)
}

fn resolve<'a>(
    statement: &ImportStatement,
    build: &'a BuildCompiled,
    workspace_files: &[Url],
) -> Resolution<'a> {
    let dependency_root = Url::from_file_path(&build.dependency_path).ok();

    if let (Some(std_workspace), Some(root)) =
        (build.find_dependency(DependencyId::Std), dependency_root)
    {
        for source in std_workspace.sources.iter().filter_map(|s| s.parsed_view()) {
            if let Some(relative) = uri::relative_path(&root, &source.file_uri) {
                if matches_import(&relative, &statement.raw) {
                    return Resolution::Dependency(source);
                }
            }
        }
    }

    for file in workspace_files {
        if let Some(relative) = uri::relative_path(&build.config.contract_uri, file) {
            if matches_import(&relative, &statement.raw) {
                return Resolution::Workspace;
            }
        }
    }

    Resolution::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("file:///w/contracts/a.ral").unwrap()
    }

    #[test]
    fn test_extract_plain_import() {
        let code = "import \"std/nft_interface\"\nContract A() { }";
        let imports = extract(code, &uri());
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].raw, "std/nft_interface");
        assert_eq!(imports[0].folder.as_deref(), Some("std"));
        assert_eq!(imports[0].file, "nft_interface");
        assert_eq!(imports[0].index.offset, code.find('"').unwrap());
        assert_eq!(imports[0].index.width, "\"std/nft_interface\"".len());
    }

    #[test]
    fn test_extract_without_folder() {
        let imports = extract("import \"A\"", &uri());
        assert_eq!(imports[0].folder, None);
        assert_eq!(imports[0].file, "A");
    }

    #[test]
    fn test_extract_allows_comments_before_the_literal() {
        let code = "import // explains why\n  \"std/nft_interface\"";
        let imports = extract(code, &uri());
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].raw, "std/nft_interface");
    }

    #[test]
    fn test_extract_ignores_other_statements() {
        let code = "Contract A() { }\nimport \"x\"\nContract B() { }";
        assert_eq!(extract(code, &uri()).len(), 1);
    }

    #[test]
    fn test_matches_with_and_without_extension() {
        assert!(matches_import("std/nft_interface.ral", "std/nft_interface"));
        assert!(matches_import("std/nft_interface.ral", "std/nft_interface.ral"));
        assert!(!matches_import("std/nft_interface.ral", "std/nft"));
    }
}
