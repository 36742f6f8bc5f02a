// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dependency loader.
//!
//! The `std` library and the compiler's built-in signatures ship inside
//! this binary. On the first successful build compile they are written
//! under the dependency root (files that already exist are left untouched,
//! even when their content differs) and compiled into sub-workspaces that
//! the rest of the pipeline treats like any other compiled workspace.

use std::path::{Path, PathBuf};

use ralph_analyzer::checker::CompileOptions;
use ralph_analyzer::{CompilerMessage, SourceIndex};
use url::Url;

use crate::access::FileAccess;
use crate::build::config::{CompiledConfig, CompilerOptionsConfig, RalphcConfig};
use crate::build::{BuildCompiled, BUILD_FILE_NAME};
use crate::compiler;
use crate::workspace::source::{SourceCodeState, SourceCompiled, SourceParsed};
use crate::workspace::{WorkspaceCompiled, WorkspaceParsed};

/// Which bundled dependency a sub-workspace holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyId {
    /// User-importable standard library.
    Std,
    /// Compiler intrinsics. Not importable; consulted by go-to-definition
    /// and completion.
    BuiltIn,
}

impl DependencyId {
    pub fn dir_name(self) -> &'static str {
        match self {
            DependencyId::Std => "std",
            DependencyId::BuiltIn => "built-in",
        }
    }
}

/// One compiled dependency sub-workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDependency {
    pub id: DependencyId,
    pub workspace: WorkspaceCompiled,
}

/// Bundled sources, as `(path relative to the dependency root, code)`.
const STD_SOURCES: &[(&str, &str)] = &[
    (
        "std/fungible_token_interface.ral",
        include_str!("../../resources/std/fungible_token_interface.ral"),
    ),
    ("std/nft_interface.ral", include_str!("../../resources/std/nft_interface.ral")),
    (
        "std/nft_collection_interface.ral",
        include_str!("../../resources/std/nft_collection_interface.ral"),
    ),
];

const BUILT_IN_SOURCES: &[(&str, &str)] =
    &[("built-in/built_in.ral", include_str!("../../resources/built-in/built_in.ral"))];

/// Default dependency root: `$RALPH_LSP_HOME` or `$HOME/.ralph-lsp`, plus
/// `dependencies`.
pub fn default_root() -> Option<PathBuf> {
    let home = std::env::var("RALPH_LSP_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".ralph-lsp")))
        .ok()?;
    Some(home.join("dependencies"))
}

/// Materialize and compile both bundled dependencies.
///
/// Failures convert to a single `CompilerMessage` anchored at the build
/// file so the editor has somewhere to show them.
pub fn compile_all(
    build_uri: &Url,
    dependency_root: &Path,
    options: &CompileOptions,
    access: &dyn FileAccess,
) -> Result<Vec<CompiledDependency>, Vec<CompilerMessage>> {
    let bundles = [(DependencyId::Std, STD_SOURCES), (DependencyId::BuiltIn, BUILT_IN_SOURCES)];

    let mut dependencies = Vec::new();
    for (id, bundle) in bundles {
        let workspace = compile_bundle(id, bundle, build_uri, dependency_root, options, access)
            .map_err(|message| vec![message])?;
        dependencies.push(CompiledDependency { id, workspace });
    }
    Ok(dependencies)
}

fn download_error(id: DependencyId, detail: impl std::fmt::Display, build_uri: &Url) -> CompilerMessage {
    CompilerMessage::error(
        format!("Failed to load dependency `{}`: {detail}", id.dir_name()),
        SourceIndex::zero(build_uri.clone()),
    )
}

fn compile_bundle(
    id: DependencyId,
    bundle: &[(&str, &str)],
    build_uri: &Url,
    dependency_root: &Path,
    options: &CompileOptions,
    access: &dyn FileAccess,
) -> Result<WorkspaceCompiled, CompilerMessage> {
    let root_path = dependency_root.join(id.dir_name());
    let root_uri = Url::from_file_path(&root_path)
        .map_err(|()| download_error(id, "dependency root is not an absolute path", build_uri))?;

    // Extract, without overwriting anything already on disk.
    let mut parsed_sources = Vec::new();
    for (relative, code) in bundle {
        let file_uri = Url::from_file_path(dependency_root.join(relative))
            .map_err(|()| download_error(id, "dependency root is not an absolute path", build_uri))?;

        let exists = access
            .exists(&file_uri)
            .map_err(|error| download_error(id, &error, build_uri))?;
        if !exists {
            access
                .write(&file_uri, code)
                .map_err(|error| download_error(id, &error, build_uri))?;
        }

        match compiler::parse_source(&file_uri, code) {
            Ok(ast) => parsed_sources.push(SourceParsed {
                file_uri,
                code: code.to_string(),
                import_statements: Vec::new(),
                ast,
            }),
            Err(error) => return Err(download_error(id, &error.message, build_uri)),
        }
    }

    // Compile the bundle against itself through the ordinary pipeline.
    let inputs: Vec<&SourceParsed> = parsed_sources.iter().collect();
    let result = compiler::compile_sources(&inputs, &[], options);

    let mut compiled_sources = Vec::new();
    for (parsed, outcome) in parsed_sources.iter().zip(result.outcomes) {
        match outcome.result {
            Ok(output) => compiled_sources.push(SourceCodeState::Compiled(SourceCompiled {
                file_uri: parsed.file_uri.clone(),
                code: parsed.code.clone(),
                parsed: parsed.clone(),
                warnings: output.warnings,
                compiled_contracts: output.contracts,
            })),
            Err(errors) => {
                let detail = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "compilation failed".to_string());
                return Err(download_error(id, &detail, build_uri));
            }
        }
    }

    // A synthetic build so the sub-workspace is a regular workspace.
    let config = RalphcConfig {
        compiler_options: CompilerOptionsConfig::default(),
        contract_path: ".".to_string(),
        artifact_path: ".".to_string(),
    };
    let build = BuildCompiled {
        build_uri: Url::from_file_path(root_path.join(BUILD_FILE_NAME))
            .map_err(|()| download_error(id, "dependency root is not an absolute path", build_uri))?,
        code: serde_json::to_string_pretty(&config)
            .map_err(|error| download_error(id, &error, build_uri))?,
        config: CompiledConfig {
            contract_uri: root_uri.clone(),
            artifact_uri: root_uri.clone(),
            options: *options,
        },
        dependencies: Vec::new(),
        dependency_path: dependency_root.to_path_buf(),
    };

    let parsed_snapshot = WorkspaceParsed {
        workspace_uri: root_uri.clone(),
        build: build.clone(),
        sources: parsed_sources.into_iter().map(SourceCodeState::Parsed).collect(),
    };

    Ok(WorkspaceCompiled {
        workspace_uri: root_uri,
        build,
        sources: compiled_sources,
        parsed: Box::new(parsed_snapshot),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DiskAccess;

    fn build_uri() -> Url {
        Url::parse("file:///w/ralph.json").unwrap()
    }

    #[test]
    fn test_bundles_extract_and_compile() {
        let root = tempfile::tempdir().unwrap();
        let dependencies =
            compile_all(&build_uri(), root.path(), &CompileOptions::default(), &DiskAccess)
                .expect("bundled dependencies should compile");

        assert_eq!(dependencies.len(), 2);
        assert_eq!(dependencies[0].id, DependencyId::Std);
        assert_eq!(dependencies[1].id, DependencyId::BuiltIn);

        assert!(root.path().join("std/nft_interface.ral").is_file());
        assert!(root.path().join("built-in/built_in.ral").is_file());

        // Every bundled source compiled.
        for dependency in &dependencies {
            for source in &dependency.workspace.sources {
                assert!(matches!(source, SourceCodeState::Compiled(_)));
            }
        }
    }

    #[test]
    fn test_existing_files_are_never_overwritten() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("std/nft_interface.ral");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, "// locally patched\nInterface INFT { }\n").unwrap();

        compile_all(&build_uri(), root.path(), &CompileOptions::default(), &DiskAccess).unwrap();

        let kept = std::fs::read_to_string(&target).unwrap();
        assert!(kept.starts_with("// locally patched"));
    }

    #[test]
    fn test_second_extraction_reuses_files() {
        let root = tempfile::tempdir().unwrap();
        compile_all(&build_uri(), root.path(), &CompileOptions::default(), &DiskAccess).unwrap();
        let modified_before =
            std::fs::metadata(root.path().join("std/nft_interface.ral")).unwrap().modified().unwrap();

        compile_all(&build_uri(), root.path(), &CompileOptions::default(), &DiskAccess).unwrap();
        let modified_after =
            std::fs::metadata(root.path().join("std/nft_interface.ral")).unwrap().modified().unwrap();
        assert_eq!(modified_before, modified_after);
    }
}
