// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! The build-file lifecycle: parse -> validate -> load dependencies.
//!
//! A build starts as raw `ralph.json` text and ends as [`BuildCompiled`]:
//! absolute, workspace-contained paths plus the compiled `std` and
//! `built-in` dependency sub-workspaces. Every failure mode lands in
//! [`BuildErrored`] with its diagnostics; nothing here panics or throws
//! past the state machine.

pub mod config;
pub mod dependency;
pub mod validator;

use std::path::{Path, PathBuf};

use ralph_analyzer::{CompilerMessage, SourceIndex};
use url::Url;

use crate::access::FileAccess;
use crate::build::config::{CompiledConfig, RalphcConfig};
use crate::build::dependency::{CompiledDependency, DependencyId};
use crate::workspace::source::SourceParsed;
use crate::workspace::WorkspaceCompiled;

/// Name of the build file, always directly in the workspace root.
pub const BUILD_FILE_NAME: &str = "ralph.json";

/// JSON parsed, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildParsed {
    pub build_uri: Url,
    pub code: String,
    pub config: RalphcConfig,
}

/// A fully validated build with its dependencies compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildCompiled {
    pub build_uri: Url,
    pub code: String,
    pub config: CompiledConfig,
    pub dependencies: Vec<CompiledDependency>,
    pub dependency_path: PathBuf,
}

impl BuildCompiled {
    pub fn find_dependency(&self, id: DependencyId) -> Option<&WorkspaceCompiled> {
        self.dependencies.iter().find(|dep| dep.id == id).map(|dep| &dep.workspace)
    }

    /// Parsed views of every dependency source, `std` first.
    pub fn dependency_sources(&self) -> impl Iterator<Item = &SourceParsed> {
        self.dependencies
            .iter()
            .flat_map(|dep| dep.workspace.sources.iter())
            .filter_map(|state| state.parsed_view())
    }
}

/// A failed build. The last raw code is kept when it was readable, and a
/// previously compiled workspace may be retained for recovery once the
/// build file is fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildErrored {
    pub build_uri: Url,
    pub code: Option<String>,
    pub errors: Vec<CompilerMessage>,
    pub dependencies: Vec<CompiledDependency>,
    pub activate_workspace: Option<Box<WorkspaceCompiled>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildState {
    Parsed(BuildParsed),
    Compiled(Box<BuildCompiled>),
    Errored(Box<BuildErrored>),
}

impl BuildState {
    pub fn build_uri(&self) -> &Url {
        match self {
            BuildState::Parsed(parsed) => &parsed.build_uri,
            BuildState::Compiled(compiled) => &compiled.build_uri,
            BuildState::Errored(errored) => &errored.build_uri,
        }
    }
}

/// Parse the raw JSON of a build file.
pub fn parse(build_uri: Url, code: String) -> BuildState {
    match config::parse_config(&code) {
        Ok(config) => BuildState::Parsed(BuildParsed { build_uri, code, config }),
        Err(error) => {
            let index = config::error_index(&code, &error, &build_uri);
            let message = CompilerMessage::error(error.to_string(), index);
            BuildState::Errored(Box::new(BuildErrored {
                build_uri,
                code: Some(code),
                errors: vec![message],
                dependencies: Vec::new(),
                activate_workspace: None,
            }))
        }
    }
}

/// Run the whole build pipeline for one build-file event.
///
/// `code` is the editor's in-memory text when it has one; otherwise the
/// file is read from disk.
pub fn parse_and_compile(
    build_uri: &Url,
    code: Option<String>,
    workspace_uri: &Url,
    dependency_root: &Path,
    access: &dyn FileAccess,
) -> BuildState {
    let errored = |code: Option<String>, errors: Vec<CompilerMessage>| {
        BuildState::Errored(Box::new(BuildErrored {
            build_uri: build_uri.clone(),
            code,
            errors,
            dependencies: Vec::new(),
            activate_workspace: None,
        }))
    };

    if let Err(error) = validator::validate_build_uri(build_uri, workspace_uri) {
        return errored(code, vec![error]);
    }

    let code = match code {
        Some(code) => code,
        None => match access.read(build_uri) {
            Ok(code) => code,
            Err(error) => {
                let message = CompilerMessage::error(
                    error.to_string(),
                    SourceIndex::zero(build_uri.clone()),
                );
                return errored(None, vec![message]);
            }
        },
    };

    let parsed = match parse(build_uri.clone(), code) {
        BuildState::Parsed(parsed) => parsed,
        other => return other,
    };

    let config = match validator::validate(&parsed, workspace_uri, access) {
        Ok(config) => config,
        Err(errors) => return errored(Some(parsed.code), errors),
    };

    let dependencies =
        match dependency::compile_all(build_uri, dependency_root, &config.options, access) {
            Ok(dependencies) => dependencies,
            Err(errors) => return errored(Some(parsed.code), errors),
        };

    BuildState::Compiled(Box::new(BuildCompiled {
        build_uri: build_uri.clone(),
        code: parsed.code,
        config,
        dependencies,
        dependency_path: dependency_root.to_path_buf(),
    }))
}
