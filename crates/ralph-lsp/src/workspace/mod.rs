// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! The workspace state machine.
//!
//! One workspace per server. The lifecycle is
//! `Created -> UnCompiled -> Parsed -> Compiled | Errored`, with editor
//! events sending the affected files (and so the workspace) back to
//! `UnCompiled`. Every operation here is a pure function from state to
//! state; the server adapter owns the single mutable cell these states
//! live in.

pub mod imports;
pub mod source;

use std::collections::HashMap;
use std::path::Path;

use ralph_analyzer::{CompilerMessage, SourceAst, SourceIndex};
use url::Url;

use crate::access::FileAccess;
use crate::build::{self, BuildCompiled, BuildErrored, BuildState, BUILD_FILE_NAME};
use crate::compiler;
use crate::uri;
use self::source::{SourceCodeState, SourceCompiled, SourceParsed};

/// No build loaded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub workspace_uri: Url,
}

/// A valid build plus sources, at least one of which is not yet parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceUnCompiled {
    pub workspace_uri: Url,
    pub build: BuildCompiled,
    pub sources: Vec<SourceCodeState>,
}

/// All sources parsed, compilation not yet run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceParsed {
    pub workspace_uri: Url,
    pub build: BuildCompiled,
    pub sources: Vec<SourceCodeState>,
}

/// A compile ran. Individual sources may still carry their own errors;
/// `parsed` keeps the pre-compile snapshot for diffing.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceCompiled {
    pub workspace_uri: Url,
    pub build: BuildCompiled,
    pub sources: Vec<SourceCodeState>,
    pub parsed: Box<WorkspaceParsed>,
}

/// Workspace-level failure: a broken build, or compiler errors that cannot
/// be attributed to any single file.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceErrored {
    pub workspace_uri: Url,
    pub build: Option<Box<BuildErrored>>,
    pub errors: Vec<CompilerMessage>,
    pub sources: Vec<SourceCodeState>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceState {
    Created(Created),
    UnCompiled(WorkspaceUnCompiled),
    Parsed(WorkspaceParsed),
    Compiled(WorkspaceCompiled),
    Errored(WorkspaceErrored),
}

impl WorkspaceState {
    pub fn workspace_uri(&self) -> &Url {
        match self {
            WorkspaceState::Created(state) => &state.workspace_uri,
            WorkspaceState::UnCompiled(state) => &state.workspace_uri,
            WorkspaceState::Parsed(state) => &state.workspace_uri,
            WorkspaceState::Compiled(state) => &state.workspace_uri,
            WorkspaceState::Errored(state) => &state.workspace_uri,
        }
    }

    pub fn sources(&self) -> &[SourceCodeState] {
        match self {
            WorkspaceState::Created(_) => &[],
            WorkspaceState::UnCompiled(state) => &state.sources,
            WorkspaceState::Parsed(state) => &state.sources,
            WorkspaceState::Compiled(state) => &state.sources,
            WorkspaceState::Errored(state) => &state.sources,
        }
    }

    pub fn find_source(&self, file_uri: &Url) -> Option<&SourceCodeState> {
        self.sources().iter().find(|state| state.file_uri() == file_uri)
    }

    /// The valid build, when there is one.
    pub fn build_compiled(&self) -> Option<&BuildCompiled> {
        match self {
            WorkspaceState::UnCompiled(state) => Some(&state.build),
            WorkspaceState::Parsed(state) => Some(&state.build),
            WorkspaceState::Compiled(state) => Some(&state.build),
            WorkspaceState::Created(_) | WorkspaceState::Errored(_) => None,
        }
    }

    /// The raw text of the current build file, valid or not.
    pub fn build_code(&self) -> Option<&str> {
        match self {
            WorkspaceState::Errored(state) => {
                state.build.as_ref().and_then(|b| b.code.as_deref())
            }
            other => other.build_compiled().map(|b| b.code.as_str()),
        }
    }

    fn into_sources(self) -> Vec<SourceCodeState> {
        match self {
            WorkspaceState::Created(_) => Vec::new(),
            WorkspaceState::UnCompiled(state) => state.sources,
            WorkspaceState::Parsed(state) => state.sources,
            WorkspaceState::Compiled(state) => state.sources,
            WorkspaceState::Errored(state) => state.sources,
        }
    }
}

/// Outcome of a build-file event.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Changed(WorkspaceState),
    /// The build text matches the current build; source state is kept and
    /// the adapter only refreshes diagnostics.
    Unchanged(WorkspaceState),
}

impl BuildOutcome {
    pub fn into_state(self) -> WorkspaceState {
        match self {
            BuildOutcome::Changed(state) | BuildOutcome::Unchanged(state) => state,
        }
    }
}

pub fn create(workspace_uri: Url) -> WorkspaceState {
    WorkspaceState::Created(Created { workspace_uri })
}

/// Handle a build-file event: parse, validate, load dependencies, and
/// re-synchronise the source set against the (possibly moved) contract
/// directory.
pub fn build(
    build_uri: &Url,
    code: Option<String>,
    state: WorkspaceState,
    dependency_root: &Path,
    access: &dyn FileAccess,
) -> BuildOutcome {
    let workspace_uri = state.workspace_uri().clone();

    let code = match code {
        Some(code) => code,
        None => match access.read(build_uri) {
            Ok(code) => code,
            Err(error) => {
                let message =
                    CompilerMessage::error(error.to_string(), SourceIndex::zero(build_uri.clone()));
                let errored = BuildErrored {
                    build_uri: build_uri.clone(),
                    code: None,
                    errors: vec![message],
                    dependencies: Vec::new(),
                    activate_workspace: None,
                };
                return BuildOutcome::Changed(WorkspaceState::Errored(WorkspaceErrored {
                    workspace_uri,
                    build: Some(Box::new(errored)),
                    errors: Vec::new(),
                    sources: state.into_sources(),
                }));
            }
        },
    };

    if state.build_code() == Some(code.as_str()) {
        return BuildOutcome::Unchanged(state);
    }

    match build::parse_and_compile(build_uri, Some(code), &workspace_uri, dependency_root, access) {
        BuildState::Compiled(new_build) => {
            let sources = state.into_sources();
            match source::synchronise(&new_build.config.contract_uri, sources, access) {
                Ok(sources) => BuildOutcome::Changed(WorkspaceState::UnCompiled(
                    WorkspaceUnCompiled { workspace_uri, build: *new_build, sources },
                )),
                Err(error) => {
                    let message = CompilerMessage::error(
                        error.to_string(),
                        SourceIndex::zero(build_uri.clone()),
                    );
                    BuildOutcome::Changed(WorkspaceState::Errored(WorkspaceErrored {
                        workspace_uri,
                        build: None,
                        errors: vec![message],
                        sources: Vec::new(),
                    }))
                }
            }
        }

        BuildState::Errored(mut errored) => {
            // Keep the last good workspace around for recovery once the
            // build file is fixed.
            let (sources, retained) = match state {
                WorkspaceState::Compiled(compiled) => {
                    (compiled.sources.clone(), Some(Box::new(compiled)))
                }
                other => (other.into_sources(), None),
            };
            errored.activate_workspace = retained;
            BuildOutcome::Changed(WorkspaceState::Errored(WorkspaceErrored {
                workspace_uri,
                build: Some(errored),
                errors: Vec::new(),
                sources,
            }))
        }

        BuildState::Parsed(parsed) => {
            // The build pipeline always validates past `Parsed`.
            let message = CompilerMessage::error(
                "build stopped before validation",
                SourceIndex::zero(parsed.build_uri.clone()),
            );
            BuildOutcome::Changed(WorkspaceState::Errored(WorkspaceErrored {
                workspace_uri,
                build: None,
                errors: vec![message],
                sources: Vec::new(),
            }))
        }
    }
}

/// Lazily advance `Created` to its first build attempt. Other states pass
/// through untouched.
pub fn get_or_build(
    state: WorkspaceState,
    dependency_root: &Path,
    access: &dyn FileAccess,
) -> WorkspaceState {
    match state {
        WorkspaceState::Created(created) => {
            match uri::join(&created.workspace_uri, BUILD_FILE_NAME) {
                Some(build_uri) => build(
                    &build_uri,
                    None,
                    WorkspaceState::Created(created),
                    dependency_root,
                    access,
                )
                .into_state(),
                None => {
                    let message = CompilerMessage::error(
                        format!("invalid workspace URI: {}", created.workspace_uri),
                        SourceIndex::zero(created.workspace_uri.clone()),
                    );
                    WorkspaceState::Errored(WorkspaceErrored {
                        workspace_uri: created.workspace_uri,
                        build: None,
                        errors: vec![message],
                        sources: Vec::new(),
                    })
                }
            }
        }
        other => other,
    }
}

/// Handle a per-source edit event.
///
/// `Some(code)` replaces the file's state with the editor's text;
/// `None` (save/close) sends it back to `OnDisk` so the next access
/// re-reads the disk.
pub fn code_changed(
    file_uri: &Url,
    updated_code: Option<String>,
    state: WorkspaceState,
) -> WorkspaceState {
    match state {
        WorkspaceState::Created(created) => WorkspaceState::Created(created),

        WorkspaceState::Errored(mut errored) => {
            // No valid contract directory to admit new files into; only
            // already-tracked files are refreshed.
            if errored.sources.iter().any(|state| state.file_uri() == file_uri) {
                replace_source(&mut errored.sources, file_uri, updated_code);
            } else {
                tracing::debug!(%file_uri, "edit outside the tracked source set ignored");
            }
            WorkspaceState::Errored(errored)
        }

        WorkspaceState::UnCompiled(aware) => source_edit(file_uri, updated_code, aware),
        WorkspaceState::Parsed(aware) => source_edit(
            file_uri,
            updated_code,
            WorkspaceUnCompiled {
                workspace_uri: aware.workspace_uri,
                build: aware.build,
                sources: aware.sources,
            },
        ),
        WorkspaceState::Compiled(aware) => source_edit(
            file_uri,
            updated_code,
            WorkspaceUnCompiled {
                workspace_uri: aware.workspace_uri,
                build: aware.build,
                sources: aware.sources,
            },
        ),
    }
}

fn source_edit(
    file_uri: &Url,
    updated_code: Option<String>,
    mut workspace: WorkspaceUnCompiled,
) -> WorkspaceState {
    let tracked = workspace.sources.iter().any(|state| state.file_uri() == file_uri);
    let in_dir = uri::contains(&workspace.build.config.contract_uri, file_uri);
    if tracked || in_dir {
        replace_source(&mut workspace.sources, file_uri, updated_code);
    } else {
        tracing::debug!(%file_uri, "edit outside the contract directory ignored");
    }
    WorkspaceState::UnCompiled(workspace)
}

fn replace_source(sources: &mut Vec<SourceCodeState>, file_uri: &Url, updated_code: Option<String>) {
    let new_state = match updated_code {
        Some(code) => SourceCodeState::UnCompiled { file_uri: file_uri.clone(), code },
        None => SourceCodeState::OnDisk { file_uri: file_uri.clone() },
    };
    match sources.iter_mut().find(|state| state.file_uri() == file_uri) {
        Some(slot) => *slot = new_state,
        None => sources.push(new_state),
    }
}

/// Drive every source through parse, type-check imports, and run one batch
/// compile over the full parsed set.
pub fn parse_and_compile(state: WorkspaceState, access: &dyn FileAccess) -> WorkspaceState {
    let (workspace_uri, build, sources) = match state {
        WorkspaceState::UnCompiled(w) => (w.workspace_uri, w.build, w.sources),
        WorkspaceState::Parsed(w) => (w.workspace_uri, w.build, w.sources),
        WorkspaceState::Compiled(w) => (w.workspace_uri, w.build, w.sources),
        other @ (WorkspaceState::Created(_) | WorkspaceState::Errored(_)) => return other,
    };

    // Parse.
    let parsed_states: Vec<SourceCodeState> =
        sources.into_iter().map(|state| source::parse(state, access)).collect();
    let workspace_files: Vec<Url> =
        parsed_states.iter().map(|state| state.file_uri().clone()).collect();

    // Type-check imports, collecting the dependency sources they pull in.
    let mut referenced: Vec<&SourceParsed> = Vec::new();
    let mut checked: Vec<SourceCodeState> = Vec::with_capacity(parsed_states.len());
    for state in parsed_states {
        match state {
            SourceCodeState::Parsed(parsed) => {
                match imports::type_check(&parsed, &build, &workspace_files) {
                    Ok(dependencies) => {
                        referenced.extend(dependencies);
                        checked.push(SourceCodeState::Parsed(parsed));
                    }
                    Err(errors) => checked.push(SourceCodeState::ErrorSource {
                        file_uri: parsed.file_uri.clone(),
                        code: parsed.code.clone(),
                        errors,
                        previous: Some(parsed),
                    }),
                }
            }
            other => checked.push(other),
        }
    }

    let snapshot = WorkspaceParsed {
        workspace_uri: workspace_uri.clone(),
        build: build.clone(),
        sources: checked.clone(),
    };

    // Compile the flat contract list.
    let inputs: Vec<&SourceParsed> = checked
        .iter()
        .filter_map(|state| match state {
            SourceCodeState::Parsed(parsed) => Some(parsed),
            SourceCodeState::Compiled(compiled) => Some(&compiled.parsed),
            _ => None,
        })
        .collect();

    let mut dependency_asts: Vec<&SourceAst> = Vec::new();
    for parsed in referenced {
        if !dependency_asts.iter().any(|ast| ast.file == parsed.ast.file) {
            dependency_asts.push(&parsed.ast);
        }
    }

    let result = compiler::compile_sources(&inputs, &dependency_asts, &build.config.options);

    // Distribute per-file outcomes back onto their states.
    let mut by_file: HashMap<Url, _> =
        result.outcomes.into_iter().map(|outcome| (outcome.file, outcome.result)).collect();

    let final_sources: Vec<SourceCodeState> = checked
        .into_iter()
        .map(|state| match state {
            SourceCodeState::Parsed(parsed) => attach_outcome(by_file.remove(&parsed.file_uri), parsed),
            SourceCodeState::Compiled(compiled) => {
                attach_outcome(by_file.remove(&compiled.file_uri), compiled.parsed)
            }
            other => other,
        })
        .collect();

    if !result.workspace_errors.is_empty() {
        return WorkspaceState::Errored(WorkspaceErrored {
            workspace_uri,
            build: None,
            errors: result.workspace_errors,
            sources: final_sources,
        });
    }

    WorkspaceState::Compiled(WorkspaceCompiled {
        workspace_uri,
        build,
        sources: final_sources,
        parsed: Box::new(snapshot),
    })
}

type Outcome = Result<ralph_analyzer::checker::CompiledOutput, Vec<CompilerMessage>>;

fn attach_outcome(outcome: Option<Outcome>, parsed: SourceParsed) -> SourceCodeState {
    match outcome {
        Some(Ok(output)) => SourceCodeState::Compiled(SourceCompiled {
            file_uri: parsed.file_uri.clone(),
            code: parsed.code.clone(),
            parsed,
            warnings: output.warnings,
            compiled_contracts: output.contracts,
        }),
        Some(Err(errors)) => SourceCodeState::ErrorSource {
            file_uri: parsed.file_uri.clone(),
            code: parsed.code.clone(),
            errors,
            previous: Some(parsed),
        },
        // The compiler produced no outcome for this file; leave it parsed.
        None => SourceCodeState::Parsed(parsed),
    }
}
