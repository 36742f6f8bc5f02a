// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-source-file states and their transitions.
//!
//! Each file under the workspace's contract directory is exactly one of:
//! on disk (known, unread), uncompiled (text in memory), parsed, compiled,
//! or errored (I/O or source). Transitions only move forward within one
//! edit generation; an editor event is what sends a file back to
//! `UnCompiled` or `OnDisk`.

use ralph_analyzer::checker::CompiledContract;
use ralph_analyzer::{CompilerMessage, SourceAst, SourceIndex};
use url::Url;

use crate::access::{AccessError, FileAccess};
use crate::compiler;
use crate::uri;
use crate::workspace::imports::{self, ImportStatement};

/// A successfully parsed source: text, AST and its import statements.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceParsed {
    pub file_uri: Url,
    pub code: String,
    pub import_statements: Vec<ImportStatement>,
    pub ast: SourceAst,
}

/// A successfully compiled source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCompiled {
    pub file_uri: Url,
    pub code: String,
    pub parsed: SourceParsed,
    pub warnings: Vec<CompilerMessage>,
    pub compiled_contracts: Vec<CompiledContract>,
}

/// The state of one source file. At most one state per URI exists in a
/// workspace.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCodeState {
    /// Known to exist on disk, not yet read.
    OnDisk { file_uri: Url },
    /// Text loaded (from disk or editor), not yet parsed.
    UnCompiled { file_uri: Url, code: String },
    Parsed(SourceParsed),
    Compiled(SourceCompiled),
    /// Reading the file failed; retried on the next touch.
    ErrorAccess { file_uri: Url, error: CompilerMessage },
    /// Parse or compile errors. `previous` keeps the last good parse so
    /// editor features keep working on stale-but-sane state.
    ErrorSource {
        file_uri: Url,
        code: String,
        errors: Vec<CompilerMessage>,
        previous: Option<SourceParsed>,
    },
}

impl SourceCodeState {
    pub fn file_uri(&self) -> &Url {
        match self {
            SourceCodeState::OnDisk { file_uri }
            | SourceCodeState::UnCompiled { file_uri, .. }
            | SourceCodeState::ErrorAccess { file_uri, .. }
            | SourceCodeState::ErrorSource { file_uri, .. } => file_uri,
            SourceCodeState::Parsed(parsed) => &parsed.file_uri,
            SourceCodeState::Compiled(compiled) => &compiled.file_uri,
        }
    }

    /// The most recent good parse this state carries, if any.
    pub fn parsed_view(&self) -> Option<&SourceParsed> {
        match self {
            SourceCodeState::Parsed(parsed) => Some(parsed),
            SourceCodeState::Compiled(compiled) => Some(&compiled.parsed),
            SourceCodeState::ErrorSource { previous, .. } => previous.as_ref(),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            SourceCodeState::UnCompiled { code, .. }
            | SourceCodeState::ErrorSource { code, .. } => Some(code),
            SourceCodeState::Parsed(parsed) => Some(&parsed.code),
            SourceCodeState::Compiled(compiled) => Some(&compiled.code),
            SourceCodeState::OnDisk { .. } | SourceCodeState::ErrorAccess { .. } => None,
        }
    }
}

/// List `dir` and start every found file at `OnDisk`.
pub fn initialise(
    dir: &Url,
    access: &dyn FileAccess,
) -> Result<Vec<SourceCodeState>, AccessError> {
    let files = access.list(dir)?;
    Ok(files.into_iter().map(|file_uri| SourceCodeState::OnDisk { file_uri }).collect())
}

/// Synchronise in-memory states with the directory: drop states that left
/// `dir`, keep existing states for files still present, and pick up files
/// the editor has not touched yet as `OnDisk`.
pub fn synchronise(
    dir: &Url,
    current: Vec<SourceCodeState>,
    access: &dyn FileAccess,
) -> Result<Vec<SourceCodeState>, AccessError> {
    let mut result: Vec<SourceCodeState> = current
        .into_iter()
        .filter(|state| uri::contains(dir, state.file_uri()))
        .collect();

    for found in initialise(dir, access)? {
        if !result.iter().any(|state| state.file_uri() == found.file_uri()) {
            result.push(found);
        }
    }

    Ok(result)
}

/// Drive one state to `Parsed` (or an error state).
///
/// The transition table is a loop rather than recursion: `OnDisk` reads
/// then re-enters, `ErrorAccess` retries the read once, and the
/// already-parsed states are identity.
pub fn parse(state: SourceCodeState, access: &dyn FileAccess) -> SourceCodeState {
    let mut state = state;
    loop {
        match state {
            SourceCodeState::UnCompiled { file_uri, code } => {
                return match compiler::parse_source(&file_uri, &code) {
                    Ok(ast) => {
                        let import_statements = imports::extract(&code, &file_uri);
                        SourceCodeState::Parsed(SourceParsed {
                            file_uri,
                            code,
                            import_statements,
                            ast,
                        })
                    }
                    Err(error) => SourceCodeState::ErrorSource {
                        file_uri,
                        code,
                        errors: vec![error],
                        previous: None,
                    },
                }
            }

            SourceCodeState::OnDisk { file_uri } => match access.read(&file_uri) {
                Ok(code) => state = SourceCodeState::UnCompiled { file_uri, code },
                Err(error) => {
                    let message = CompilerMessage::error(
                        error.to_string(),
                        SourceIndex::zero(file_uri.clone()),
                    );
                    return SourceCodeState::ErrorAccess { file_uri, error: message };
                }
            },

            SourceCodeState::ErrorAccess { file_uri, .. } => match access.read(&file_uri) {
                Ok(code) => state = SourceCodeState::UnCompiled { file_uri, code },
                Err(error) => {
                    let message = CompilerMessage::error(
                        error.to_string(),
                        SourceIndex::zero(file_uri.clone()),
                    );
                    return SourceCodeState::ErrorAccess { file_uri, error: message };
                }
            },

            done @ (SourceCodeState::Parsed(_)
            | SourceCodeState::Compiled(_)
            | SourceCodeState::ErrorSource { .. }) => return done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DiskAccess;

    fn url_of(path: &std::path::Path) -> Url {
        Url::from_file_path(path).unwrap()
    }

    #[test]
    fn test_initialise_lists_on_disk_states() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ral"), "Contract A() { }").unwrap();
        std::fs::write(dir.path().join("b.ral"), "Contract B() { }").unwrap();

        let states = initialise(&url_of(dir.path()), &DiskAccess).unwrap();
        assert_eq!(states.len(), 2);
        assert!(states.iter().all(|s| matches!(s, SourceCodeState::OnDisk { .. })));
    }

    #[test]
    fn test_synchronise_keeps_existing_and_drops_foreign() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ral"), "Contract A() { }").unwrap();

        let inside = SourceCodeState::UnCompiled {
            file_uri: url_of(&dir.path().join("a.ral")),
            code: "edited".to_string(),
        };
        let foreign = SourceCodeState::OnDisk {
            file_uri: Url::parse("file:///elsewhere/x.ral").unwrap(),
        };

        let result =
            synchronise(&url_of(dir.path()), vec![inside.clone(), foreign], &DiskAccess).unwrap();
        // The edited in-memory state wins over the on-disk listing, and the
        // foreign entry is gone.
        assert_eq!(result, vec![inside]);
    }

    #[test]
    fn test_synchronise_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ral"), "Contract A() { }").unwrap();
        std::fs::write(dir.path().join("b.ral"), "Contract B() { }").unwrap();
        let dir_uri = url_of(dir.path());

        let once = synchronise(&dir_uri, Vec::new(), &DiskAccess).unwrap();
        let twice = synchronise(&dir_uri, once.clone(), &DiskAccess).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_reads_on_disk_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ral");
        std::fs::write(&path, "Contract A(id: U256) { }").unwrap();

        let state = parse(SourceCodeState::OnDisk { file_uri: url_of(&path) }, &DiskAccess);
        match state {
            SourceCodeState::Parsed(parsed) => {
                assert_eq!(parsed.ast.definitions[0].id.name, "A");
            }
            other => panic!("expected Parsed, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_file_is_an_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let file_uri = url_of(&dir.path().join("missing.ral"));

        let state = parse(SourceCodeState::OnDisk { file_uri: file_uri.clone() }, &DiskAccess);
        match &state {
            SourceCodeState::ErrorAccess { error, .. } => {
                assert!(error.message.contains("not found"));
            }
            other => panic!("expected ErrorAccess, got {other:?}"),
        }

        // Still failing on retry: a fresh ErrorAccess.
        let retried = parse(state, &DiskAccess);
        assert!(matches!(retried, SourceCodeState::ErrorAccess { .. }));

        // Fixing the file makes the retry parse.
        std::fs::write(dir.path().join("missing.ral"), "Contract A() { }").unwrap();
        let recovered = parse(SourceCodeState::ErrorAccess {
            file_uri,
            error: CompilerMessage::error("stale", SourceIndex::zero(url_of(dir.path()))),
        }, &DiskAccess);
        assert!(matches!(recovered, SourceCodeState::Parsed(_)));
    }

    #[test]
    fn test_parse_bad_source_is_error_source_without_previous() {
        let state = SourceCodeState::UnCompiled {
            file_uri: Url::parse("file:///w/contracts/a.ral").unwrap(),
            code: "Contract {".to_string(),
        };
        match parse(state, &DiskAccess) {
            SourceCodeState::ErrorSource { errors, previous, .. } => {
                assert_eq!(errors.len(), 1);
                assert!(previous.is_none());
            }
            other => panic!("expected ErrorSource, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_is_identity_on_parsed_states() {
        let state = parse(
            SourceCodeState::UnCompiled {
                file_uri: Url::parse("file:///w/contracts/a.ral").unwrap(),
                code: "Contract A() { }".to_string(),
            },
            &DiskAccess,
        );
        assert!(matches!(state, SourceCodeState::Parsed(_)));
        assert_eq!(parse(state.clone(), &DiskAccess), state);
    }
}
