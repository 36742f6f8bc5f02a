// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! The Language Server adapter.
//!
//! # LSP lifecycle
//!
//! 1. The editor starts this binary and sends `initialize`
//! 2. We answer with our capabilities (full sync, completion, definition)
//! 3. `initialized` triggers the first build and compile
//! 4. File events flow through the workspace state machine; every
//!    transition publishes fresh diagnostics and clears stale ones
//! 5. `shutdown` / `exit` end the session
//!
//! The workspace lives in one mutex-guarded cell. Mutating events take
//! the lock, compute the next state, and install it with a bumped
//! generation; queries clone the current state and work on the snapshot
//! outside the lock.

mod diagnostics;
mod document;
mod utils;

pub use document::Document;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use lsp_types::*;
use ropey::Rope;
use tower_lsp::jsonrpc;
use tower_lsp::{Client, LanguageServer};

use crate::access::{DiskAccess, FileAccess, RALPH_EXTENSION};
use crate::build::dependency;
use crate::build::BUILD_FILE_NAME;
use crate::completion::{Suggestion, SuggestionKind};
use crate::search::SourceLocation;
use crate::workspace::{self, WorkspaceState};
use crate::{completion, goto, uri};

/// The single mutable cell: the workspace plus its version counter.
struct ServerState {
    workspace: Option<WorkspaceState>,
    generation: u64,
}

/// The Ralph Language Server.
pub struct RalphLanguageServer {
    /// Used to send notifications to the editor (diagnostics, messages).
    client: Client,

    /// The workspace cell. One workspace per server instance.
    state: Arc<Mutex<ServerState>>,

    /// Open documents, keyed by URI.
    documents: Arc<DashMap<Url, Document>>,

    /// All disk I/O goes through here.
    access: Arc<dyn FileAccess>,

    /// Where `std` and `built-in` are materialized.
    dependency_root: PathBuf,

    /// Last published diagnostics generation per URI. Publishes older than
    /// what a URI already saw are dropped, so diagnostics never regress.
    published: Arc<DashMap<Url, u64>>,
}

/// What kind of file an event touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    BuildFile,
    RalphSource,
    Unknown,
}

fn classify(file_uri: &Url) -> FileKind {
    if uri::file_name(file_uri).as_deref() == Some(BUILD_FILE_NAME) {
        FileKind::BuildFile
    } else if uri::extension(file_uri).as_deref() == Some(RALPH_EXTENSION) {
        FileKind::RalphSource
    } else {
        FileKind::Unknown
    }
}

impl RalphLanguageServer {
    pub fn new(client: Client) -> Self {
        let dependency_root = dependency::default_root()
            .unwrap_or_else(|| std::env::temp_dir().join("ralph-lsp").join("dependencies"));
        tracing::info!(path = %dependency_root.display(), "dependency root");

        Self {
            client,
            state: Arc::new(Mutex::new(ServerState { workspace: None, generation: 0 })),
            documents: Arc::new(DashMap::new()),
            access: Arc::new(DiskAccess),
            dependency_root,
            published: Arc::new(DashMap::new()),
        }
    }

    /// Run one state transition under the lock and return what it changed:
    /// the diagnostics to publish and the generation they belong to.
    fn transition<F>(&self, f: F) -> (Vec<(Url, Vec<Diagnostic>)>, u64)
    where
        F: FnOnce(WorkspaceState) -> WorkspaceState,
    {
        let mut guard = self.state.lock().unwrap();
        let Some(current) = guard.workspace.take() else {
            tracing::warn!("event before initialize; ignored");
            return (Vec::new(), guard.generation);
        };

        let previous_diagnostics = diagnostics::collect(&current);
        let next = f(current);
        let current_diagnostics = diagnostics::collect(&next);

        guard.workspace = Some(next);
        guard.generation += 1;
        (diagnostics::delta(&previous_diagnostics, &current_diagnostics), guard.generation)
    }

    /// Snapshot the current workspace for a query.
    fn snapshot(&self) -> Option<WorkspaceState> {
        self.state.lock().unwrap().workspace.clone()
    }

    async fn publish(&self, publishes: Vec<(Url, Vec<Diagnostic>)>, generation: u64) {
        for (file_uri, diags) in publishes {
            let stale = {
                let mut last = self.published.entry(file_uri.clone()).or_insert(0);
                if *last > generation {
                    true
                } else {
                    *last = generation;
                    false
                }
            };
            if stale {
                tracing::debug!(%file_uri, generation, "dropping stale diagnostics publish");
                continue;
            }
            self.client.publish_diagnostics(file_uri, diags, None).await;
        }
    }

    /// Map an editor event carrying (or not carrying) text onto the core.
    async fn on_file_event(&self, file_uri: Url, code: Option<String>) {
        match classify(&file_uri) {
            FileKind::BuildFile => {
                let (publishes, generation) = self.transition(|state| {
                    match workspace::build(
                        &file_uri,
                        code,
                        state,
                        &self.dependency_root,
                        self.access.as_ref(),
                    ) {
                        workspace::BuildOutcome::Changed(state) => {
                            workspace::parse_and_compile(state, self.access.as_ref())
                        }
                        // Same build text: keep source states, just refresh
                        // diagnostics.
                        workspace::BuildOutcome::Unchanged(state) => state,
                    }
                });
                self.publish(publishes, generation).await;
            }

            FileKind::RalphSource => {
                let (publishes, generation) = self.transition(|state| {
                    let state =
                        workspace::get_or_build(state, &self.dependency_root, self.access.as_ref());
                    let state = workspace::code_changed(&file_uri, code, state);
                    workspace::parse_and_compile(state, self.access.as_ref())
                });
                self.publish(publishes, generation).await;
            }

            FileKind::Unknown => {
                tracing::error!(%file_uri, "unknown file kind");
                self.client
                    .show_message(MessageType::ERROR, format!("Unknown file: {file_uri}"))
                    .await;
            }
        }
    }

    fn to_completion_item(suggestion: Suggestion) -> CompletionItem {
        let kind = match suggestion.kind {
            SuggestionKind::Variable => CompletionItemKind::VARIABLE,
            SuggestionKind::Function => CompletionItemKind::FUNCTION,
            SuggestionKind::Type => CompletionItemKind::CLASS,
            SuggestionKind::Interface => CompletionItemKind::INTERFACE,
            SuggestionKind::Keyword => CompletionItemKind::KEYWORD,
        };
        CompletionItem {
            label: suggestion.label,
            kind: Some(kind),
            detail: Some(suggestion.detail),
            documentation: suggestion.documentation.map(Documentation::String),
            insert_text: Some(suggestion.insert),
            ..Default::default()
        }
    }

    fn to_location(location: &SourceLocation<'_>) -> Location {
        Location {
            uri: location.parsed.file_uri.clone(),
            range: utils::index_to_range(&location.parsed.code, &location.index),
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for RalphLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        tracing::info!("received initialize request");

        #[allow(deprecated)]
        let fallback_root = params.root_uri.clone();
        let root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| folder.uri.clone())
            .or(fallback_root);

        let Some(workspace_uri) = root else {
            tracing::error!("no workspace folder supplied");
            return Err(jsonrpc::Error::invalid_params("workspace folder not supplied"));
        };

        tracing::info!(%workspace_uri, "workspace root");
        {
            let mut guard = self.state.lock().unwrap();
            guard.workspace = Some(workspace::create(workspace_uri));
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string()]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "ralph-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        tracing::info!("handshake complete, running first build");

        let (publishes, generation) = self.transition(|state| {
            let state = workspace::get_or_build(state, &self.dependency_root, self.access.as_ref());
            workspace::parse_and_compile(state, self.access.as_ref())
        });
        self.publish(publishes, generation).await;

        self.client.log_message(MessageType::INFO, "Ralph LSP server ready").await;
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        tracing::info!("shutdown requested");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let file_uri = params.text_document.uri;
        tracing::debug!(%file_uri, "document opened");

        self.documents.insert(
            file_uri.clone(),
            Document {
                content: Rope::from_str(&params.text_document.text),
                version: params.text_document.version,
            },
        );

        self.on_file_event(file_uri, Some(params.text_document.text)).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let file_uri = params.text_document.uri;

        // Sync is full: the last change carries the whole document.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        if let Some(mut document) = self.documents.get_mut(&file_uri) {
            document.content = Rope::from_str(&change.text);
            document.version = params.text_document.version;
        }

        self.on_file_event(file_uri, Some(change.text)).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let file_uri = params.text_document.uri;
        tracing::debug!(%file_uri, "document saved");
        // The disk is now the source of truth.
        self.on_file_event(file_uri, None).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let file_uri = params.text_document.uri;
        tracing::debug!(%file_uri, "document closed");
        self.documents.remove(&file_uri);
        self.on_file_event(file_uri, None).await;
    }

    async fn completion(
        &self,
        params: CompletionParams,
    ) -> jsonrpc::Result<Option<CompletionResponse>> {
        let file_uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some(snapshot) = self.snapshot() else {
            return Err(jsonrpc::Error::invalid_request());
        };

        let Some(parsed) = snapshot.find_source(&file_uri).and_then(|s| s.parsed_view()) else {
            return Ok(None);
        };

        let offset = utils::position_to_offset(&parsed.code, position);
        let items: Vec<CompletionItem> = completion::complete(offset, parsed, &snapshot)
            .into_iter()
            .map(Self::to_completion_item)
            .collect();

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> jsonrpc::Result<Option<GotoDefinitionResponse>> {
        let file_uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some(snapshot) = self.snapshot() else {
            return Err(jsonrpc::Error::invalid_request());
        };

        let Some(parsed) = snapshot.find_source(&file_uri).and_then(|s| s.parsed_view()) else {
            return Ok(None);
        };

        let offset = utils::position_to_offset(&parsed.code, position);
        let locations: Vec<Location> = goto::go_to_definition(offset, parsed, &snapshot)
            .iter()
            .map(Self::to_location)
            .collect();

        if locations.is_empty() {
            Ok(None)
        } else {
            Ok(Some(GotoDefinitionResponse::Array(locations)))
        }
    }
}
