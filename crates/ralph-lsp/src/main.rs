// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ralph LSP - Language Server for the Ralph smart contract language
//!
//! The editor starts this binary and speaks JSON-RPC over stdin/stdout.
//! Because stdout belongs to the protocol, all logging goes to stderr via
//! `tracing` (set `RUST_LOG=ralph_lsp=debug` for verbose output).

use ralph_lsp::server::RalphLanguageServer;
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("starting ralph-lsp server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(RalphLanguageServer::new).finish();

    // The transport's listener is the only long-lived task; it ends when
    // the editor disconnects or sends `exit`.
    Server::new(stdin, stdout, socket).serve(service).await;

    tracing::info!("ralph-lsp server stopped");
}
