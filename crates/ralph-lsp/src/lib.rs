// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ralph LSP - Language Server for the Ralph smart contract language
//!
//! The server is a presentation compiler: a long-running process that keeps
//! an incremental model of one workspace, drives the one-shot batch compiler
//! in `ralph-analyzer`, and answers editor queries against the last state it
//! computed.
//!
//! The crate is organised along the pipeline:
//!
//! - [`access`] - all disk I/O, behind the [`access::FileAccess`] trait
//! - [`build`] - the `ralph.json` lifecycle (parse, validate, dependencies)
//! - [`workspace`] - per-file source states and the workspace state machine
//! - [`search`], [`goto`], [`completion`] - read-only editor features over
//!   parsed state
//! - [`server`] - the tower-lsp adapter mapping editor events onto the core

pub mod access;
pub mod build;
pub mod completion;
pub mod compiler;
pub mod goto;
pub mod search;
pub mod server;
pub mod uri;
pub mod workspace;
