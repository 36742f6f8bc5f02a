// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! Go-to-definition.
//!
//! The resolver finds the deepest AST node under the cursor and dispatches
//! on its kind: plain identifiers resolve through the function scope table
//! and then the inheritance chain; function names resolve through calls,
//! definitions (which jump to usages) and contract calls; type names
//! resolve across the workspace and its dependencies. Function results
//! anchor at the definition's signature range, so editors land on a stable
//! header line.

use ralph_analyzer::ast::{Expr, FuncDef, Ident, TypeDef, TypeId};

use crate::build::dependency::DependencyId;
use crate::search::ast::{self, NodeRef};
use crate::search::inheritance;
use crate::search::{self, ScopeTable, SourceLocation};
use crate::workspace::source::SourceParsed;
use crate::workspace::WorkspaceState;

/// Resolve the definition(s) of whatever sits at `offset` in `source`.
///
/// Results are in source-scan order; a second call on the same state
/// returns the same ranges.
pub fn go_to_definition<'a>(
    offset: usize,
    source: &'a SourceParsed,
    workspace: &'a WorkspaceState,
) -> Vec<SourceLocation<'a>> {
    let all = search::collect_parsed(workspace);
    let path = ast::find_at(&source.ast, offset);

    let Some(deepest) = path.last().copied() else {
        return Vec::new();
    };

    match deepest {
        NodeRef::Ident(ident) => resolve_ident(ident, offset, &path, source, &all),

        // The binding under the cursor is its own definition.
        NodeRef::LetBinding(ident) => {
            vec![SourceLocation { parsed: source, index: ident.index.clone() }]
        }

        NodeRef::FuncId(func_id) => {
            let parent = path.len().checked_sub(2).and_then(|i| path.get(i)).copied();
            match parent {
                Some(NodeRef::Call(call)) if call.id.name == func_id.name => {
                    if func_id.is_builtin() {
                        resolve_builtin(&func_id.name, workspace)
                    } else {
                        resolve_local_call(&func_id.name, &path, source, &all)
                    }
                }
                Some(NodeRef::ContractCall(call)) if call.call_id.name == func_id.name => {
                    resolve_contract_call(&call.receiver, &func_id.name, offset, &path, &all)
                }
                Some(NodeRef::FuncDef(def)) if def.id.name == func_id.name => {
                    find_usages(def, &path, source, &all)
                }
                _ => Vec::new(),
            }
        }

        NodeRef::TypeId(type_id) => resolve_type(type_id, &all),

        _ => Vec::new(),
    }
}

fn enclosing_type<'a>(path: &[NodeRef<'a>]) -> Option<&'a TypeDef> {
    path.iter().find_map(|node| match node {
        NodeRef::TypeDef(def) => Some(*def),
        _ => None,
    })
}

fn enclosing_func<'a>(path: &[NodeRef<'a>]) -> Option<&'a FuncDef> {
    path.iter().find_map(|node| match node {
        NodeRef::FuncDef(def) => Some(*def),
        _ => None,
    })
}

/// Variables and fields: scope table first, then own and inherited
/// struct-level names.
fn resolve_ident<'a>(
    ident: &Ident,
    offset: usize,
    path: &[NodeRef<'a>],
    source: &'a SourceParsed,
    all: &[&'a SourceParsed],
) -> Vec<SourceLocation<'a>> {
    if let Some(func) = enclosing_func(path) {
        let table = ScopeTable::build(func);
        let local = table.definitions_at(&ident.name, offset);
        if !local.is_empty() {
            return local
                .into_iter()
                .map(|entry| SourceLocation { parsed: source, index: entry.ident.index.clone() })
                .collect();
        }
    }

    let Some(def) = enclosing_type(path) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    collect_member_defs(def, &ident.name, source, &mut results);
    for (parent_source, parent) in inheritance::collect_inheritance_in_scope(def, all) {
        collect_member_defs(parent, &ident.name, parent_source, &mut results);
    }
    results
}

fn collect_member_defs<'a>(
    def: &'a TypeDef,
    name: &str,
    source: &'a SourceParsed,
    results: &mut Vec<SourceLocation<'a>>,
) {
    for field in &def.fields {
        if field.ident.name == name {
            results.push(SourceLocation { parsed: source, index: field.ident.index.clone() });
        }
    }
    for constant in &def.constants {
        if constant.ident.name == name {
            results.push(SourceLocation { parsed: source, index: constant.ident.index.clone() });
        }
    }
    for enum_def in &def.enums {
        if enum_def.id.name == name {
            results.push(SourceLocation { parsed: source, index: enum_def.id.index.clone() });
        }
    }
}

/// `name!(...)`: definitions live in the bundled `built-in` sub-workspace.
fn resolve_builtin<'a>(name: &str, workspace: &'a WorkspaceState) -> Vec<SourceLocation<'a>> {
    let Some(built_in) = workspace
        .build_compiled()
        .and_then(|build| build.find_dependency(DependencyId::BuiltIn))
    else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for parsed in built_in.sources.iter().filter_map(|s| s.parsed_view()) {
        for def in &parsed.ast.definitions {
            for func in &def.functions {
                if func.id.name == name {
                    results.push(SourceLocation { parsed, index: func.signature.clone() });
                }
            }
        }
    }
    results
}

/// A plain `name(...)` call: the defining function is on the enclosing
/// type or one of its transitive parents.
fn resolve_local_call<'a>(
    name: &str,
    path: &[NodeRef<'a>],
    source: &'a SourceParsed,
    all: &[&'a SourceParsed],
) -> Vec<SourceLocation<'a>> {
    let Some(def) = enclosing_type(path) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for func in &def.functions {
        if func.id.name == name {
            results.push(SourceLocation { parsed: source, index: func.signature.clone() });
        }
    }
    for (parent_source, parent) in inheritance::collect_inheritance_in_scope(def, all) {
        for func in &parent.functions {
            if func.id.name == name {
                results.push(SourceLocation { parsed: parent_source, index: func.signature.clone() });
            }
        }
    }
    results
}

/// `receiver.name(...)`: resolve through the receiver's inferred type.
fn resolve_contract_call<'a>(
    receiver: &Expr,
    name: &str,
    offset: usize,
    path: &[NodeRef<'a>],
    all: &[&'a SourceParsed],
) -> Vec<SourceLocation<'a>> {
    let type_names = receiver_type_names(receiver, offset, path, all);
    if type_names.is_empty() {
        tracing::debug!(function = name, "receiver type unknown, no definitions to offer");
        return Vec::new();
    }

    let mut results = Vec::new();
    for (type_source, def) in all.iter().flat_map(|parsed| {
        parsed.ast.definitions.iter().map(move |def| (*parsed, def))
    }) {
        if !type_names.contains(&def.id.name) {
            continue;
        }
        for func in &def.functions {
            if func.id.name == name {
                results.push(SourceLocation { parsed: type_source, index: func.signature.clone() });
            }
        }
        for (parent_source, parent) in inheritance::collect_inheritance_in_scope(def, all) {
            for func in &parent.functions {
                if func.id.name == name {
                    results
                        .push(SourceLocation { parsed: parent_source, index: func.signature.clone() });
                }
            }
        }
    }
    results
}

/// Possible type names of a contract-call receiver: the declared type of
/// the variable under the cursor's scope, the type of a matching contract
/// field, or the receiver itself when it names a known type.
fn receiver_type_names<'a>(
    receiver: &Expr,
    offset: usize,
    path: &[NodeRef<'a>],
    all: &[&'a SourceParsed],
) -> Vec<String> {
    let Expr::Variable(ident) = receiver else {
        return Vec::new();
    };

    if let Some(func) = enclosing_func(path) {
        if let Some(tpe) = ScopeTable::build(func).type_of(&ident.name, offset) {
            return vec![tpe.id.name.clone()];
        }
    }

    if let Some(def) = enclosing_type(path) {
        if let Some(field) = def.fields.iter().find(|f| f.ident.name == ident.name) {
            return vec![field.tpe.id.name.clone()];
        }
        for (_, parent) in inheritance::collect_inheritance_in_scope(def, all) {
            if let Some(field) = parent.fields.iter().find(|f| f.ident.name == ident.name) {
                return vec![field.tpe.id.name.clone()];
            }
        }
    }

    if all.iter().any(|parsed| parsed.ast.find_type(&ident.name).is_some()) {
        return vec![ident.name.clone()];
    }

    Vec::new()
}

/// Cursor on a definition's own name: jump to its usages across the type
/// and everything that implements it.
fn find_usages<'a>(
    func: &FuncDef,
    path: &[NodeRef<'a>],
    source: &'a SourceParsed,
    all: &[&'a SourceParsed],
) -> Vec<SourceLocation<'a>> {
    let Some(def) = enclosing_type(path) else {
        return Vec::new();
    };

    let mut scan: Vec<(&SourceParsed, &TypeDef)> = vec![(source, def)];
    scan.extend(inheritance::collect_implementing_children(def, all));

    let mut results = Vec::new();
    for (scan_source, scan_def) in scan {
        for node in ast::walk_type_def(scan_def) {
            match node {
                NodeRef::Call(call) if call.id.name == func.id.name => {
                    results.push(SourceLocation {
                        parsed: scan_source,
                        index: call.id.index.clone(),
                    });
                }
                NodeRef::ContractCall(call) if call.call_id.name == func.id.name => {
                    results.push(SourceLocation {
                        parsed: scan_source,
                        index: call.call_id.index.clone(),
                    });
                }
                _ => {}
            }
        }
    }
    results
}

/// Type names resolve to their definition across workspace and
/// dependencies.
fn resolve_type<'a>(type_id: &TypeId, all: &[&'a SourceParsed]) -> Vec<SourceLocation<'a>> {
    let mut results = Vec::new();
    for parsed in all {
        for def in &parsed.ast.definitions {
            if def.id.name == type_id.name {
                results.push(SourceLocation { parsed, index: def.id.index.clone() });
            }
        }
    }
    results
}
