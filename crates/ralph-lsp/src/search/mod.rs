// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! Read-only lookups over parsed state: node walks, scope tables and the
//! inheritance graph. Everything here recomputes per query - the graph is
//! never materialized, so edits cannot leave it stale.

pub mod ast;
pub mod inheritance;

use ralph_analyzer::ast::{Argument, FuncDef, Ident, TypeRef};
use ralph_analyzer::SourceIndex;

use crate::workspace::source::SourceParsed;
use crate::workspace::WorkspaceState;

/// A range inside a parsed source - what definition and usage queries
/// return.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation<'a> {
    pub parsed: &'a SourceParsed,
    pub index: SourceIndex,
}

/// All parsed sources visible from `state`: the workspace's own files
/// first, then the dependency sources (`std`, then `built-in`).
pub fn collect_parsed(state: &WorkspaceState) -> Vec<&SourceParsed> {
    let mut parsed: Vec<&SourceParsed> =
        state.sources().iter().filter_map(|source| source.parsed_view()).collect();

    if let Some(build) = state.build_compiled() {
        parsed.extend(build.dependency_sources());
    }

    parsed
}

/// One visible binding inside a function: an argument or a `let`.
#[derive(Debug, Clone)]
pub struct ScopeEntry<'a> {
    pub ident: &'a Ident,
    pub tpe: Option<&'a TypeRef>,
}

/// The per-function scope table: argument and `let` bindings ordered by
/// source offset, so lookups can honor "defined before use".
pub struct ScopeTable<'a> {
    entries: Vec<ScopeEntry<'a>>,
}

impl<'a> ScopeTable<'a> {
    pub fn build(func: &'a FuncDef) -> Self {
        let mut entries: Vec<ScopeEntry<'a>> = func
            .args
            .iter()
            .map(|arg| ScopeEntry { ident: &arg.ident, tpe: Some(&arg.tpe) })
            .collect();

        if let Some(body) = &func.body {
            for node in ast::walk_block(body) {
                if let ast::NodeRef::LetBinding(ident) = node {
                    entries.push(ScopeEntry { ident, tpe: None });
                }
            }
        }

        entries.sort_by_key(|entry| entry.ident.index.offset);
        Self { entries }
    }

    /// All definitions of `name` visible at `offset`.
    pub fn definitions_at(&self, name: &str, offset: usize) -> Vec<&ScopeEntry<'a>> {
        self.entries
            .iter()
            .filter(|entry| entry.ident.name == name && entry.ident.index.offset <= offset)
            .collect()
    }

    /// Every binding visible at `offset`, in declaration order.
    pub fn visible_at(&self, offset: usize) -> impl Iterator<Item = &ScopeEntry<'a>> {
        self.entries.iter().filter(move |entry| entry.ident.index.offset <= offset)
    }

    /// Declared type of the nearest binding of `name` visible at `offset`.
    pub fn type_of(&self, name: &str, offset: usize) -> Option<&'a TypeRef> {
        self.definitions_at(name, offset).last().and_then(|entry| entry.tpe)
    }
}

/// Render a function header the way completions and hovers show it.
pub fn render_signature(func: &FuncDef) -> String {
    let args = func.args.iter().map(render_argument).collect::<Vec<_>>().join(", ");
    let name = &func.id.name;
    match func.returns.len() {
        0 => format!("fn {name}({args}) -> ()"),
        1 => format!("fn {name}({args}) -> {}", func.returns[0].id.name),
        _ => {
            let returns =
                func.returns.iter().map(|r| r.id.name.clone()).collect::<Vec<_>>().join(", ");
            format!("fn {name}({args}) -> ({returns})")
        }
    }
}

fn render_argument(arg: &Argument) -> String {
    let name = &arg.ident.name;
    let tpe = &arg.tpe.id.name;
    if arg.is_mut {
        format!("mut {name}: {tpe}")
    } else {
        format!("{name}: {tpe}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ralph_analyzer::parse;
    use url::Url;

    fn func_of(code: &str) -> FuncDef {
        let uri = Url::parse("file:///w/contracts/a.ral").unwrap();
        let ast = parse(&uri, code).unwrap();
        ast.definitions[0].functions[0].clone()
    }

    #[test]
    fn test_scope_table_orders_by_offset() {
        let code = "Contract A() { fn f(a: U256) -> U256 { let b = a\n let c = b\n return c } }";
        let func = func_of(code);
        let table = ScopeTable::build(&func);

        let at_end = table.visible_at(code.len()).map(|e| e.ident.name.clone()).collect::<Vec<_>>();
        assert_eq!(at_end, vec!["a", "b", "c"]);

        // Before `c` is declared, only `a` and `b` are visible.
        let c_offset = code.find("let c").unwrap();
        let before_c =
            table.visible_at(c_offset).map(|e| e.ident.name.clone()).collect::<Vec<_>>();
        assert_eq!(before_c, vec!["a", "b"]);
    }

    #[test]
    fn test_scope_table_types() {
        let code = "Contract A() { fn f(a: U256) -> U256 { let b = a\n return b } }";
        let func = func_of(code);
        let table = ScopeTable::build(&func);

        assert_eq!(table.type_of("a", code.len()).unwrap().id.name, "U256");
        assert!(table.type_of("b", code.len()).is_none());
        assert!(table.type_of("missing", code.len()).is_none());
    }

    #[test]
    fn test_render_signature() {
        let func =
            func_of("Contract A() { pub fn f(a: U256, mut b: Bool) -> (U256, Bool) { return a, b } }");
        assert_eq!(render_signature(&func), "fn f(a: U256, mut b: Bool) -> (U256, Bool)");

        let func = func_of("Contract A() { fn g() -> () { } }");
        assert_eq!(render_signature(&func), "fn g() -> ()");
    }
}
