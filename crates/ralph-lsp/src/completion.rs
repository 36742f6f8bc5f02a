// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! Completion.
//!
//! The dispatcher looks at the node under the cursor: inside a function
//! body it offers everything visible there (locals, fields, own and
//! inherited functions, built-ins, keywords), and after a `.` it narrows
//! to the receiver's members. Any other context completes to nothing.

use ralph_analyzer::ast::{FuncDef, TypeDef};
use ralph_analyzer::keywords;

use crate::build::dependency::DependencyId;
use crate::search::ast::{self, NodeRef};
use crate::search::inheritance;
use crate::search::{self, render_signature, ScopeTable};
use crate::workspace::source::SourceParsed;
use crate::workspace::WorkspaceState;

/// What a suggestion completes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Variable,
    Function,
    Type,
    Interface,
    Keyword,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub label: String,
    pub detail: String,
    pub documentation: Option<String>,
    pub insert: String,
    pub kind: SuggestionKind,
}

impl Suggestion {
    fn simple(label: impl Into<String>, detail: impl Into<String>, kind: SuggestionKind) -> Self {
        let label = label.into();
        Suggestion { insert: label.clone(), label, detail: detail.into(), documentation: None, kind }
    }
}

/// Keywords offered inside function bodies.
const BODY_KEYWORDS: &[&str] =
    &["let", "mut", "return", "if", "else", "while", "for", "emit", "true", "false"];

/// Compute suggestions for the cursor at `offset` in `source`.
pub fn complete(
    offset: usize,
    source: &SourceParsed,
    workspace: &WorkspaceState,
) -> Vec<Suggestion> {
    let path = ast::find_at(&source.ast, offset);

    let Some(func) = enclosing_body_func(&path, offset) else {
        return Vec::new();
    };
    let Some(def) = path.iter().find_map(|node| match node {
        NodeRef::TypeDef(def) => Some(*def),
        _ => None,
    }) else {
        return Vec::new();
    };

    let all = search::collect_parsed(workspace);

    if let Some(receiver) = dot_receiver(&source.code, offset) {
        return member_suggestions(&receiver, offset, func, def, &all);
    }

    let mut suggestions = Vec::new();

    // Locals visible at the cursor.
    let table = ScopeTable::build(func);
    for entry in table.visible_at(offset) {
        let detail = entry.tpe.map(|t| t.id.name.clone()).unwrap_or_else(|| "local".to_string());
        suggestions.push(Suggestion::simple(&entry.ident.name, detail, SuggestionKind::Variable));
    }

    // Contract fields and functions, own and inherited.
    push_members(def, &mut suggestions);
    for (_, parent) in inheritance::collect_inheritance_in_scope(def, &all) {
        push_members(parent, &mut suggestions);
    }

    // Built-in functions.
    if let Some(built_in) = workspace
        .build_compiled()
        .and_then(|build| build.find_dependency(DependencyId::BuiltIn))
    {
        for parsed in built_in.sources.iter().filter_map(|s| s.parsed_view()) {
            for def in &parsed.ast.definitions {
                for func in &def.functions {
                    suggestions.push(Suggestion::simple(
                        &func.id.name,
                        render_signature(func),
                        SuggestionKind::Function,
                    ));
                }
            }
        }
    }

    for keyword in BODY_KEYWORDS {
        debug_assert!(keywords::is_keyword(keyword));
        suggestions.push(Suggestion::simple(*keyword, "keyword", SuggestionKind::Keyword));
    }

    suggestions
}

fn push_members(def: &TypeDef, suggestions: &mut Vec<Suggestion>) {
    for field in &def.fields {
        suggestions.push(Suggestion::simple(
            &field.ident.name,
            format!("field: {}", field.tpe.id.name),
            SuggestionKind::Variable,
        ));
    }
    for constant in &def.constants {
        suggestions.push(Suggestion::simple(&constant.ident.name, "const", SuggestionKind::Variable));
    }
    for enum_def in &def.enums {
        suggestions.push(Suggestion::simple(&enum_def.id.name, "enum", SuggestionKind::Type));
    }
    for func in &def.functions {
        suggestions.push(Suggestion::simple(
            &func.id.name,
            render_signature(func),
            SuggestionKind::Function,
        ));
    }
}

/// Members of the receiver before a `.`: functions of its type (own and
/// inherited), or the fields of an enum.
fn member_suggestions(
    receiver: &str,
    offset: usize,
    func: &FuncDef,
    def: &TypeDef,
    all: &[&SourceParsed],
) -> Vec<Suggestion> {
    // Enum access stays local to the contract.
    if let Some(enum_def) = def.enums.iter().find(|e| e.id.name == receiver) {
        return enum_def
            .fields
            .iter()
            .map(|field| {
                Suggestion::simple(
                    &field.ident.name,
                    format!("{}.{}", enum_def.id.name, field.ident.name),
                    SuggestionKind::Variable,
                )
            })
            .collect();
    }

    let type_name = resolve_receiver_type(receiver, offset, func, def, all);
    let Some(type_name) = type_name else {
        return Vec::new();
    };

    let mut suggestions = Vec::new();
    for parsed in all {
        let Some(target) = parsed.ast.find_type(&type_name) else {
            continue;
        };
        let kind = if target.is_interface() {
            SuggestionKind::Interface
        } else {
            SuggestionKind::Function
        };
        for target_func in &target.functions {
            suggestions.push(Suggestion {
                label: target_func.id.name.clone(),
                detail: render_signature(target_func),
                documentation: None,
                insert: target_func.id.name.clone(),
                kind,
            });
        }
        for (_, parent) in inheritance::collect_inheritance_in_scope(target, all) {
            for parent_func in &parent.functions {
                suggestions.push(Suggestion::simple(
                    &parent_func.id.name,
                    render_signature(parent_func),
                    SuggestionKind::Function,
                ));
            }
        }
    }
    suggestions
}

fn resolve_receiver_type(
    receiver: &str,
    offset: usize,
    func: &FuncDef,
    def: &TypeDef,
    all: &[&SourceParsed],
) -> Option<String> {
    if let Some(tpe) = ScopeTable::build(func).type_of(receiver, offset) {
        return Some(tpe.id.name.clone());
    }
    if let Some(field) = def.fields.iter().find(|f| f.ident.name == receiver) {
        return Some(field.tpe.id.name.clone());
    }
    for (_, parent) in inheritance::collect_inheritance_in_scope(def, all) {
        if let Some(field) = parent.fields.iter().find(|f| f.ident.name == receiver) {
            return Some(field.tpe.id.name.clone());
        }
    }
    if all.iter().any(|parsed| parsed.ast.find_type(receiver).is_some()) {
        return Some(receiver.to_string());
    }
    None
}

/// The enclosing function whose body contains `offset`.
fn enclosing_body_func<'a>(path: &[NodeRef<'a>], offset: usize) -> Option<&'a FuncDef> {
    path.iter().find_map(|node| match node {
        NodeRef::FuncDef(func)
            if func.body.as_ref().map(|b| b.index.contains(offset)).unwrap_or(false) =>
        {
            Some(*func)
        }
        _ => None,
    })
}

/// If the cursor sits right after `receiver.` (possibly mid-word), the
/// receiver's name. Everything is a plain text scan so completion works on
/// code the parser has not caught up with.
fn dot_receiver(code: &str, offset: usize) -> Option<String> {
    let bytes = code.as_bytes();
    let mut i = offset.min(bytes.len());

    // Step over the partially typed member name.
    while i > 0 && is_ident_byte(bytes[i - 1]) {
        i -= 1;
    }
    if i == 0 || bytes[i - 1] != b'.' {
        return None;
    }

    let end = i - 1;
    let mut start = end;
    while start > 0 && is_ident_byte(bytes[start - 1]) {
        start -= 1;
    }
    if start == end {
        return None;
    }
    Some(code[start..end].to_string())
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_receiver() {
        let code = "return token.";
        assert_eq!(dot_receiver(code, code.len()), Some("token".to_string()));

        let code = "return token.tra";
        assert_eq!(dot_receiver(code, code.len()), Some("token".to_string()));

        assert_eq!(dot_receiver("return token", 12), None);
        assert_eq!(dot_receiver(".", 1), None);
    }
}
