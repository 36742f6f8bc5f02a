//! The inheritance graph, queried on the fly.
//!
//! Nothing is cached across queries: the graph is recomputed from the
//! parsed sources each time, so edits never invalidate anything.

use ralph_analyzer::ast::TypeDef;
use std::collections::HashSet;

use crate::workspace::source::SourceParsed;

/// All transitive parents of `start` (`extends` and `implements`),
/// excluding `start` itself. Cycles, self-extension and duplicate parents
/// are collapsed by the visited set; each type appears at most once.
pub fn collect_inheritance_in_scope<'a>(
    start: &TypeDef,
    all: &[&'a SourceParsed],
) -> Vec<(&'a SourceParsed, &'a TypeDef)> {
    let mut result = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.id.name.clone());

    let mut worklist: Vec<String> =
        start.inheritance.iter().map(|i| i.parent.name.clone()).collect();

    while let Some(name) = worklist.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        if let Some((source, def)) = find_type(&name, all) {
            result.push((source, def));
            worklist.extend(def.inheritance.iter().map(|i| i.parent.name.clone()));
        }
    }

    result
}

/// The reverse direction: every type that transitively extends or
/// implements `target`.
pub fn collect_implementing_children<'a>(
    target: &TypeDef,
    all: &[&'a SourceParsed],
) -> Vec<(&'a SourceParsed, &'a TypeDef)> {
    let mut result = Vec::new();
    for source in all {
        for def in &source.ast.definitions {
            if def.id.name == target.id.name {
                continue;
            }
            let parents = collect_inheritance_in_scope(def, all);
            if parents.iter().any(|(_, parent)| parent.id.name == target.id.name) {
                result.push((*source, def));
            }
        }
    }
    result
}

fn find_type<'a>(name: &str, all: &[&'a SourceParsed]) -> Option<(&'a SourceParsed, &'a TypeDef)> {
    for source in all {
        if let Some(def) = source.ast.find_type(name) {
            return Some((*source, def));
        }
    }
    None
}
