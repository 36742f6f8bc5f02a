//! Translating workspace state into LSP diagnostics.
//!
//! Every state carries its diagnostics; this module flattens one state
//! into a per-URI map, and diffs two maps so URIs whose problems went away
//! get an explicit empty publish (stale-error suppression).

use std::collections::HashMap;

use lsp_types::{Diagnostic, DiagnosticSeverity};
use ralph_analyzer::{CompilerMessage, MessageKind};
use url::Url;

use crate::server::utils;
use crate::workspace::source::SourceCodeState;
use crate::workspace::WorkspaceState;

const SOURCE_NAME: &str = "ralphc";

fn severity(kind: MessageKind) -> DiagnosticSeverity {
    match kind {
        MessageKind::Error => DiagnosticSeverity::ERROR,
        MessageKind::Warning => DiagnosticSeverity::WARNING,
        MessageKind::Info => DiagnosticSeverity::INFORMATION,
    }
}

fn to_diagnostic(message: &CompilerMessage, code: Option<&str>) -> Diagnostic {
    let range = code
        .map(|code| utils::index_to_range(code, &message.index))
        .unwrap_or_default();
    Diagnostic {
        range,
        severity: Some(severity(message.kind)),
        source: Some(SOURCE_NAME.to_string()),
        message: message.message.clone(),
        ..Default::default()
    }
}

/// All diagnostics of `state`, keyed by URI. Every tracked URI (sources
/// and the build file) gets an entry, even an empty one, so diffing two
/// states sees clean files.
pub fn collect(state: &WorkspaceState) -> HashMap<Url, Vec<Diagnostic>> {
    let mut map: HashMap<Url, Vec<Diagnostic>> = HashMap::new();

    for source in state.sources() {
        let entry = map.entry(source.file_uri().clone()).or_default();
        match source {
            SourceCodeState::ErrorAccess { error, .. } => {
                entry.push(to_diagnostic(error, None));
            }
            SourceCodeState::ErrorSource { code, errors, .. } => {
                entry.extend(errors.iter().map(|e| to_diagnostic(e, Some(code))));
            }
            SourceCodeState::Compiled(compiled) => {
                entry.extend(compiled.warnings.iter().map(|w| to_diagnostic(w, Some(&compiled.code))));
            }
            SourceCodeState::OnDisk { .. }
            | SourceCodeState::UnCompiled { .. }
            | SourceCodeState::Parsed(_) => {}
        }
    }

    match state {
        WorkspaceState::Errored(errored) => {
            if let Some(build) = &errored.build {
                let entry = map.entry(build.build_uri.clone()).or_default();
                entry.extend(
                    build.errors.iter().map(|e| to_diagnostic(e, build.code.as_deref())),
                );
            }
            for error in &errored.errors {
                map.entry(error.index.file.clone())
                    .or_default()
                    .push(to_diagnostic(error, None));
            }
        }
        other => {
            // A valid build still claims its URI so stale build errors
            // clear once fixed.
            if let Some(build) = other.build_compiled() {
                map.entry(build.build_uri.clone()).or_default();
            }
        }
    }

    map
}

/// What to publish when moving from `previous` to `current`: everything
/// `current` tracks, plus an empty list for any URI that had diagnostics
/// before and is no longer tracked.
pub fn delta(
    previous: &HashMap<Url, Vec<Diagnostic>>,
    current: &HashMap<Url, Vec<Diagnostic>>,
) -> Vec<(Url, Vec<Diagnostic>)> {
    let mut publishes: Vec<(Url, Vec<Diagnostic>)> =
        current.iter().map(|(uri, diags)| (uri.clone(), diags.clone())).collect();

    for (uri, diags) in previous {
        if !diags.is_empty() && !current.contains_key(uri) {
            publishes.push((uri.clone(), Vec::new()));
        }
    }

    publishes.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
    publishes
}

#[cfg(test)]
mod tests {
    use super::*;
    use ralph_analyzer::SourceIndex;

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///w/{name}")).unwrap()
    }

    fn error_at(name: &str) -> Diagnostic {
        to_diagnostic(
            &CompilerMessage::error("boom", SourceIndex::zero(uri(name))),
            None,
        )
    }

    #[test]
    fn test_delta_publishes_current_entries() {
        let previous = HashMap::new();
        let mut current = HashMap::new();
        current.insert(uri("a.ral"), vec![error_at("a.ral")]);

        let publishes = delta(&previous, &current);
        assert_eq!(publishes.len(), 1);
        assert_eq!(publishes[0].1.len(), 1);
    }

    #[test]
    fn test_delta_clears_stale_uris() {
        let mut previous = HashMap::new();
        previous.insert(uri("gone.ral"), vec![error_at("gone.ral")]);
        previous.insert(uri("clean.ral"), Vec::new());
        let current = HashMap::new();

        let publishes = delta(&previous, &current);
        // Only the URI that actually had diagnostics is cleared.
        assert_eq!(publishes, vec![(uri("gone.ral"), Vec::new())]);
    }

    #[test]
    fn test_delta_prefers_current_over_previous() {
        let mut previous = HashMap::new();
        previous.insert(uri("a.ral"), vec![error_at("a.ral")]);
        let mut current = HashMap::new();
        current.insert(uri("a.ral"), Vec::new());

        let publishes = delta(&previous, &current);
        assert_eq!(publishes, vec![(uri("a.ral"), Vec::new())]);
    }
}
