//! Facade over the batch compiler in `ralph-analyzer`.
//!
//! The rest of the server never names analyzer error types: everything that
//! comes back from here is already a [`CompilerMessage`] or an AST.

use ralph_analyzer::checker::{CompileOptions, CompileResult};
use ralph_analyzer::{CompilerMessage, SourceAst};
use url::Url;

use crate::workspace::source::SourceParsed;

/// Parse one source file into an AST.
pub fn parse_source(file_uri: &Url, code: &str) -> Result<SourceAst, CompilerMessage> {
    ralph_analyzer::parse(file_uri, code)
        .map_err(|error| CompilerMessage::error(error.message, error.index))
}

/// Compile the flat contract list of a workspace.
///
/// `sources` are the workspace's parsed files; `dependencies` are the
/// dependency sources their imports referenced. The result carries one
/// outcome per entry of `sources`, in order.
pub fn compile_sources(
    sources: &[&SourceParsed],
    dependencies: &[&SourceAst],
    options: &CompileOptions,
) -> CompileResult {
    let asts: Vec<&SourceAst> = sources.iter().map(|parsed| &parsed.ast).collect();
    ralph_analyzer::compile(&asts, dependencies, options)
}
