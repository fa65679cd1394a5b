//! JavaScript reformatting for minified bundles.
//!
//! The script is parsed into an AST and printed back out with one statement
//! per line, so URL literals buried in a single-line bundle become easy to
//! scan. Scripts that do not parse are rejected with
//! [`ScanError::ParseError`] and callers scan the raw text instead.

use crate::error::{Result, ScanError};
use oxc_allocator::Allocator;
use oxc_codegen::CodeGenerator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use tracing::trace;

pub fn beautify(source: &str) -> Result<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true);

    let parser_result = Parser::new(&allocator, source, source_type).parse();

    if let Some(first) = parser_result.errors.first() {
        trace!("Script parse produced {} errors", parser_result.errors.len());
        return Err(ScanError::ParseError(format!(
            "{} syntax errors, first: {}",
            parser_result.errors.len(),
            first
        )));
    }

    Ok(CodeGenerator::new().build(&parser_result.program).source_text)
}
