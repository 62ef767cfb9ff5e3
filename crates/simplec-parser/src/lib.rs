mod expr;
pub mod parser;

pub use parser::Parser;

use simplec_syntax::ast::Program;
use simplec_syntax::error::Diagnostics;

/// Lex and parse `src`, returning the (possibly partial) program together
/// with every lexical and syntactic diagnostic.
pub fn parse(src: &str) -> (Program, Diagnostics) {
    let mut parser = Parser::from_source(src);
    let program = parser.parse_program();
    (program, parser.into_diagnostics())
}
