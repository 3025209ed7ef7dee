///
/// pisukec - The pisuke Compiler Library
///
/// This crate provides the compiler for pisuke, a small language for
/// declaring HTTP services. Programs are lowered to Go and built with the
/// Go toolchain. It includes:
///
/// - source: Source files, spans, and the multi-file source map
/// - lexer: Tokenization of pisuke source code
/// - ast: Abstract syntax tree definitions
/// - parser: Parsing tokens into AST
/// - modules: Import directives, textual inlining, and module loading
/// - typechecker: Structural checks of records, members, and calls
/// - codegen: Go code generation and the `go build` driver
/// - config: `pisuke.toml` project settings
/// - diagnostic: Error rendering with source context
///
/// Entry points:
/// - `tokenize`: Convert source text into tokens
/// - `parse`: Parse tokens into AST
/// - `check`: Type check an AST
/// - `generate`: Generate Go source from an AST
///

pub mod ast;
pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod lexer;
pub mod modules;
pub mod parser;
pub mod source;
pub mod typechecker;

pub use codegen::go::generate;
pub use codegen::{build_binary, BuildConfig, CodegenError};
pub use config::Config;
pub use diagnostic::DiagnosticReporter;
pub use lexer::tokenize;
pub use modules::{ModuleLoader, Resolver};
pub use parser::parse;
pub use source::SourceFile;
pub use typechecker::check;

#[test]
fn test_parse_service_example() {
    let source = include_str!("../tests/fixtures/service.psk");

    let (tokens, interner) = tokenize(source);
    let result = parse(&tokens, source);
    assert!(result.errors.is_empty(), "Parse errors: {:?}", result.errors);
    assert_eq!(result.ast.statements.len(), 9);
    assert!(check(&result.ast, &interner).is_empty());
}
