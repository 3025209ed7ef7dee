//!
//! Module Loader
//!
//! Builds one Program out of an entry file and everything it imports,
//! parsing each file separately:
//!
//! - every file gets its own id in a shared SourceMap, and all files lex
//!   into one shared interner, so spans and symbols from different files
//!   coexist in a single AST
//! - directives are blanked out of the text before lexing (byte offsets
//!   are kept), so the parser never sees them
//! - an imported module's statements are spliced in front of the first
//!   importer statement that begins after the directive, which is the
//!   order textual inlining would produce
//!
//! Parse errors are collected from all files; import failures abort.
//!

use std::path::Path;

use lasso::Rodeo;

use crate::ast::{Program, Statement};
use crate::lexer::tokenize_with;
use crate::parser::{parse, ParseError};
use crate::source::{SourceFile, SourceMap, Spanned};

use super::{blank_directives, read_module, scan_directives, ImportResult, Resolver};

#[derive(Debug)]
pub struct LoadedProgram {
    pub program: Program,
    pub sources: SourceMap,
    pub interner: Rodeo,
    pub errors: Vec<ParseError>,
}

pub struct ModuleLoader {
    resolver: Resolver,
    sources: SourceMap,
    interner: Rodeo,
    errors: Vec<ParseError>,
}

impl ModuleLoader {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            sources: SourceMap::new(),
            interner: Rodeo::default(),
            errors: Vec::new(),
        }
    }

    pub fn load(mut self, entry: &Path) -> ImportResult<LoadedProgram> {
        self.resolver.mark_visited(entry)?;
        let (statements, span) = self.load_file(entry)?;

        tracing::info!(
            entry = %entry.display(),
            files = self.sources.len(),
            statements = statements.len(),
            parse_errors = self.errors.len(),
            "loaded program"
        );
        Ok(LoadedProgram {
            program: Program::new(statements, span),
            sources: self.sources,
            interner: self.interner,
            errors: self.errors,
        })
    }

    fn load_file(&mut self, path: &Path) -> ImportResult<(Vec<Statement>, crate::source::Span)> {
        let text = read_module(path)?;
        let directives = scan_directives(&text);
        let blanked = blank_directives(&text, &directives);

        let file_id = self.sources.add(SourceFile::new(path.display().to_string(), text));
        let tokens = tokenize_with(&blanked, file_id, &mut self.interner);
        let result = parse(&tokens, &blanked);
        tracing::debug!(
            file = %path.display(),
            file_id,
            directives = directives.len(),
            statements = result.ast.statements.len(),
            "parsed module"
        );
        self.errors.extend(result.errors);

        let mut imports = Vec::with_capacity(directives.len());
        for directive in &directives {
            let file = self.resolver.resolve(path, &directive.path)?;
            if !self.resolver.mark_visited(&file)? {
                tracing::debug!(module = %directive.path, "module already loaded");
                continue;
            }
            let (statements, _) = self.load_file(&file)?;
            imports.push((directive.range.end, statements));
        }

        Ok((splice(result.ast.statements, imports), result.ast.span))
    }
}

/// Place each import group before the first statement starting at or after
/// its directive's end offset.
fn splice(statements: Vec<Statement>, imports: Vec<(usize, Vec<Statement>)>) -> Vec<Statement> {
    if imports.is_empty() {
        return statements;
    }
    let mut out = Vec::with_capacity(statements.len());
    let mut imports = imports.into_iter().peekable();

    for stmt in statements {
        let start = stmt.span().start as usize;
        while let Some((_, imported)) = imports.next_if(|(at, _)| *at <= start) {
            out.extend(imported);
        }
        out.push(stmt);
    }
    for (_, imported) in imports {
        out.extend(imported);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::render_program;
    use std::fs;

    fn load(dir: &Path, entry: &str) -> LoadedProgram {
        ModuleLoader::new(Resolver::new(dir))
            .load(&dir.join(entry))
            .unwrap()
    }

    #[test]
    fn test_statements_spliced_at_directive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("m.psk"), "let b = 2").unwrap();
        fs::write(
            dir.path().join("main.psk"),
            "let a = 1\nimport { b } from \"m\"\nlet c = a + b",
        )
        .unwrap();

        let loaded = load(dir.path(), "main.psk");
        assert!(loaded.errors.is_empty(), "{:?}", loaded.errors);
        assert_eq!(
            render_program(&loaded.program, &loaded.interner),
            "let a = 1\nlet b = 2\nlet c = (a + b)\n"
        );
        assert_eq!(loaded.sources.len(), 2);
    }

    #[test]
    fn test_spans_point_into_their_own_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("m.psk"), "\n\nlet = 2").unwrap();
        fs::write(dir.path().join("main.psk"), "import { b } from \"m\"\nlet a = 1").unwrap();

        let loaded = load(dir.path(), "main.psk");
        assert_eq!(loaded.errors.len(), 1);
        let span = loaded.errors[0].span;
        assert_eq!(span.file_id, 1);
        let file = loaded.sources.get(span.file_id).unwrap();
        assert_eq!(file.line_col(span.start), (3, 5));
    }

    #[test]
    fn test_diamond_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.psk"), "type Base = { id: int }").unwrap();
        fs::write(dir.path().join("left.psk"), "import { Base } from \"base\"\nlet l = 1").unwrap();
        fs::write(dir.path().join("right.psk"), "import { Base } from \"base\"\nlet r = 2").unwrap();
        fs::write(
            dir.path().join("main.psk"),
            "import { l } from \"left\"\nimport { r } from \"right\"\nprint(l, r)",
        )
        .unwrap();

        let loaded = load(dir.path(), "main.psk");
        assert_eq!(loaded.program.type_definitions().count(), 1);
        assert_eq!(loaded.sources.len(), 4);
        assert_eq!(
            render_program(&loaded.program, &loaded.interner),
            "type Base = { id: int }\nlet l = 1\nlet r = 2\nprint(l, r)\n"
        );
    }

    #[test]
    fn test_trailing_import_appended() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("m.psk"), "let z = 0").unwrap();
        fs::write(dir.path().join("main.psk"), "let a = 1\nimport { z } from \"m\"").unwrap();
        let loaded = load(dir.path(), "main.psk");
        assert_eq!(loaded.program.statements.len(), 2);
    }
}
