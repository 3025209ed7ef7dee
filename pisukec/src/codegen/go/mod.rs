///
/// Go Code Generation
///
/// Lowers a pisuke Program to a single Go source file in `package main`.
///
/// Emission happens in two phases:
/// 1. The body is written into the generator's buffer while the packages it
///    needs accumulate as Capabilities
/// 2. `package main`, an import block built from exactly those
///    capabilities (omitted when empty), and the body are concatenated
///
/// Body layout:
/// - top-level record definitions, as Go struct types
/// - top-level bindings the declared functions read, at package level
/// - top-level declared functions, as Go funcs
/// - `func main()` holding every other top-level statement in order
///
/// Expressions render to a `Rendered` value (text plus capabilities) that
/// the caller merges. Function bodies are emitted by a child generator with
/// its own buffer, so no rendering step writes into another's output.
///
/// Submodules:
/// - capabilities: Go package tracking
/// - shapes: static shapes of expressions
/// - types: Go type names, zero values, struct declarations
/// - expressions: expression rendering
/// - statements: statement and function emission
/// - routes: the `server` builtin lowerings
///

pub mod capabilities;
mod expressions;
mod routes;
pub mod shapes;
mod statements;
pub mod types;

use std::collections::HashMap;

use lasso::{Rodeo, Spur};

use crate::ast::{declared_function, Program, Statement};
use crate::codegen::CodegenError;
use crate::typechecker::SymbolTable;

pub use capabilities::{Capabilities, Capability, Rendered};
pub use shapes::Shape;

use statements::{
    emit_declared_function, emit_main_statement, emit_package_statement, package_bindings,
};
use types::emit_type_decl;

/// Where a `return` inside the current body sends its value.
#[derive(Debug, Clone, PartialEq)]
enum ReturnMode<'a> {
    /// Inside `func main()`.
    Main,
    /// Inside a Go func; a bare `return` yields the given zero value.
    Function { zero: String, shape: Shape<'a> },
    /// Inside a route handler; the value lands in `returnValue`.
    Handler,
}

pub struct GoGenerator<'a> {
    interner: &'a Rodeo,
    symbols: &'a SymbolTable<'a>,
    scopes: Vec<HashMap<Spur, Shape<'a>>>,
    out: String,
    indent: usize,
    caps: Capabilities,
    returns: ReturnMode<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProgram {
    pub source: String,
    pub capabilities: Capabilities,
}

pub fn generate(program: &Program, interner: &Rodeo) -> Result<String, CodegenError> {
    generate_program(program, interner).map(|p| p.source)
}

pub fn generate_program(
    program: &Program,
    interner: &Rodeo,
) -> Result<GeneratedProgram, CodegenError> {
    let symbols = SymbolTable::collect(program);
    let mut g = GoGenerator::new(interner, &symbols);
    g.emit_program(program)?;
    let (body, capabilities) = g.finish();

    let mut source = String::with_capacity(body.len() + 128);
    source.push_str("package main\n\n");
    if !capabilities.is_empty() {
        source.push_str("import (\n");
        for path in capabilities.import_paths() {
            source.push_str(&format!("\t\"{}\"\n", path));
        }
        source.push_str(")\n\n");
    }
    source.push_str(&body);

    tracing::debug!(
        bytes = source.len(),
        imports = ?capabilities.import_paths(),
        "generated Go source"
    );
    Ok(GeneratedProgram {
        source,
        capabilities,
    })
}

impl<'a> GoGenerator<'a> {
    pub fn new(interner: &'a Rodeo, symbols: &'a SymbolTable<'a>) -> Self {
        Self {
            interner,
            symbols,
            scopes: vec![HashMap::new()],
            out: String::with_capacity(4096),
            indent: 0,
            caps: Capabilities::new(),
            returns: ReturnMode::Main,
        }
    }

    /// A generator for a nested body. It sees the enclosing bindings
    /// through a copy of the scope stack and writes to its own buffer.
    fn child(&self, indent: usize, returns: ReturnMode<'a>) -> Self {
        let mut scopes = self.scopes.clone();
        scopes.push(HashMap::new());
        Self {
            interner: self.interner,
            symbols: self.symbols,
            scopes,
            out: String::new(),
            indent,
            caps: Capabilities::new(),
            returns,
        }
    }

    fn finish(self) -> (String, Capabilities) {
        (self.out, self.caps)
    }

    fn emit_program(&mut self, program: &'a Program) -> Result<(), CodegenError> {
        let symbols = self.symbols;
        for def in symbols.types() {
            emit_type_decl(self, def);
            self.write("\n");
        }

        let hoisted = package_bindings(program);
        let is_hoisted = |stmt: &Statement| {
            stmt.as_binding()
                .is_some_and(|binding| hoisted.contains(&binding.name.symbol))
        };
        let mut package_level = false;
        for stmt in program.statements.iter().filter(|&stmt| is_hoisted(stmt)) {
            emit_package_statement(self, stmt)?;
            package_level = true;
        }
        if package_level {
            self.write("\n");
        }

        for func in program.statements.iter().filter_map(declared_function) {
            emit_declared_function(self, func)?;
            self.write("\n");
        }

        self.write_line("func main() {");
        self.indent += 1;
        for stmt in &program.statements {
            if matches!(stmt, Statement::TypeDef(_)) || is_hoisted(stmt) {
                continue;
            }
            emit_main_statement(self, stmt)?;
        }
        self.indent -= 1;
        self.write_line("}");
        Ok(())
    }

    pub fn symbols(&self) -> &'a SymbolTable<'a> {
        self.symbols
    }

    pub fn resolve(&self, symbol: Spur) -> &'a str {
        self.interner.resolve(&symbol)
    }

    fn write(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn indentation(&self) -> String {
        "\t".repeat(self.indent)
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn write_line(&mut self, line: &str) {
        self.write_indent();
        self.out.push_str(line);
        self.out.push('\n');
    }

    /// Take a rendered fragment's capabilities and hand back its text.
    fn absorb(&mut self, rendered: Rendered) -> String {
        self.caps.merge(rendered.caps);
        rendered.code
    }

    fn require(&mut self, cap: Capability) {
        self.caps.insert(cap);
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn define(&mut self, name: Spur, shape: Shape<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, shape);
        }
    }

    /// Whether a local binding named `name` is in scope.
    fn is_bound(&self, name: Spur) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(&name))
    }

    fn lookup(&self, name: Spur) -> Shape<'a> {
        if let Some(shape) = self.scopes.iter().rev().find_map(|s| s.get(&name)) {
            return *shape;
        }
        if self.symbols.get_function(name).is_some() {
            return Shape::Func;
        }
        Shape::Any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn go(source: &str) -> GeneratedProgram {
        let (tokens, interner) = tokenize(source);
        let result = parse(&tokens, source);
        assert!(result.errors.is_empty(), "Parse errors: {:?}", result.errors);
        generate_program(&result.ast, &interner).unwrap()
    }

    #[test]
    fn test_let_binding_is_marked_used() {
        let out = go("let x = 5");
        assert_eq!(out.source, "package main\n\nfunc main() {\n\tvar x = 5\n\t_ = x\n}\n");
        assert!(out.capabilities.is_empty());
    }

    #[test]
    fn test_layout_types_then_functions_then_main() {
        let out = go("print(add(1, 2))\nfn add(a: int, b: int): int { return a + b }\ntype P = { x: int }");
        let src = &out.source;
        let ty = src.find("type P struct").unwrap();
        let func = src.find("func add(a int, b int) int {").unwrap();
        let main = src.find("func main() {").unwrap();
        assert!(ty < func && func < main);
        assert!(src.contains("\tfmt.Println(add(1, 2))\n"));
        assert!(src.contains("\treturn (a + b)\n"));
        assert_eq!(out.capabilities, Capabilities::of(&[Capability::Fmt]));
    }

    #[test]
    fn test_bindings_read_by_functions_live_at_package_level() {
        let out = go("const greeting = \"Hello, \"\nfn greet(name: string): string { return greeting + name }\nprint(greet(\"a\"))");
        assert_eq!(
            out.source,
            "package main\n\n\
             import (\n\t\"fmt\"\n)\n\n\
             const greeting = \"Hello, \"\n\n\
             func greet(name string) string {\n\treturn (greeting + name)\n}\n\n\
             func main() {\n\tfmt.Println(greet(\"a\"))\n}\n"
        );
    }

    #[test]
    fn test_package_bindings_follow_references_transitively() {
        let out = go("let base = 40\nlet answer = base + 2\nlet unused = 1\nfn get(): int { return answer }\nprint(get())");
        let src = &out.source;
        let base = src.find("var base = 40\n").unwrap();
        let answer = src.find("var answer = (base + 2)\n").unwrap();
        let func = src.find("func get() int {\n\treturn answer\n}").unwrap();
        let main = src.find("func main() {\n\tvar unused = 1\n\t_ = unused\n").unwrap();
        assert!(base < answer && answer < func && func < main);
        assert!(!src.contains("_ = base"));
        assert!(!src.contains("_ = answer"));
    }

    #[test]
    fn test_imports_follow_capabilities() {
        let out = go("server.serve(8080)");
        assert!(out.source.starts_with("package main\n\nimport (\n\t\"log\"\n\t\"net/http\"\n)\n\n"));
    }
}
