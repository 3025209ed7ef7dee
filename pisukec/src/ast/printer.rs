///
/// AST Text Form
///
/// Renders a Program back into source-like text. Infix expressions are fully
/// parenthesized so the printed form shows how precedence was resolved.
/// Used by `pisuke debug` and by parser tests.
///

use lasso::Rodeo;

use super::expressions::*;
use super::statements::*;
use super::types::*;
use super::Program;

pub fn render_program(program: &Program, interner: &Rodeo) -> String {
    let mut p = Printer {
        interner,
        out: String::new(),
        indent: 0,
    };
    for stmt in &program.statements {
        p.statement(stmt);
    }
    p.out
}

pub fn render_expression(expr: &Expression, interner: &Rodeo) -> String {
    let mut p = Printer {
        interner,
        out: String::new(),
        indent: 0,
    };
    p.expression(expr);
    p.out
}

struct Printer<'a> {
    interner: &'a Rodeo,
    out: String,
    indent: usize,
}

impl Printer<'_> {
    fn name(&self, ident: &Ident) -> &str {
        self.interner.resolve(&ident.symbol)
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn statement(&mut self, stmt: &Statement) {
        self.write_indent();
        match stmt {
            Statement::Let(s) => self.binding("let", &s.name, s.ty.as_ref(), &s.value),
            Statement::Const(s) => self.binding("const", &s.name, s.ty.as_ref(), &s.value),
            Statement::Return(s) => {
                self.out.push_str("return");
                if let Some(ref value) = s.value {
                    self.out.push(' ');
                    self.expression(value);
                }
            }
            Statement::Expression(s) => self.expression(&s.expr),
            Statement::TypeDef(def) => {
                self.out.push_str("type ");
                self.out.push_str(self.interner.resolve(&def.name.symbol));
                self.out.push_str(" = ");
                self.type_body(def);
            }
            Statement::Block(block) => self.block(block),
        }
        self.out.push('\n');
    }

    fn binding(&mut self, keyword: &str, name: &Ident, ty: Option<&Ident>, value: &Expression) {
        self.out.push_str(keyword);
        self.out.push(' ');
        self.out.push_str(self.interner.resolve(&name.symbol));
        if let Some(ty) = ty {
            self.out.push_str(": ");
            self.out.push_str(self.interner.resolve(&ty.symbol));
        }
        self.out.push_str(" = ");
        self.expression(value);
    }

    fn block(&mut self, block: &BlockStmt) {
        self.out.push_str("{\n");
        self.indent += 1;
        for stmt in &block.statements {
            self.statement(stmt);
        }
        self.indent -= 1;
        self.write_indent();
        self.out.push('}');
    }

    fn type_body(&mut self, def: &TypeDefinition) {
        self.out.push_str("{ ");
        for (i, field) in def.fields.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(self.interner.resolve(&field.name.symbol));
            self.out.push_str(": ");
            match &field.ty {
                FieldType::Named(ty) => self.out.push_str(self.interner.resolve(&ty.symbol)),
                FieldType::Nested(nested) => self.type_body(nested),
            }
        }
        self.out.push_str(" }");
    }

    fn expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Identifier(ident) => {
                let text = self.name(ident).to_string();
                self.out.push_str(&text);
            }
            Expression::Int(lit) => self.out.push_str(&lit.value.to_string()),
            Expression::String(lit) => {
                let quoted = quote(self.interner.resolve(&lit.value));
                self.out.push_str(&quoted);
            }
            Expression::List(list) => {
                self.out.push('[');
                self.comma_list(&list.elements);
                self.out.push(']');
            }
            Expression::Map(map) => {
                self.out.push('{');
                for (i, entry) in map.entries.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    let key = match entry.key {
                        MapKey::String(s) => quote(self.interner.resolve(&s.value)),
                        MapKey::Ident(id) => self.interner.resolve(&id.symbol).to_string(),
                    };
                    self.out.push_str(&key);
                    self.out.push_str(": ");
                    self.expression(&entry.value);
                }
                self.out.push('}');
            }
            Expression::Index(index) => {
                self.expression(&index.object);
                self.out.push('[');
                self.expression(&index.index);
                self.out.push(']');
            }
            Expression::Member(member) => {
                self.expression(&member.object);
                self.out.push('.');
                self.out.push_str(self.interner.resolve(&member.property.symbol));
            }
            Expression::Infix(infix) => {
                self.out.push('(');
                self.expression(&infix.left);
                self.out.push(' ');
                self.out.push_str(infix.op.as_str());
                self.out.push(' ');
                self.expression(&infix.right);
                self.out.push(')');
            }
            Expression::Function(func) => {
                self.out.push_str("fn");
                if let Some(ref name) = func.name {
                    self.out.push(' ');
                    self.out.push_str(self.interner.resolve(&name.symbol));
                }
                self.out.push('(');
                for (i, param) in func.params.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(self.interner.resolve(&param.name.symbol));
                    if let Some(ref ty) = param.ty {
                        self.out.push_str(": ");
                        self.out.push_str(self.interner.resolve(&ty.symbol));
                    }
                }
                self.out.push(')');
                if let Some(ref ret) = func.return_ty {
                    self.out.push_str(": ");
                    self.out.push_str(self.interner.resolve(&ret.symbol));
                }
                self.out.push(' ');
                self.block(&func.body);
            }
            Expression::Call(call) => {
                self.expression(&call.callee);
                self.out.push('(');
                self.comma_list(&call.args);
                self.out.push(')');
            }
        }
    }

    fn comma_list(&mut self, exprs: &[Expression]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expression(expr);
        }
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn roundtrip(source: &str) -> String {
        let (tokens, interner) = tokenize(source);
        let result = parse(&tokens, source);
        assert!(result.errors.is_empty(), "Errors: {:?}", result.errors);
        render_program(&result.ast, &interner)
    }

    #[test]
    fn test_precedence_is_visible() {
        assert_eq!(roundtrip("let x = 1 + 2 * 3"), "let x = (1 + (2 * 3))\n");
        assert_eq!(roundtrip("let x = 1 * 2 + 3"), "let x = ((1 * 2) + 3)\n");
    }

    #[test]
    fn test_type_and_function() {
        let text = roundtrip(
            "type User = { id: int, name: { n: string } }\nfn add(a: int, b): int { return a + b }",
        );
        assert_eq!(
            text,
            "type User = { id: int, name: { n: string } }\nfn add(a: int, b): int {\n  return (a + b)\n}\n"
        );
    }

    #[test]
    fn test_postfix_chain() {
        assert_eq!(
            roundtrip(r#"print(req.query["name"], [1, "a\n"])"#),
            "print(req.query[\"name\"], [1, \"a\\n\"])\n"
        );
    }
}
