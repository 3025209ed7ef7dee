///
/// Server Builtin Lowering
///
/// The `server` object is not a value: calls on it are rewritten into
/// net/http registrations at compile time.
///
/// - `server.serve(port)` -> `log.Fatal(http.ListenAndServe(":port", nil))`
/// - `server.static(dir)` -> a FileServer mounted at `/`
/// - `server.route(path, fn(req) { ... })` -> `http.HandleFunc`
///
/// A route handler receives its request as a `map[string]interface{}` with
/// `query`, `params` (when the path has `:name` segments) and, for POST and
/// PUT, the decoded JSON `body`. Whatever the handler returns is written
/// back: strings verbatim, everything else as JSON.
///

use lasso::Spur;

use crate::ast::{walk_stmt, CallExpr, Expression, FunctionLiteral, Statement, Visitor};
use crate::codegen::CodegenError;
use crate::source::{Span, Spanned};

use super::capabilities::{Capabilities, Capability, Rendered};
use super::expressions::{coerce, render_expression};
use super::shapes::Shape;
use super::statements::emit_statements;
use super::types::go_quote;
use super::{GoGenerator, ReturnMode};

/// Upper bound on a request body the handler will decode.
const MAX_BODY_BYTES: &str = "1<<20";

fn malformed(method: &str, reason: impl Into<String>, span: Span) -> CodegenError {
    CodegenError::MalformedBuiltin {
        method: format!("server.{}", method),
        reason: reason.into(),
        span,
    }
}

fn expect_args(call: &CallExpr, method: &str, count: usize) -> Result<(), CodegenError> {
    if call.args.len() != count {
        let plural = if count == 1 { "" } else { "s" };
        return Err(malformed(
            method,
            format!("expects {} argument{}, got {}", count, plural, call.args.len()),
            call.span,
        ));
    }
    Ok(())
}

pub(super) fn lower_serve<'a>(
    g: &GoGenerator<'a>,
    call: &'a CallExpr,
) -> Result<Rendered, CodegenError> {
    expect_args(call, "serve", 1)?;
    let port = &call.args[0];

    let addr = match port {
        Expression::Int(lit) => Rendered::new(format!("\":{}\"", lit.value)),
        Expression::String(lit) => {
            let text = g.resolve(lit.value);
            let addr = if text.starts_with(':') {
                text.to_string()
            } else {
                format!(":{}", text)
            };
            Rendered::new(go_quote(&addr))
        }
        other => render_expression(g, other)?
            .map(|e| format!("fmt.Sprintf(\":%v\", {})", e))
            .require(Capability::Fmt),
    };

    Ok(addr
        .map(|a| format!("log.Fatal(http.ListenAndServe({}, nil))", a))
        .require(Capability::Log)
        .require(Capability::Http))
}

pub(super) fn lower_static<'a>(
    g: &GoGenerator<'a>,
    call: &'a CallExpr,
) -> Result<Rendered, CodegenError> {
    expect_args(call, "static", 1)?;
    let dir = &call.args[0];
    let rendered = coerce(render_expression(g, dir)?, g.shape_of(dir), Shape::String);
    Ok(rendered
        .map(|d| format!("http.Handle(\"/\", http.FileServer(http.Dir({})))", d))
        .require(Capability::Http))
}

/// A route path split into segments, with the positions of its `:name`
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    pub path: String,
    pub segments: Vec<String>,
    pub params: Vec<(String, usize)>,
}

impl RoutePattern {
    pub fn parse(path: &str) -> Self {
        let segments: Vec<String> = path.trim_matches('/').split('/').map(String::from).collect();
        let params = segments
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.strip_prefix(':').map(|name| (name.to_string(), i)))
            .collect();
        Self {
            path: path.to_string(),
            segments,
            params,
        }
    }

    /// The pattern handed to `http.HandleFunc`. net/http has no path
    /// parameters, so a dynamic route registers the subtree rooted at its
    /// static prefix.
    pub fn registration(&self) -> String {
        let Some(&(_, first)) = self.params.first() else {
            return self.path.clone();
        };
        let prefix: Vec<&str> = self.segments[..first]
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        if prefix.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", prefix.join("/"))
        }
    }
}

pub(super) fn lower_route<'a>(
    g: &GoGenerator<'a>,
    call: &'a CallExpr,
) -> Result<Rendered, CodegenError> {
    expect_args(call, "route", 2)?;

    let path = match &call.args[0] {
        Expression::String(lit) => g.resolve(lit.value),
        other => return Err(malformed("route", "path must be a string literal", other.span())),
    };
    let handler = match &call.args[1] {
        Expression::Function(func) => func,
        other => return Err(malformed("route", "handler must be a function literal", other.span())),
    };
    if handler.params.len() > 1 {
        return Err(malformed(
            "route",
            format!("handler takes at most 1 parameter, got {}", handler.params.len()),
            handler.span,
        ));
    }

    let pattern = RoutePattern::parse(path);
    tracing::debug!(
        path,
        registration = %pattern.registration(),
        params = pattern.params.len(),
        "lowering route"
    );

    let (body, caps) = render_handler_body(g, handler, &pattern)?;
    Ok(Rendered::with_caps(
        format!(
            "http.HandleFunc({}, func(w http.ResponseWriter, r *http.Request) {{\n{}{}}})",
            go_quote(&pattern.registration()),
            body,
            g.indentation()
        ),
        caps,
    ))
}

/// Names the handler preamble declares in the handler's own Go scope.
const PREAMBLE_NAMES: &[&str] = &[
    "w", "r", "query", "params", "pathParts", "bodyBytes", "bodyObj", "err", "returnValue", "rv",
    "b", "k", "v",
];

/// The request map's Go name when the handler parameter collides with a
/// preamble name.
const REQUEST_FALLBACK: &str = "request";

const RESULT_SLOT: &str = "returnValue";

fn render_handler_body<'a>(
    g: &GoGenerator<'a>,
    handler: &'a FunctionLiteral,
    pattern: &RoutePattern,
) -> Result<(String, Capabilities), CodegenError> {
    if let Some(span) = binds_result_slot(g, handler) {
        return Err(malformed(
            "route",
            format!("handler body may not bind `{}`", RESULT_SLOT),
            span,
        ));
    }

    let mut h = g.child(g.indent + 1, ReturnMode::Handler);
    h.require(Capability::Http);
    h.require(Capability::Fmt);
    h.require(Capability::Log);
    h.require(Capability::Json);

    let request = handler.params.first().map(|param| {
        let name = g.resolve(param.name.symbol);
        let clashes = PREAMBLE_NAMES.contains(&name);
        let go_name = if clashes { REQUEST_FALLBACK } else { name };
        emit_request_map(&mut h, go_name, pattern);
        (param, name, clashes)
    });

    h.write_line("log.Printf(\"%s %s\", r.Method, r.URL.Path)");
    h.write_line(&format!("var {} interface{{}}", RESULT_SLOT));

    // User statements get their own block so their names never meet the
    // preamble's.
    h.write_line("{");
    h.indent += 1;
    h.push_scope();
    if let Some((param, name, clashes)) = request {
        if clashes {
            h.write_line(&format!("{} := {}", name, REQUEST_FALLBACK));
            h.write_line(&format!("_ = {}", name));
        }
        h.define(param.name.symbol, Shape::Map);
    }
    emit_statements(&mut h, &handler.body.statements)?;
    h.pop_scope();
    h.indent -= 1;
    h.write_line("}");

    emit_result_switch(&mut h);
    Ok(h.finish())
}

/// The span of a binding in the handler body that would hide the result
/// slot from the `return` lowering.
fn binds_result_slot(g: &GoGenerator, handler: &FunctionLiteral) -> Option<Span> {
    struct SlotFinder {
        slot: Spur,
        found: Option<Span>,
    }

    impl<'ast> Visitor<'ast> for SlotFinder {
        fn visit_stmt(&mut self, stmt: &'ast Statement) {
            if let Some(binding) = stmt.as_binding() {
                if binding.name.symbol == self.slot && self.found.is_none() {
                    self.found = Some(binding.name.span);
                }
            }
            walk_stmt(self, stmt);
        }

        // Nested function literals return through Go's own `return`.
        fn visit_function(&mut self, _func: &'ast FunctionLiteral) {}
    }

    let mut finder = SlotFinder {
        slot: g.interner.get(RESULT_SLOT)?,
        found: None,
    };
    for stmt in &handler.body.statements {
        finder.visit_stmt(stmt);
    }
    finder.found
}

fn emit_request_map(h: &mut GoGenerator, req: &str, pattern: &RoutePattern) {
    h.write_line("query := make(map[string]interface{})");
    h.write_line("for k, v := range r.URL.Query() {");
    h.indent += 1;
    h.write_line("if len(v) > 0 {");
    h.indent += 1;
    h.write_line("query[k] = v[0]");
    h.indent -= 1;
    h.write_line("}");
    h.indent -= 1;
    h.write_line("}");
    h.write_line(&format!("{} := make(map[string]interface{{}})", req));
    h.write_line(&format!("{}[\"query\"] = query", req));

    if !pattern.params.is_empty() {
        h.require(Capability::Strings);
        h.write_line("pathParts := strings.Split(strings.Trim(r.URL.Path, \"/\"), \"/\")");
        h.write_line("params := make(map[string]interface{})");
        for (name, index) in &pattern.params {
            h.write_line(&format!("if len(pathParts) > {} {{", index));
            h.indent += 1;
            h.write_line(&format!("params[{}] = pathParts[{}]", go_quote(name), index));
            h.indent -= 1;
            h.write_line("}");
        }
        h.write_line(&format!("{}[\"params\"] = params", req));
    }

    h.require(Capability::Io);
    h.write_line("if r.Method == \"POST\" || r.Method == \"PUT\" {");
    h.indent += 1;
    h.write_line(&format!("r.Body = http.MaxBytesReader(w, r.Body, {})", MAX_BODY_BYTES));
    h.write_line("defer r.Body.Close()");
    h.write_line("bodyBytes, err := io.ReadAll(r.Body)");
    h.write_line("if err != nil {");
    h.indent += 1;
    h.write_line("http.Error(w, \"failed to read body\", http.StatusBadRequest)");
    h.write_line("return");
    h.indent -= 1;
    h.write_line("}");
    h.write_line("if len(bodyBytes) > 0 {");
    h.indent += 1;
    h.write_line("var bodyObj interface{}");
    h.write_line("if err := json.Unmarshal(bodyBytes, &bodyObj); err != nil {");
    h.indent += 1;
    h.write_line("http.Error(w, \"invalid JSON\", http.StatusBadRequest)");
    h.write_line("return");
    h.indent -= 1;
    h.write_line("}");
    h.write_line(&format!("{}[\"body\"] = bodyObj", req));
    h.indent -= 1;
    h.write_line("}");
    h.indent -= 1;
    h.write_line("}");
}

fn emit_result_switch(h: &mut GoGenerator) {
    h.write_line("switch rv := returnValue.(type) {");
    h.write_line("case string:");
    h.indent += 1;
    h.write_line("fmt.Fprint(w, rv)");
    h.indent -= 1;
    h.write_line("default:");
    h.indent += 1;
    h.write_line("b, _ := json.Marshal(rv)");
    h.write_line("w.Header().Set(\"Content-Type\", \"application/json\")");
    h.write_line("w.Write(b)");
    h.indent -= 1;
    h.write_line("}");
}

#[cfg(test)]
mod tests {
    use super::super::{generate, generate_program, Capabilities, Capability};
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn go(source: &str) -> Result<String, CodegenError> {
        let (tokens, interner) = tokenize(source);
        let result = parse(&tokens, source);
        assert!(result.errors.is_empty(), "Parse errors: {:?}", result.errors);
        generate(&result.ast, &interner)
    }

    #[test]
    fn test_route_pattern() {
        let pattern = RoutePattern::parse("/users/:id");
        assert_eq!(pattern.params, vec![("id".to_string(), 1)]);
        assert_eq!(pattern.registration(), "/users/");

        assert_eq!(RoutePattern::parse("/health").registration(), "/health");
        assert_eq!(RoutePattern::parse("/:slug").registration(), "/");
        assert_eq!(RoutePattern::parse("/a/b/:x/c/:y").registration(), "/a/b/");
        assert_eq!(RoutePattern::parse("/a/b/:x/c/:y").params[1], ("y".to_string(), 4));
    }

    #[test]
    fn test_dynamic_route() {
        let src = go("server.route(\"/users/:id\", fn(req) { return req })").unwrap();
        assert!(src.contains("http.HandleFunc(\"/users/\", func(w http.ResponseWriter, r *http.Request) {\n"));
        assert!(src.contains("\t\tif len(pathParts) > 1 {\n\t\t\tparams[\"id\"] = pathParts[1]\n\t\t}\n"));
        assert!(src.contains("\t\treq[\"params\"] = params\n"));
        assert!(src.contains("\t\tvar returnValue interface{}\n\t\t{\n\t\t\treturnValue = req\n\t\t}\n"));
        assert!(src.contains("\t\tbodyBytes, err := io.ReadAll(r.Body)\n"));
        assert!(src.contains("\t})\n}\n"));
        assert!(src.contains("\t\"strings\"\n"));
    }

    #[test]
    fn test_request_map_members_use_map_indexing() {
        let src = go("server.route(\"/hello\", fn(req) { return \"Hello \" + req.query.name })").unwrap();
        assert!(src.contains("returnValue = (\"Hello \" + req[\"query\"].(map[string]interface{})[\"name\"].(string))"));
        assert!(!src.contains("pathParts"));
    }

    #[test]
    fn test_handler_locals_live_in_their_own_block() {
        let src = go(
            "server.route(\"/users/:id\", fn(req) {\n  let params = req.params\n  let query = 1\n  return params\n})",
        )
        .unwrap();
        assert!(src.contains("\t\tparams := make(map[string]interface{})\n"));
        assert!(src.contains(
            "\t\t{\n\t\t\tvar params = req[\"params\"]\n\t\t\t_ = params\n\t\t\tvar query = 1\n\t\t\t_ = query\n\t\t\treturnValue = params\n\t\t}\n"
        ));
    }

    #[test]
    fn test_handler_param_named_like_preamble() {
        let src = go("server.route(\"/:id\", fn(r) { return r.params.id })").unwrap();
        assert!(src.contains("\t\trequest := make(map[string]interface{})\n"));
        assert!(src.contains("\t\trequest[\"params\"] = params\n"));
        assert!(src.contains("\t\t\tr := request\n\t\t\t_ = r\n"));
        assert!(src.contains("\t\t\treturnValue = r[\"params\"].(map[string]interface{})[\"id\"]\n"));
        assert!(!src.contains("\tr := make("));
    }

    #[test]
    fn test_handler_may_not_bind_result_slot() {
        let err = go("server.route(\"/\", fn() { let returnValue = 1\n return returnValue })").unwrap_err();
        assert!(matches!(
            err,
            CodegenError::MalformedBuiltin { ref reason, .. }
                if reason == "handler body may not bind `returnValue`"
        ));

        let nested = go("server.route(\"/\", fn() { let f = fn() { let returnValue = 1\n return returnValue }\n return f() })");
        assert!(nested.is_ok());
    }

    #[test]
    fn test_serve_alone() {
        let (tokens, interner) = tokenize("server.serve(8080)");
        let program = parse(&tokens, "server.serve(8080)").ast;
        let out = generate_program(&program, &interner).unwrap();
        assert!(out.source.contains("\tlog.Fatal(http.ListenAndServe(\":8080\", nil))\n"));
        assert!(!out.source.contains("HandleFunc"));
        assert_eq!(out.capabilities, Capabilities::of(&[Capability::Log, Capability::Http]));
    }

    #[test]
    fn test_serve_port_forms() {
        assert!(go("server.serve(\"9000\")").unwrap().contains("http.ListenAndServe(\":9000\", nil)"));
        assert!(go("server.serve(\":9000\")").unwrap().contains("http.ListenAndServe(\":9000\", nil)"));
        let src = go("let port = 80\nserver.serve(port)").unwrap();
        assert!(src.contains("http.ListenAndServe(fmt.Sprintf(\":%v\", port), nil)"));
        assert!(src.contains("\t\"fmt\"\n"));
    }

    #[test]
    fn test_static() {
        let src = go("server.static(\"./public\")").unwrap();
        assert!(src.contains("http.Handle(\"/\", http.FileServer(http.Dir(\"./public\")))"));
    }

    #[test]
    fn test_zero_param_handler() {
        let src = go("server.route(\"/\", fn() { return \"ok\" })").unwrap();
        assert!(!src.contains("query :="));
        assert!(!src.contains("\t\"io\"\n"));
        assert!(src.contains("\t\tlog.Printf(\"%s %s\", r.Method, r.URL.Path)\n"));
        assert!(src.contains("\t\t{\n\t\t\treturnValue = \"ok\"\n\t\t}\n"));
        assert!(src.contains("switch rv := returnValue.(type) {"));
    }

    #[test]
    fn test_bound_server_is_not_builtin() {
        let src = go("let server = { serve: fn(p) { return p } }\nserver.serve(1)").unwrap();
        assert!(!src.contains("ListenAndServe"));
    }

    #[test]
    fn test_malformed_builtins() {
        let err = go("server.route(path, fn(req) { return req })").unwrap_err();
        assert!(matches!(
            err,
            CodegenError::MalformedBuiltin { ref method, ref reason, .. }
                if method == "server.route" && reason == "path must be a string literal"
        ));

        let err = go("server.route(\"/\", 5)").unwrap_err();
        assert!(matches!(
            err,
            CodegenError::MalformedBuiltin { ref reason, .. } if reason == "handler must be a function literal"
        ));

        let err = go("server.serve()").unwrap_err();
        assert!(matches!(
            err,
            CodegenError::MalformedBuiltin { ref reason, .. } if reason == "expects 1 argument, got 0"
        ));
    }
}
