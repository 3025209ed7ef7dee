///
/// Go Type Generation
///
/// Maps pisuke type names to Go types:
/// - int -> int
/// - string -> string
/// - declared record -> its struct type name
/// - anything else (or no annotation) -> interface{}
///
/// Record definitions become `type X struct { ... }` declarations with
/// capitalized field names so the fields are exported and visible to
/// encoding/json. Nested record bodies become anonymous struct types.
///

use crate::ast::{Field, FieldType, Ident, TypeDefinition};

use super::GoGenerator;

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// A Go interpreted string literal holding `value`.
pub fn go_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\x00"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn go_type(g: &GoGenerator, ty: Option<Ident>) -> String {
    let Some(ty) = ty else {
        return "interface{}".to_string();
    };
    let name = g.resolve(ty.symbol);
    match name {
        "int" | "string" => name.to_string(),
        _ if g.symbols().get_type(ty.symbol).is_some() => name.to_string(),
        _ => "interface{}".to_string(),
    }
}

pub fn field_go_type(g: &GoGenerator, field: &Field) -> String {
    match &field.ty {
        FieldType::Named(ty) => go_type(g, Some(*ty)),
        FieldType::Nested(def) => inline_struct(g, def),
    }
}

/// `struct{A int; B string}`, for use inside composite literals.
pub fn inline_struct(g: &GoGenerator, def: &TypeDefinition) -> String {
    let fields: Vec<String> = def
        .fields
        .iter()
        .map(|f| format!("{} {}", capitalize(g.resolve(f.name.symbol)), field_go_type(g, f)))
        .collect();
    format!("struct{{{}}}", fields.join("; "))
}

pub fn zero_value(g: &GoGenerator, ty: Option<Ident>) -> String {
    let Some(ty) = ty else {
        return "nil".to_string();
    };
    let name = g.resolve(ty.symbol);
    match name {
        "int" => "0".to_string(),
        "string" => "\"\"".to_string(),
        _ if g.symbols().get_type(ty.symbol).is_some() => format!("{}{{}}", name),
        _ => "nil".to_string(),
    }
}

pub fn field_zero_value(g: &GoGenerator, field: &Field) -> String {
    match &field.ty {
        FieldType::Named(ty) => zero_value(g, Some(*ty)),
        FieldType::Nested(def) => format!("{}{{}}", inline_struct(g, def)),
    }
}

/// Emit `type Name struct { ... }` at the generator's current indentation.
pub fn emit_type_decl(g: &mut GoGenerator, def: &TypeDefinition) {
    let name = g.resolve(def.name.symbol);
    g.write_line(&format!("type {} struct {{", name));
    emit_struct_fields(g, def);
    g.write_line("}");
}

fn emit_struct_fields(g: &mut GoGenerator, def: &TypeDefinition) {
    g.indent += 1;
    for field in &def.fields {
        let name = capitalize(g.resolve(field.name.symbol));
        match &field.ty {
            FieldType::Named(ty) => {
                let ty = go_type(g, Some(*ty));
                g.write_line(&format!("{} {}", name, ty));
            }
            FieldType::Nested(nested) => {
                g.write_line(&format!("{} struct {{", name));
                emit_struct_fields(g, nested);
                g.write_line("}");
            }
        }
    }
    g.indent -= 1;
}
