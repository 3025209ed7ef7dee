//!
//! Diagnostic Module - Rich Error Reporting
//!
//! This module provides error reporting with source context using miette.
//! Errors display the file, line and column, and the offending snippet.
//! A program may span several files; the span's file id selects the one
//! to show.
//!
//! Usage:
//!   let reporter = DiagnosticReporter::new(&sources);
//!   reporter.report_parse_errors(&errors);
//!   reporter.report_type_errors(&errors);
//!

use miette::{Diagnostic, LabeledSpan, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::codegen::CodegenError;
use crate::parser::ParseError;
use crate::source::{SourceFile, SourceMap, Span};
use crate::typechecker::TypeError;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct PisukeDiagnostic {
    message: String,
    src: NamedSource<String>,
    span: SourceSpan,
    label: String,
    help_text: Option<String>,
}

impl Diagnostic for PisukeDiagnostic {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some(self.label.clone()),
            self.span,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.help_text
            .as_ref()
            .map(|h| Box::new(h.clone()) as Box<dyn std::fmt::Display>)
    }
}

impl PisukeDiagnostic {
    fn new(
        headline: &str,
        span: Span,
        source: &SourceFile,
        label: String,
        help_text: Option<String>,
    ) -> Self {
        let (line, col) = source.line_col(span.start);
        Self {
            message: format!("{} at {}:{}:{}", headline, source.name, line, col),
            src: NamedSource::new(&source.name, source.source.clone()),
            span: source_span(span, source),
            label,
            help_text,
        }
    }

    pub fn from_parse_error(err: &ParseError, source: &SourceFile) -> Self {
        Self::new("parse error", err.span, source, err.message.clone(), None)
    }

    pub fn from_type_error(err: &TypeError, source: &SourceFile) -> Self {
        let (label, help) = type_error_details(err);
        Self::new(&err.to_string(), err.span(), source, label, help)
    }

    pub fn from_codegen_error(err: &CodegenError, span: Span, source: &SourceFile) -> Self {
        Self::new(
            &err.to_string(),
            span,
            source,
            "in this call".to_string(),
            Some("the server builtins take literal paths and function handlers".to_string()),
        )
    }
}

fn source_span(span: Span, source: &SourceFile) -> SourceSpan {
    let len = source.source.len();
    let start = (span.start as usize).min(len);
    let end = (span.end as usize).clamp(start, len);
    (start, end - start).into()
}

fn type_error_details(err: &TypeError) -> (String, Option<String>) {
    match err {
        TypeError::UnknownType { name, .. } => (
            "unknown type".to_string(),
            Some(format!("declare it with `type {} = {{ ... }}` or use int or string", name)),
        ),
        TypeError::MissingField { field, .. } => (
            format!("missing '{}'", field),
            Some(format!("add a '{}' entry to the literal", field)),
        ),
        TypeError::ExpectedNestedObject { .. } => (
            "expected a map literal".to_string(),
            None,
        ),
        TypeError::TypeMismatch { expected, .. } => (
            format!("expected {}", expected),
            None,
        ),
        TypeError::UnknownField { field, ty, .. } => (
            format!("no field '{}' on {}", field, ty),
            None,
        ),
        TypeError::WrongArgCount { expected, .. } => (
            format!("expected {} args", expected),
            None,
        ),
        TypeError::ArgTypeMismatch { expected, .. } => (
            format!("expected {}", expected),
            None,
        ),
    }
}

pub struct DiagnosticReporter<'a> {
    sources: &'a SourceMap,
}

impl<'a> DiagnosticReporter<'a> {
    pub fn new(sources: &'a SourceMap) -> Self {
        Self { sources }
    }

    fn file(&self, span: Span) -> Option<&'a SourceFile> {
        self.sources.get(span.file_id)
    }

    pub fn report_parse_error(&self, err: &ParseError) {
        match self.file(err.span) {
            Some(file) => emit(PisukeDiagnostic::from_parse_error(err, file)),
            None => eprintln!("parse error: {}", err),
        }
    }

    pub fn report_type_error(&self, err: &TypeError) {
        match self.file(err.span()) {
            Some(file) => emit(PisukeDiagnostic::from_type_error(err, file)),
            None => eprintln!("type error: {}", err),
        }
    }

    pub fn report_codegen_error(&self, err: &CodegenError) {
        match err.span().and_then(|span| Some((span, self.file(span)?))) {
            Some((span, file)) => emit(PisukeDiagnostic::from_codegen_error(err, span, file)),
            None => eprintln!("error: {}", err),
        }
    }

    pub fn report_parse_errors(&self, errors: &[ParseError]) {
        for err in errors {
            self.report_parse_error(err);
        }
    }

    pub fn report_type_errors(&self, errors: &[TypeError]) {
        for err in errors {
            self.report_type_error(err);
        }
    }
}

fn emit(diag: PisukeDiagnostic) {
    eprintln!("{:?}", Report::new(diag));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_from_parse_error() {
        let source = SourceFile::new("test.psk", "let x = 1\nlet = 2");
        let err = ParseError::new("expected identifier, found '='", Span::new(14, 15, 0));

        let diag = PisukeDiagnostic::from_parse_error(&err, &source);
        assert_eq!(diag.message, "parse error at test.psk:2:5");
        assert_eq!(diag.label, "expected identifier, found '='");
    }

    #[test]
    fn test_diagnostic_from_type_error() {
        let source = SourceFile::new("test.psk", "let u: User = {}");
        let err = TypeError::MissingField {
            path: "u".to_string(),
            field: "name".to_string(),
            span: Span::new(14, 16, 0),
        };

        let diag = PisukeDiagnostic::from_type_error(&err, &source);
        assert!(diag.message.starts_with("u: missing field 'name' at test.psk:1:15"));
        assert!(diag.help_text.is_some());
    }

    #[test]
    fn test_span_clamped_to_source() {
        let source = SourceFile::new("short.psk", "x");
        let err = ParseError::new("unexpected end of input", Span::new(5, 9, 0));
        let diag = PisukeDiagnostic::from_parse_error(&err, &source);
        assert_eq!(diag.span, SourceSpan::from((1, 0)));
    }
}
