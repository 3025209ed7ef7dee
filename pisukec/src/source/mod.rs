///
/// Source Location and Span Module
///
/// Every token and AST node carries a Span pointing back into the text it
/// came from. Spans are byte offsets tagged with a file id so that programs
/// assembled from several modules still report errors in the right file.
///
/// Key types:
/// - Span: A range in source code (start offset, end offset, file id)
/// - Spanned: Trait for types that have an associated span
/// - SourceFile: A named source text with line/column lookup
/// - SourceMap: All files of one compilation, indexed by file id
///

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub file_id: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32, file_id: u32) -> Self {
        Self { start, end, file_id }
    }

    pub const fn dummy() -> Self {
        Self { start: 0, end: 0, file_id: 0 }
    }

    pub fn merge(self, other: Span) -> Span {
        debug_assert_eq!(self.file_id, other.file_id, "Cannot merge spans from different files");
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            file_id: self.file_id,
        }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}@{}", self.start, self.end, self.file_id)
    }
}

pub trait Spanned {
    fn span(&self) -> Span;
}

impl Spanned for Span {
    fn span(&self) -> Span {
        *self
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            memchr::memchr_iter(b'\n', source.as_bytes()).map(|pos| pos as u32 + 1),
        );
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: u32) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let col = offset - self.line_starts[line];
        (line + 1, col as usize + 1)
    }

    pub fn text(&self, span: Span) -> &str {
        let end = (span.end as usize).min(self.source.len());
        let start = (span.start as usize).min(end);
        &self.source[start..end]
    }
}

/// Files participating in one compilation. The index of a file is its id.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: SourceFile) -> u32 {
        self.files.push(file);
        (self.files.len() - 1) as u32
    }

    pub fn get(&self, file_id: u32) -> Option<&SourceFile> {
        self.files.get(file_id as usize)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(10, 20, 0);
        let b = Span::new(15, 30, 0);
        let merged = a.merge(b);
        assert_eq!(merged.start, 10);
        assert_eq!(merged.end, 30);
    }

    #[test]
    fn test_line_col() {
        let file = SourceFile::new("main.psk", "let x = 5\nlet y = x\n");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(4), (1, 5));
        assert_eq!(file.line_col(10), (2, 1));
        assert_eq!(file.line_col(14), (2, 5));
    }

    #[test]
    fn test_source_map_ids() {
        let mut map = SourceMap::new();
        let a = map.add(SourceFile::new("a.psk", "let a = 1"));
        let b = map.add(SourceFile::new("b.psk", "let b = 2"));
        assert_eq!((a, b), (0, 1));
        assert_eq!(map.get(b).map(|f| f.name.as_str()), Some("b.psk"));
        assert_eq!(map.get(1).unwrap().text(Span::new(4, 5, 1)), "b");
    }
}
