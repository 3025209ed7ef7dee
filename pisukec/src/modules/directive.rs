//!
//! Import Directive Scanning
//!
//! Finds `import { a, b } from "path"` directives in raw source text.
//! Scanning works on bytes, not tokens: a directive is recognized anywhere
//! in the text, with any amount of whitespace (including none) between its
//! parts. Candidate positions are located with memchr's substring finder.
//!

use std::ops::Range;

use memchr::memmem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    /// The names inside the braces. Recorded but not used for filtering:
    /// the whole module is always brought in.
    pub names: Vec<String>,
    pub path: String,
    /// Byte range of the full directive text.
    pub range: Range<usize>,
}

/// All directives in `text`, in order of appearance.
pub fn scan_directives(text: &str) -> Vec<ImportDirective> {
    let bytes = text.as_bytes();
    let mut directives = Vec::new();
    let mut resume = 0;

    for start in memmem::find_iter(bytes, b"import") {
        if start < resume {
            continue;
        }
        if let Some(directive) = parse_directive(text, start) {
            resume = directive.range.end;
            directives.push(directive);
        }
    }
    directives
}

fn parse_directive(text: &str, start: usize) -> Option<ImportDirective> {
    let bytes = text.as_bytes();
    let mut pos = skip_whitespace(bytes, start + "import".len());

    if bytes.get(pos) != Some(&b'{') {
        return None;
    }
    let close = pos + memchr::memchr(b'}', &bytes[pos..])?;
    let names = text[pos + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();

    pos = skip_whitespace(bytes, close + 1);
    if !bytes[pos..].starts_with(b"from") {
        return None;
    }
    pos = skip_whitespace(bytes, pos + "from".len());

    if bytes.get(pos) != Some(&b'"') {
        return None;
    }
    let quote = pos + 1 + memchr::memchr2(b'"', b'\n', &bytes[pos + 1..])?;
    if bytes[quote] != b'"' || quote == pos + 1 {
        return None;
    }

    Some(ImportDirective {
        names,
        path: text[pos + 1..quote].to_string(),
        range: start..quote + 1,
    })
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// `text` with every directive overwritten by spaces. Byte offsets and
/// line breaks are unchanged, so spans into the result still index the
/// original text.
pub fn blank_directives(text: &str, directives: &[ImportDirective]) -> String {
    let mut bytes = text.as_bytes().to_vec();
    for directive in directives {
        for b in &mut bytes[directive.range.clone()] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    }
    // Directive ranges begin and end on ASCII bytes.
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
