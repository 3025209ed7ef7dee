//!
//! Textual Import Inlining
//!
//! Replaces each import directive with the full text of the module it
//! names, recursively, bracketed by marker comments:
//!
//! ```text
//! // begin inlined module: <path>
//! ...module text...
//! // end inlined module: <path>
//! ```
//!
//! The result is a single source string; spans into it no longer map
//! back to the files it came from. `pisuke debug` uses this form.
//!

use std::path::Path;

use super::{read_module, scan_directives, ImportResult, Resolver};

pub struct Inliner {
    resolver: Resolver,
}

impl Inliner {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    /// Read `entry` and inline everything it imports.
    pub fn inline_file(&mut self, entry: &Path) -> ImportResult<String> {
        let text = read_module(entry)?;
        self.resolver.mark_visited(entry)?;
        self.inline_text(entry, &text)
    }

    /// Inline the imports of `text`, which was read from `importer`.
    pub fn inline_text(&mut self, importer: &Path, text: &str) -> ImportResult<String> {
        let directives = scan_directives(text);
        if directives.is_empty() {
            return Ok(text.to_string());
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for directive in directives {
            out.push_str(&text[cursor..directive.range.start]);
            cursor = directive.range.end;

            let file = self.resolver.resolve(importer, &directive.path)?;
            if !self.resolver.mark_visited(&file)? {
                tracing::debug!(module = %directive.path, "module already inlined");
                continue;
            }

            let module_text = read_module(&file)?;
            let inlined = self.inline_text(&file, &module_text)?;
            tracing::debug!(module = %directive.path, file = %file.display(), "inlining module");

            out.push_str("\n// begin inlined module: ");
            out.push_str(&directive.path);
            out.push('\n');
            out.push_str(&inlined);
            out.push_str("\n// end inlined module: ");
            out.push_str(&directive.path);
            out.push('\n');
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }
}

/// Inline all imports of the file at `entry`.
pub fn inline_imports(entry: &Path, resolver: Resolver) -> ImportResult<String> {
    Inliner::new(resolver).inline_file(entry)
}
