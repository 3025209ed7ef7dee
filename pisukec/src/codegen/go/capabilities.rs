//!
//! Import Capabilities
//!
//! Every Go package the generated program uses is recorded as a Capability
//! by the code that emits the call needing it. Rendering an expression
//! returns its text together with the capabilities it requires; callers
//! merge them upward, so the import block is built from exactly what the
//! body uses. Go rejects unused imports, so the set must be exact.
//!
//! Variants are declared in import-path order, which makes the derived
//! `Ord` (and thus the `BTreeSet` iteration) produce a sorted import block.
//!

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Json,
    Fmt,
    Io,
    Log,
    Http,
    Strings,
}

impl Capability {
    pub fn import_path(self) -> &'static str {
        match self {
            Capability::Json => "encoding/json",
            Capability::Fmt => "fmt",
            Capability::Io => "io",
            Capability::Log => "log",
            Capability::Http => "net/http",
            Capability::Strings => "strings",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(BTreeSet<Capability>);

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(caps: &[Capability]) -> Self {
        Self(caps.iter().copied().collect())
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0.insert(cap);
    }

    pub fn merge(&mut self, other: Capabilities) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, cap: Capability) -> bool {
        self.0.contains(&cap)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn import_paths(&self) -> Vec<&'static str> {
        self.iter().map(Capability::import_path).collect()
    }
}

/// Go text for one expression plus the packages it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub code: String,
    pub caps: Capabilities,
}

impl Rendered {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            caps: Capabilities::new(),
        }
    }

    pub fn with_caps(code: impl Into<String>, caps: Capabilities) -> Self {
        Self {
            code: code.into(),
            caps,
        }
    }

    pub fn require(mut self, cap: Capability) -> Self {
        self.caps.insert(cap);
        self
    }

    /// Render several parts and join their text, merging capabilities.
    pub fn join(parts: Vec<Rendered>, sep: &str) -> Rendered {
        let mut caps = Capabilities::new();
        let mut code = Vec::with_capacity(parts.len());
        for part in parts {
            caps.merge(part.caps);
            code.push(part.code);
        }
        Rendered::with_caps(code.join(sep), caps)
    }

    /// Rewrite the text, keeping the capabilities.
    pub fn map(self, f: impl FnOnce(String) -> String) -> Rendered {
        Rendered {
            code: f(self.code),
            caps: self.caps,
        }
    }
}
