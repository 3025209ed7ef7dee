///
/// Code Generation Module
///
/// This module handles transpilation of the pisuke AST to Go source code.
/// The generated Go is then compiled to a native binary with `go build`.
///
/// Pipeline:
/// 1. Generate Go source from the AST (see `go`)
/// 2. Write it to `<stem>.go` in a scratch directory, or next to the
///    output when the source is kept
/// 3. Run `go build -o <output> <stem>.go`
///

pub mod go;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use lasso::Rodeo;
use thiserror::Error;

use crate::ast::Program;
use crate::source::Span;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("go build failed: {0}")]
    GoBuild(String),

    #[error("malformed {method} call: {reason}")]
    MalformedBuiltin {
        method: String,
        reason: String,
        span: Span,
    },
}

impl CodegenError {
    pub fn span(&self) -> Option<Span> {
        match self {
            CodegenError::MalformedBuiltin { span, .. } => Some(*span),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub output: PathBuf,
    pub go_binary: String,
    pub keep_source: bool,
    pub work_dir: Option<PathBuf>,
}

impl BuildConfig {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            go_binary: "go".to_string(),
            keep_source: false,
            work_dir: None,
        }
    }
}

/// Generate Go for `program` and write it to `path`.
pub fn emit_source(path: &Path, program: &Program, interner: &Rodeo) -> Result<(), CodegenError> {
    let source = go::generate(program, interner)?;
    fs::write(path, source)?;
    tracing::info!(path = %path.display(), "wrote Go source");
    Ok(())
}

/// Generate Go for `program` and compile it into `config.output`.
/// Returns the path of the produced binary.
pub fn build_binary(
    program: &Program,
    interner: &Rodeo,
    config: &BuildConfig,
) -> Result<PathBuf, CodegenError> {
    let stem = config
        .output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("main");
    let file_name = format!("{}.go", stem);

    // Keeps the scratch directory alive until `go build` has run.
    let mut scratch = None;
    let source_dir = if config.keep_source {
        config
            .output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else if let Some(dir) = &config.work_dir {
        dir.clone()
    } else {
        let dir = tempfile::tempdir()?;
        let path = dir.path().to_path_buf();
        scratch = Some(dir);
        path
    };

    fs::create_dir_all(&source_dir)?;
    let source_path = source_dir.join(file_name);
    emit_source(&source_path, program, interner)?;
    run_go_build(config, &source_path)?;
    drop(scratch);

    Ok(config.output.clone())
}

fn run_go_build(config: &BuildConfig, source_path: &Path) -> Result<(), CodegenError> {
    let mut cmd = Command::new(&config.go_binary);
    cmd.arg("build").arg("-o").arg(&config.output).arg(source_path);

    tracing::debug!(
        go = %config.go_binary,
        output = %config.output.display(),
        source = %source_path.display(),
        "running go build"
    );
    let output = cmd.output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CodegenError::GoBuild(stderr.trim_end().to_string()));
    }

    Ok(())
}
