///
/// pisuke CLI - The pisuke compiler command-line interface
///
/// Provides commands for building, inspecting, and checking pisuke code:
/// - pisuke build <file>: Compile to a native binary through Go
/// - pisuke emit <file>: Write the generated Go source
/// - pisuke debug <file>: Dump tokens, AST, and generated Go
/// - pisuke check [path]: Check a file or every .psk file in a directory
///

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use pisukec::ast::render_program;
use pisukec::codegen::{build_binary, emit_source, BuildConfig};
use pisukec::modules::{inline_imports, LoadedProgram, SOURCE_EXTENSION};
use pisukec::source::{SourceFile, SourceMap};
use pisukec::{check, generate, parse, tokenize, Config, DiagnosticReporter, ModuleLoader};

#[derive(Parser)]
#[command(name = "pisuke")]
#[command(author, version, about = "The pisuke HTTP service language", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a pisuke file to a native binary
    Build {
        /// The entry file
        file: PathBuf,

        /// Output binary (defaults to the input path without extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep the generated .go file next to the binary
        #[arg(long)]
        keep_go: bool,
    },

    /// Print tokens, AST, and generated Go for a file
    Debug {
        /// The file to inspect
        file: PathBuf,
    },

    /// Write the generated Go source
    Emit {
        /// The entry file
        file: PathBuf,

        /// Output .go file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Type check without building
    Check {
        /// File or directory to check
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    init_reporting();

    match cli.command {
        Commands::Build {
            file,
            output,
            keep_go,
        } => build_file(&file, output, keep_go),
        Commands::Debug { file } => debug_file(&file),
        Commands::Emit { file, output } => emit_file(&file, output.as_deref()),
        Commands::Check { path } => check_code(path.as_deref()),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn init_reporting() {
    let installed = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .unicode(true)
                .width(120)
                .context_lines(1)
                .build(),
        )
    }));
    if let Err(e) = installed {
        tracing::warn!("diagnostic handler not installed: {}", e);
    }
}

fn load_config(file: &Path) -> Config {
    match Config::discover(file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load, parse, and check `file` with everything it imports. Errors are
/// reported; `None` means the file did not get through.
fn front_end(file: &Path, config: &Config) -> Option<LoadedProgram> {
    let loaded = match ModuleLoader::new(config.resolver()).load(file) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return None;
        }
    };

    let reporter = DiagnosticReporter::new(&loaded.sources);
    if !loaded.errors.is_empty() {
        reporter.report_parse_errors(&loaded.errors);
        return None;
    }

    let type_errors = check(&loaded.program, &loaded.interner);
    if !type_errors.is_empty() {
        reporter.report_type_errors(&type_errors);
        return None;
    }

    Some(loaded)
}

fn build_file(file: &Path, output: Option<PathBuf>, keep_go: bool) {
    let config = load_config(file);
    let Some(loaded) = front_end(file, &config) else {
        std::process::exit(1);
    };

    let mut build = BuildConfig::new(output.unwrap_or_else(|| file.with_extension("")));
    build.go_binary = config.build.go.clone();
    build.keep_source = keep_go || config.build.keep_source;

    match build_binary(&loaded.program, &loaded.interner, &build) {
        Ok(binary) => println!("Built {}", binary.display()),
        Err(e) => {
            DiagnosticReporter::new(&loaded.sources).report_codegen_error(&e);
            std::process::exit(1);
        }
    }
}

fn emit_file(file: &Path, output: Option<&Path>) {
    let config = load_config(file);
    let Some(loaded) = front_end(file, &config) else {
        std::process::exit(1);
    };

    let result = match output {
        Some(path) => emit_source(path, &loaded.program, &loaded.interner),
        None => generate(&loaded.program, &loaded.interner).map(|source| print!("{}", source)),
    };
    if let Err(e) = result {
        DiagnosticReporter::new(&loaded.sources).report_codegen_error(&e);
        std::process::exit(1);
    }
}

fn debug_file(file: &Path) {
    let config = load_config(file);
    let source_text = match inline_imports(file, config.resolver()) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut sources = SourceMap::new();
    sources.add(SourceFile::new(file.display().to_string(), source_text.clone()));
    let Some(source_file) = sources.get(0) else {
        std::process::exit(1);
    };

    let (tokens, interner) = tokenize(&source_text);
    println!("Tokens:");
    for token in &tokens {
        let (line, col) = source_file.line_col(token.span.start);
        println!("{} '{}' @{}:{}", token.kind.name(), token.text(&source_text), line, col);
    }

    let parse_result = parse(&tokens, &source_text);
    println!("\nAST:");
    print!("{}", render_program(&parse_result.ast, &interner));

    let reporter = DiagnosticReporter::new(&sources);
    if !parse_result.errors.is_empty() {
        reporter.report_parse_errors(&parse_result.errors);
        std::process::exit(1);
    }

    println!("\nGenerated Go:");
    match generate(&parse_result.ast, &interner) {
        Ok(go) => print!("{}", go),
        Err(e) => {
            reporter.report_codegen_error(&e);
            std::process::exit(1);
        }
    }
}

fn check_code(path: Option<&Path>) {
    let path = path.unwrap_or(Path::new("."));

    if path.is_file() {
        check_file(path);
    } else if path.is_dir() {
        check_directory(path);
    } else {
        eprintln!("Error: {} does not exist", path.display());
        std::process::exit(1);
    }
}

fn check_file(path: &Path) {
    let config = load_config(path);
    if front_end(path, &config).is_none() {
        std::process::exit(1);
    }
    println!("No errors in {}", path.display());
}

fn check_directory(path: &Path) {
    let mut checked = 0;
    let mut errors = 0;

    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let file_path = entry.path();
        let is_source = entry.file_type().is_file()
            && file_path.extension().map(|e| e == SOURCE_EXTENSION).unwrap_or(false);
        if !is_source {
            continue;
        }

        let config = match Config::discover(file_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                errors += 1;
                checked += 1;
                continue;
            }
        };
        if front_end(file_path, &config).is_none() {
            errors += 1;
        }
        checked += 1;
    }

    println!("Checked {} files, {} with errors", checked, errors);

    if errors > 0 {
        std::process::exit(1);
    }
}
