///
/// Import Integration Tests
///
/// Builds small multi-file projects in temp directories and runs them
/// through both import paths: the textual inliner and the module loader.
/// Both must bring each file in exactly once and agree on statement order.
///

use std::fs;
use std::path::Path;

use pisukec::ast::render_program;
use pisukec::modules::{inline_imports, ImportError, ModuleLoader, Resolver};
use pisukec::{check, generate, parse, tokenize, Config};

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn diamond(dir: &Path) {
    write(dir, "models.psk", "type User = { id: int, name: string }");
    write(dir, "users.psk", "import { User } from \"models\"\nlet admin: User = { id: 1, name: \"root\" }");
    write(dir, "greet.psk", "import { User } from \"models\"\nfn hello(u: User): string { return \"hi \" + u.name }");
    write(
        dir,
        "main.psk",
        "import { admin } from \"users\"\nimport { hello } from \"greet\"\nprint(hello(admin))",
    );
}

#[test]
fn inliner_and_loader_agree_on_diamond() {
    let dir = tempfile::tempdir().unwrap();
    diamond(dir.path());
    let entry = dir.path().join("main.psk");

    let text = inline_imports(&entry, Resolver::new(dir.path())).unwrap();
    assert_eq!(text.matches("type User").count(), 1);
    assert_eq!(text.matches("// begin inlined module: models").count(), 1);
    let (tokens, inline_interner) = tokenize(&text);
    let inlined = parse(&tokens, &text);
    assert!(inlined.errors.is_empty(), "{:?}", inlined.errors);

    let loaded = ModuleLoader::new(Resolver::new(dir.path())).load(&entry).unwrap();
    assert!(loaded.errors.is_empty(), "{:?}", loaded.errors);
    assert_eq!(loaded.program.type_definitions().count(), 1);

    assert_eq!(
        render_program(&inlined.ast, &inline_interner),
        render_program(&loaded.program, &loaded.interner)
    );
}

#[test]
fn loaded_program_checks_and_generates() {
    let dir = tempfile::tempdir().unwrap();
    diamond(dir.path());
    let loaded = ModuleLoader::new(Resolver::new(dir.path()))
        .load(&dir.path().join("main.psk"))
        .unwrap();

    assert!(check(&loaded.program, &loaded.interner).is_empty());
    let src = generate(&loaded.program, &loaded.interner).unwrap();
    assert_eq!(src.matches("type User struct").count(), 1);
    assert!(src.contains("func hello(u User) string {"));
    assert!(src.contains("var admin User = User{Id: 1, Name: \"root\"}"));
    assert!(src.contains("fmt.Println(hello(admin))"));
}

#[test]
fn type_errors_point_into_imported_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "models.psk", "type User = { id: int, name: string }\nlet bad: User = { id: 1 }");
    write(dir.path(), "main.psk", "import { User } from \"models\"\nlet ok = 1");

    let loaded = ModuleLoader::new(Resolver::new(dir.path()))
        .load(&dir.path().join("main.psk"))
        .unwrap();
    let errors = check(&loaded.program, &loaded.interner);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "bad: missing field 'name'");

    let span = errors[0].span();
    let file = loaded.sources.get(span.file_id).unwrap();
    assert!(file.name.ends_with("models.psk"));
    assert_eq!(file.line_col(span.start), (2, 17));
}

#[test]
fn workspace_root_fallback_from_config() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pisuke.toml", "[modules]\nroot = \"lib\"\n");
    write(dir.path(), "lib/std/web.psk", "let port = 8080");
    write(dir.path(), "app/main.psk", "import { port } from \"std/web\"\nserver.serve(port)");

    let entry = dir.path().join("app").join("main.psk");
    let config = Config::discover(&entry).unwrap();
    let loaded = ModuleLoader::new(config.resolver()).load(&entry).unwrap();
    let src = generate(&loaded.program, &loaded.interner).unwrap();
    assert!(src.contains("var port = 8080"));
    assert!(src.contains("http.ListenAndServe(fmt.Sprintf(\":%v\", port), nil)"));
}

#[test]
fn missing_module_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.psk", "import { x } from \"nowhere\"");
    let err = ModuleLoader::new(Resolver::new(dir.path()))
        .load(&dir.path().join("main.psk"))
        .unwrap_err();
    assert!(matches!(err, ImportError::ModuleNotFound { ref path, .. } if path == "nowhere"));
    assert!(err.to_string().starts_with("module 'nowhere' not found"));
}

#[test]
fn import_cycle_terminates() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.psk", "import { b } from \"b\"\nlet a = 1");
    write(dir.path(), "b.psk", "import { a } from \"a\"\nlet b = 2");
    write(dir.path(), "main.psk", "import { a } from \"a\"\nprint(a, b)");

    let text = inline_imports(&dir.path().join("main.psk"), Resolver::new(dir.path())).unwrap();
    assert_eq!(text.matches("let a = 1").count(), 1);
    assert_eq!(text.matches("let b = 2").count(), 1);

    let loaded = ModuleLoader::new(Resolver::new(dir.path()))
        .load(&dir.path().join("main.psk"))
        .unwrap();
    assert_eq!(
        render_program(&loaded.program, &loaded.interner),
        "let b = 2\nlet a = 1\nprint(a, b)\n"
    );
}
