//! Architecture tests for library output hygiene.
//!
//! Library crates report through `tracing` and return errors; only the CLI
//! binary writes to stdout or stderr directly. Record output on stdout must
//! stay machine-readable, so a stray `println!` in the pipeline would corrupt it.

use std::fs;
use std::path::Path;

const LIBRARY_SOURCE_DIRS: &[&str] = &["crates/client/src", "crates/config/src"];
const FORBIDDEN: &[&str] = &["println!(", "print!(", "eprintln!(", "eprint!(", "dbg!("];

/// Source text before the first `#[cfg(test)]` module.
fn non_test_source(content: &str) -> &str {
    content
        .find("#[cfg(test)]")
        .map_or(content, |index| &content[..index])
}

fn workspace_root() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("architecture-tests lives two levels below the workspace root")
        .to_path_buf()
}

#[test]
fn library_crates_do_not_print() {
    let root = workspace_root();
    let mut violations = Vec::new();

    for dir in LIBRARY_SOURCE_DIRS {
        for entry in walkdir::WalkDir::new(root.join(dir))
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        {
            let path = entry.path();
            // The testing module is test-only support code.
            if path.components().any(|c| c.as_os_str() == "testing") {
                continue;
            }
            let content = fs::read_to_string(path).unwrap_or_default();
            for (number, line) in non_test_source(&content).lines().enumerate() {
                let trimmed = line.trim_start();
                if trimmed.starts_with("//") {
                    continue;
                }
                if FORBIDDEN.iter().any(|pattern| trimmed.contains(pattern)) {
                    violations.push(format!("{}:{}: {}", path.display(), number + 1, trimmed));
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Library code must log through tracing instead of printing:\n{}",
        violations.join("\n")
    );
}

#[test]
fn test_non_test_source_stops_at_test_module() {
    let content = "fn a() {}\n#[cfg(test)]\nmod tests { fn b() { println!(\"x\"); } }\n";
    assert_eq!(non_test_source(content), "fn a() {}\n");
    assert_eq!(non_test_source("fn a() {}"), "fn a() {}");
}
