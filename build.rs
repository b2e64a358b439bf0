use std::path::{Path, PathBuf};
use std::process::Command;

/// Non-empty lines allowed in one source file.
const MAX_LINES: usize = 750;

/// Source roots the checks walk, relative to the manifest.
const CHECKED_ROOTS: &[&str] = &["src", "build.rs"];

/// One offending line in one file.
struct Violation {
    path: PathBuf,
    line: usize,
    detail: String,
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/main");
    println!("cargo:rustc-env=VISIONSAVE_GIT_SHA={}", git_sha());

    let root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
    let sources = rust_sources(&root);
    for (path, _) in &sources {
        println!("cargo:rerun-if-changed={}", root.join(path).display());
    }

    let crate_sources: Vec<_> = sources
        .iter()
        .filter(|(path, _)| path.as_path() != Path::new("build.rs"))
        .collect();

    report(
        "visionsave source files must stay under the line limit",
        &format!("Split the module; the limit is {} non-empty lines.", MAX_LINES),
        oversized_files(&sources),
    );
    report(
        "#[allow(dead_code)] is not accepted in visionsave",
        "Delete the unused item, or move it behind #[cfg(test)] if only tests use it.",
        crate_sources
            .iter()
            .flat_map(|(path, content)| dead_code_allows(path, content))
            .collect(),
    );
    report(
        "tests that touch environment variables must be #[serial]",
        "VISIONSAVE_HOME and friends are process-global; add serial_test's #[serial].",
        crate_sources
            .iter()
            .flat_map(|(path, content)| unserialized_env_tests(path, content))
            .collect(),
    );
}

fn git_sha() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|sha| sha.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reads every `.rs` file under the checked roots as (relative path, content).
fn rust_sources(root: &Path) -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    for entry in CHECKED_ROOTS {
        collect(&root.join(entry), &mut files);
    }
    files
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            Some((rel, content))
        })
        .collect()
}

fn collect(path: &Path, files: &mut Vec<PathBuf>) {
    if path.is_dir() {
        let Ok(entries) = std::fs::read_dir(path) else {
            return;
        };
        for entry in entries.flatten() {
            collect(&entry.path(), files);
        }
    } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
        files.push(path.to_path_buf());
    }
}

fn oversized_files(sources: &[(PathBuf, String)]) -> Vec<Violation> {
    sources
        .iter()
        .filter_map(|(path, content)| {
            let lines = content.lines().filter(|l| !l.trim().is_empty()).count();
            (lines > MAX_LINES).then(|| Violation {
                path: path.clone(),
                line: 1,
                detail: format!("{} non-empty lines", lines),
            })
        })
        .collect()
}

fn dead_code_allows(path: &Path, content: &str) -> Vec<Violation> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            (trimmed.starts_with("#[allow(") || trimmed.starts_with("#![allow("))
                && trimmed.contains("dead_code")
        })
        .map(|(index, line)| Violation {
            path: path.to_path_buf(),
            line: index + 1,
            detail: line.trim().to_string(),
        })
        .collect()
}

/// Finds test functions that call `set_var`/`remove_var` without `#[serial]`.
fn unserialized_env_tests(path: &Path, content: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut serial = false;
    let mut test_start: Option<usize> = None;
    let mut current: Option<(usize, String)> = None;
    let mut depth: i32 = 0;

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed == "#[serial]" || trimmed == "#[serial_test::serial]" {
            serial = true;
        }
        if trimmed == "#[test]" || trimmed.starts_with("#[tokio::test") {
            test_start = Some(index + 1);
        }

        if current.is_none() {
            if let (Some(start), Some(pos)) = (test_start, trimmed.find("fn ")) {
                let name: String = trimmed
                    .chars()
                    .skip(pos + 3)
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                current = Some((start, name));
                test_start = None;
                depth = 0;
            }
        }

        let Some((start, name)) = &current else {
            continue;
        };

        let mutates_env = !trimmed.starts_with("//")
            && (trimmed.contains("env::set_var") || trimmed.contains("env::remove_var"));
        if mutates_env && !serial {
            violations.push(Violation {
                path: path.to_path_buf(),
                line: *start,
                detail: format!("test `{}` changes the environment", name),
            });
            current = None;
            serial = false;
            continue;
        }

        depth += line.matches('{').count() as i32 - line.matches('}').count() as i32;
        if depth <= 0 && line.contains('}') {
            current = None;
            serial = false;
        }
    }
    violations
}

fn report(title: &str, hint: &str, violations: Vec<Violation>) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\nvisionsave build check failed: {}", title);
    for v in &violations {
        eprintln!("  {}:{}  {}", v.path.display(), v.line, v.detail);
    }
    eprintln!("{}\n", hint);
    panic!("{} ({} occurrence(s))", title, violations.len());
}
