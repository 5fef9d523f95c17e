//! Runs the binary against the YAML cases in `tests/cases`.
//!
//! Each case holds the Go `input`, the `cmd` to run (the file name is
//! appended), the `expect`ed file afterwards and optionally the expected
//! `stdout`. Indentation in the cases is written as two spaces per level and
//! becomes tabs before the comparison.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde::Deserialize;
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_go-rename-imports");
const INPUT_FILE: &str = "input.go";

#[derive(Debug, Deserialize)]
struct Case {
    input: String,
    cmd: String,
    expect: String,
    #[serde(default)]
    stdout: Option<String>,
}

fn cases_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("cases")
}

/// Leading pairs of spaces become tabs, the way gofmt indents.
fn tabify(text: &str) -> String {
    text.lines()
        .map(|line| {
            let spaces = line.len() - line.trim_start_matches(' ').len();
            format!("{}{}", "\t".repeat(spaces / 2), &line[spaces / 2 * 2..])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run go-rename-imports")
}

fn run_case(path: &Path) {
    let text = fs::read_to_string(path).unwrap();
    let case: Case = serde_yaml::from_str(&text)
        .unwrap_or_else(|err| panic!("{}: {}", path.display(), err));

    let mut fields: Vec<&str> = case.cmd.split_whitespace().collect();
    assert_eq!(fields.first(), Some(&"go-rename-imports"), "{}", path.display());
    fields.remove(0);
    fields.push(INPUT_FILE);

    let dir = TempDir::new().unwrap();
    let input = tabify(&case.input) + "\n";
    fs::write(dir.path().join(INPUT_FILE), &input).unwrap();

    let output = run_in(dir.path(), &fields);
    assert!(
        output.status.success(),
        "{}: {}",
        path.display(),
        String::from_utf8_lossy(&output.stderr)
    );

    let actual = fs::read_to_string(dir.path().join(INPUT_FILE)).unwrap();
    assert_eq!(
        actual.trim(),
        tabify(&case.expect).trim(),
        "{}: file contents differ",
        path.display()
    );

    if let Some(stdout) = &case.stdout {
        assert_eq!(
            String::from_utf8_lossy(&output.stdout).trim(),
            stdout.trim(),
            "{}: stdout differs",
            path.display()
        );
    }
}

#[test]
fn test_golden_cases() {
    let mut paths: Vec<PathBuf> = fs::read_dir(cases_dir())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "yaml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty());

    for path in &paths {
        run_case(path);
    }
}

#[test]
fn test_tabify() {
    assert_eq!(tabify("import (\n  \"fmt\"\n    x\n)"), "import (\n\t\"fmt\"\n\t\tx\n)");
    assert_eq!(tabify("   odd"), "\t odd");
}

fn go_file(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join(INPUT_FILE);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_no_arguments_exits_one() {
    let dir = TempDir::new().unwrap();
    let output = run_in(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_exits_zero() {
    let dir = TempDir::new().unwrap();
    let output = run_in(dir.path(), &["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("rename"));
}

#[test]
fn test_unknown_command_exits_one() {
    let dir = TempDir::new().unwrap();
    go_file(&dir, "package main\n");
    let output = run_in(dir.path(), &["frobnicate-imports", INPUT_FILE]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_missing_pattern_exits_one() {
    let dir = TempDir::new().unwrap();
    go_file(&dir, "package main\n\nimport \"fmt\"\n");

    for command in ["rename", "add", "delete"] {
        let output = run_in(dir.path(), &[command, "-w", INPUT_FILE]);
        assert_eq!(output.status.code(), Some(1), "{}", command);
    }
}

#[test]
fn test_bad_pattern_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let original = "package main\n\nimport \"old/pkg\"\n";
    let path = go_file(&dir, original);

    let output = run_in(dir.path(), &["rename", "-w", "-e", "old/pkg|new/pkg", "-e", "\"quoted\"|x", INPUT_FILE]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_missing_file_exits_one() {
    let dir = TempDir::new().unwrap();
    let output = run_in(dir.path(), &["list-imports", "nope.go"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.go"));
}

#[test]
fn test_syntax_error_exits_one_without_writing() {
    let dir = TempDir::new().unwrap();
    let original = "package main\n\nimport \"fmt\"\n\nfunc main() {\n";
    let path = go_file(&dir, original);

    let output = run_in(dir.path(), &["add", "-w", "-e", "os", INPUT_FILE]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_diff_preview_without_write() {
    let dir = TempDir::new().unwrap();
    let original = "package main\n\nimport \"old/pkg\"\n";
    let path = go_file(&dir, original);

    let output = run_in(dir.path(), &["rename", "--diff", "-e", "old/pkg|new/pkg", INPUT_FILE]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-import \"old/pkg\""));
    assert!(stdout.contains("+import \"new/pkg\""));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}
