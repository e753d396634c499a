//! CLI smoke tests for the `wisp-repl` ambient binary (§10): help/version
//! output and running a script file non-interactively.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn wisp_repl() -> Command {
    Command::cargo_bin("wisp-repl").expect("wisp-repl binary should build")
}

#[test]
fn help_flag_prints_usage() {
    wisp_repl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage").or(predicate::str::contains("wisp-repl")));
}

#[test]
fn version_flag_prints_version() {
    wisp_repl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wisp-repl"));
}

#[test]
fn running_a_script_file_prints_its_return_value() {
    let mut file = tempfile_with_contents("s = 0\nfor i in 1:4\n  s = s + i\nreturn s\n");
    wisp_repl()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("10"));
    file.close_and_forget();
}

#[test]
fn script_with_empty_block_reports_a_load_error() {
    let mut file = tempfile_with_contents("if 1\nreturn 1\n");
    wisp_repl().arg(file.path()).assert().failure();
    file.close_and_forget();
}

#[test]
fn missing_script_path_reports_a_readable_error() {
    wisp_repl()
        .arg("/nonexistent/path/does-not-exist.wisp")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read script file"));
}

/// Minimal scoped temp-file helper (the crate has no `tempfile` dependency,
/// unlike `faxc-drv`'s `TempDir`-based fixtures) — writes `contents` to a
/// fresh file under the system temp directory and removes it on drop unless
/// `close_and_forget` is called first (the CLI subprocess needs the path to
/// keep existing after this function returns but before the assertion runs).
struct ScopedTempFile {
    path: std::path::PathBuf,
}

impl ScopedTempFile {
    fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn close_and_forget(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl Drop for ScopedTempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn tempfile_with_contents(contents: &str) -> ScopedTempFile {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let unique = COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut path = std::env::temp_dir();
    path.push(format!("wisp-cli-test-{}-{}.wisp", std::process::id(), unique));
    let mut f = std::fs::File::create(&path).expect("create temp script file");
    f.write_all(contents.as_bytes()).expect("write temp script file");
    ScopedTempFile { path }
}
