// tests/run_entrypoint.rs
//
// `cronrun::run` changes the process working directory and installs the
// global subscriber, so these tests drive it through the built binary.
mod common;

use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

use cronrun::logging::open_log_file;

type TestResult = Result<(), Box<dyn Error>>;

fn toml_str(path: &Path) -> String {
    format!("{:?}", path.display().to_string())
}

fn write_config(dir: &Path, project_root: &Path, lock_file: &str, job: &str) -> TestResult {
    let config = format!(
        r#"
[run]
project_root = {root}
lock_file = {lock:?}
log_file = "logging/cron.log"
sentinel_exit_code = 9

[job]
cmd = {job:?}
"#,
        root = toml_str(project_root),
        lock = lock_file,
        job = job,
    );
    fs::write(dir.join("Cronrun.toml"), config)?;
    Ok(())
}

fn run_cronrun(dir: &Path) -> std::io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_cronrun"))
        .arg("--config")
        .arg(dir.join("Cronrun.toml"))
        .env_remove("CRONRUN_PROJECT_ROOT")
        .env_remove("CRONRUN_LOG")
        .current_dir(dir)
        .output()
}

#[test]
fn missing_project_root_is_fatal_and_creates_nothing() -> TestResult {
    let dir = TempDir::new()?;
    let root = dir.path().join("does_not_exist");
    let lock = dir.path().join("cronrun.lock");
    write_config(
        dir.path(),
        &root,
        &lock.display().to_string(),
        "pwd > ran.txt",
    )?;

    let output = run_cronrun(dir.path())?;

    assert_eq!(output.status.code(), Some(9), "sentinel expected");
    assert!(!root.exists(), "project root must not be created");
    assert!(!lock.exists(), "lock must not be taken");
    assert!(!dir.path().join("ran.txt").exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("project root"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn project_root_that_is_a_file_is_fatal() -> TestResult {
    let dir = TempDir::new()?;
    let root = dir.path().join("not_a_dir");
    fs::write(&root, "")?;
    write_config(dir.path(), &root, "cronrun.lock", "true")?;

    let output = run_cronrun(dir.path())?;

    assert_eq!(output.status.code(), Some(9));
    assert!(root.is_file(), "project root path must be left as it was");
    Ok(())
}

#[test]
fn job_runs_in_project_root_with_paths_resolved_against_it() -> TestResult {
    let dir = TempDir::new()?;
    let root = dir.path().join("app");
    fs::create_dir(&root)?;
    write_config(
        dir.path(),
        &root,
        "run/cronrun.lock",
        "pwd > where.txt; test -f run/cronrun.lock && exit 3; exit 4",
    )?;

    let output = run_cronrun(dir.path())?;

    assert_eq!(
        output.status.code(),
        Some(3),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let cwd = fs::read_to_string(root.join("where.txt"))?;
    assert_eq!(Path::new(cwd.trim()), fs::canonicalize(&root)?);

    // Relative lock path: held under the root while the job ran, gone after.
    assert!(root.join("run").is_dir());
    assert!(!root.join("run/cronrun.lock").exists());

    let log = fs::read_to_string(root.join("logging/cron.log"))?;
    assert!(log.contains("run attempt finished"), "log: {log}");
    assert!(!log.contains("\u{1b}["), "log file must be free of ANSI codes");
    Ok(())
}

#[test]
fn log_file_opening_creates_only_its_own_directory() -> TestResult {
    let dir = TempDir::new()?;

    open_log_file(&dir.path().join("logging/cron.log"))?;
    assert!(dir.path().join("logging/cron.log").is_file());

    let deep = dir.path().join("missing/logging/cron.log");
    assert!(open_log_file(&deep).is_err());
    assert!(!dir.path().join("missing").exists());
    Ok(())
}
