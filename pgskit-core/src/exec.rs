//! Synchronous invocation of external tools.
//!
//! One shot, no retry: a non-zero exit becomes an error carrying the tool's
//! stderr, and the caller decides what to do with it.

use std::path::Path;
use std::process::{Command, Output};

use anyhow::{bail, Context, Result};

/// Render an argv for logs and error messages.
pub fn display(argv: &[String]) -> String {
    argv.join(" ")
}

/// Run an argv in `workdir`, requiring a zero exit status.
pub fn run_checked(argv: &[String], workdir: &Path) -> Result<Output> {
    let output = launch(argv, workdir)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "`{}` exited with {}: {}",
            display(argv),
            output.status,
            stderr.trim()
        );
    }
    Ok(output)
}

/// Run an argv in `workdir` and return its stdout as UTF-8 text.
pub fn capture_stdout(argv: &[String], workdir: &Path) -> Result<String> {
    let output = run_checked(argv, workdir)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn launch(argv: &[String], workdir: &Path) -> Result<Output> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Empty command"))?;
    Command::new(program)
        .args(args)
        .current_dir(workdir)
        .output()
        .with_context(|| format!("Failed to launch `{program}`; is it on PATH?"))
}
