//! Shell runner for the external tools the harness drives.
//!
//! Every interpreter and decompiler invocation goes through [`run`]:
//! spawn through the platform shell, block until exit, hand back both
//! streams with carriage returns stripped so downstream comparisons
//! stay line-ending-agnostic. No retry, no timeout – a hung tool hangs
//! the harness.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

/// Everything a finished child process left behind.
#[derive(Debug)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
    /// Numeric exit status; `-1` when the process died without one
    /// (killed by a signal).
    pub status: i32,
}

impl Captured {
    pub fn ok(&self) -> bool {
        self.status == 0
    }
}

/// Run `command_line` through the platform shell and capture the result.
pub fn run(command_line: &str) -> Result<Captured> {
    let output = shell(command_line)
        .output()
        .with_context(|| format!("Spawning `{command_line}`"))?;

    Ok(Captured {
        stdout: decode(&output.stdout),
        stderr: decode(&output.stderr),
        status: output.status.code().unwrap_or(-1),
    })
}

#[cfg(windows)]
fn shell(command_line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command_line);
    cmd
}

#[cfg(not(windows))]
fn shell(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\r', "")
}

/// Wrap a path for a shell command line. All the quoting the harness
/// needs lives here; paths with embedded double quotes are not
/// supported.
pub fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}
