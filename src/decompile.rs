//! Decompile sweep and outcome capture.
//!
//! The decompiler is the thing under test, so unlike compilation this
//! stage never skips a cell: every run re-exercises the binary and
//! rewrites the stored output, failures included.

use crate::cmd::{self, Captured};
use crate::store::{self, ArtifactStore};
use crate::versions::VersionMatrix;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// First line of a stored output whose payload is an error report
/// instead of recovered source.
pub const CRASH_MARKER: &str = "#ERROR0";
pub const DIAGNOSTIC_MARKER: &str = "#ERROR1";

/// What one decompilation attempt produced. The sentinel markers exist
/// only in the disk form; everything in-memory works on this variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// Decompiler exited non-zero.
    Crash { detail: String },
    /// Exit zero but something on stderr – partial or unreliable
    /// recovery, counted as a failure.
    Diagnostic { detail: String },
    /// Clean run; the payload is the recovered source text.
    Recovered(String),
}

impl Recovery {
    /// Classify a finished decompiler invocation. A non-zero status
    /// wins over stderr content.
    pub fn from_captured(out: &Captured) -> Self {
        if !out.ok() {
            Recovery::Crash {
                detail: format!(
                    "Unexpected return code: {:#x}\n{}",
                    out.status,
                    out.stderr.trim()
                ),
            }
        } else if !out.stderr.is_empty() {
            Recovery::Diagnostic {
                detail: out.stderr.trim().to_string(),
            }
        } else {
            Recovery::Recovered(out.stdout.clone())
        }
    }

    /// Disk form: sentinel first line for errors, raw text otherwise.
    pub fn serialize(&self) -> String {
        match self {
            Recovery::Crash { detail } => format!("{CRASH_MARKER}\n{detail}"),
            Recovery::Diagnostic { detail } => format!("{DIAGNOSTIC_MARKER}\n{detail}"),
            Recovery::Recovered(text) => text.clone(),
        }
    }

    /// Parse a stored output back into the variant.
    pub fn deserialize(content: &str) -> Self {
        let (first, rest) = content.split_once('\n').unwrap_or((content, ""));
        if first.starts_with(CRASH_MARKER) {
            Recovery::Crash {
                detail: rest.to_string(),
            }
        } else if first.starts_with(DIAGNOSTIC_MARKER) {
            Recovery::Diagnostic {
                detail: rest.to_string(),
            }
        } else {
            Recovery::Recovered(content.to_string())
        }
    }
}

/// Decompile every compiled artifact the expression matches, rewriting
/// the stored output for each one.
pub fn decompile_all(
    decompiler: &Path,
    expression: &str,
    matrix: &VersionMatrix,
    store: &ArtifactStore,
    quiet: u8,
) -> Result<()> {
    store::ensure_dir(store.decompiled_dir())?;
    for version in matrix.expand() {
        if quiet < 1 {
            println!("Decompiling Version [ {version} ]...");
        }
        for artifact in store.compiled_for_version(expression, version)? {
            let recovery = decompile_one(decompiler, &artifact)?;
            let out_path = store
                .decompiled_dir()
                .join(format!("{}.py", store::file_stem(&artifact)?));
            fs::write(&out_path, recovery.serialize())
                .with_context(|| format!("Writing {}", out_path.display()))?;
        }
    }
    println!("Decompilation Done.");
    println!();
    Ok(())
}

/// One decompiler invocation, classified.
pub fn decompile_one(decompiler: &Path, artifact: &Path) -> Result<Recovery> {
    let cmd_in = format!("{} {}", cmd::quoted(decompiler), cmd::quoted(artifact));
    Ok(Recovery::from_captured(&cmd::run(&cmd_in)?))
}
