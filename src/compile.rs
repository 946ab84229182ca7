//! Compile sweep: drive every {source × version} cell through
//! `py_compile` and park the bytecode in the artifact store.
//!
//! The corpus is valid source by definition, so any toolchain complaint
//! is a harness/environment problem: it aborts the whole run with the
//! raw stderr instead of being recorded as a test result.

use crate::cmd;
use crate::store::{self, ArtifactStore};
use crate::versions::{VersionId, VersionMatrix};
use anyhow::{Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// Locates the per-version interpreter executables.
pub struct Toolchains {
    root: PathBuf,
}

impl Toolchains {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Derive the install root from whatever interpreter is on `PATH`;
    /// versioned installs live beside it (`…\Python310\python.exe` on
    /// Windows, `python3.10` next to `python3` elsewhere).
    pub fn from_path_probe() -> Result<Self> {
        let probe = if cfg!(windows) {
            "where python"
        } else {
            "command -v python3"
        };
        let out = cmd::run(probe)?;
        let first = out.stdout.lines().next().unwrap_or("").trim();
        if !out.ok() || first.is_empty() {
            bail!("No interpreter found on PATH; pass --toolchains");
        }
        let probe_path = Path::new(first);
        let root = if cfg!(windows) {
            probe_path.parent().and_then(Path::parent)
        } else {
            probe_path.parent()
        };
        match root {
            Some(root) => Ok(Self::new(root.to_path_buf())),
            None => bail!("Cannot derive a toolchain root from {first}"),
        }
    }

    /// Interpreter executable for one release.
    pub fn interpreter(&self, version: VersionId) -> PathBuf {
        if cfg!(windows) {
            self.root
                .join(format!("Python{}", version.compact()))
                .join("python.exe")
        } else {
            self.root.join(format!("python{version}"))
        }
    }
}

/// Compile every cell that is not already in the store. Bytecode for a
/// fixed (source, version) pair never changes, so skipping existing
/// artifacts is what makes re-runs cheap.
pub fn compile_all(
    files: &[PathBuf],
    matrix: &VersionMatrix,
    store: &ArtifactStore,
    toolchains: &Toolchains,
    quiet: u8,
) -> Result<()> {
    store::ensure_dir(store.compiled_dir())?;
    for version in matrix.expand() {
        if quiet < 1 {
            println!("Compiling Version [ {version} ]...");
        }
        let interpreter = toolchains.interpreter(version);
        for source in files {
            let stem = store::file_stem(source)?;
            if store.compiled_path(stem, version).is_file() {
                continue;
            }
            compile_one(&interpreter, source)?;
            store.relocate_compiler_output(source, version)?;
        }
    }
    // transient bytecode cache; leftovers from other tools are fine
    let _ = fs::remove_dir(store.pycache_dir());
    println!("Compilation Done.");
    println!();
    Ok(())
}

fn compile_one(interpreter: &Path, source: &Path) -> Result<()> {
    let cmd_in = format!(
        "{} -m py_compile {}",
        cmd::quoted(interpreter),
        cmd::quoted(source)
    );
    let out = cmd::run(&cmd_in)?;
    if !out.ok() || !out.stderr.is_empty() {
        bail!(
            "Compiling {} failed (status {}):\n{}",
            source.display(),
            out.status,
            out.stderr
        );
    }
    Ok(())
}
