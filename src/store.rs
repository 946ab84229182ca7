//! Deterministic artifact layout: where compiled and decompiled
//! byproducts live and how raw toolchain output gets relocated there.
//!
//! Path construction is pure so any stage can predict a location
//! without touching the filesystem.

use crate::versions::VersionId;
use anyhow::{Context, Result, anyhow, bail};
use globset::Glob;
use std::fs;
use std::path::{Path, PathBuf};

const INPUT_DIR: &str = "input";
const COMPILED_DIR: &str = "compiled";
const DECOMPILED_DIR: &str = "decompiled";

/// The three fixed directories of a harness root.
pub struct ArtifactStore {
    input: PathBuf,
    compiled: PathBuf,
    decompiled: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: &Path) -> Self {
        Self {
            input: root.join(INPUT_DIR),
            compiled: root.join(COMPILED_DIR),
            decompiled: root.join(DECOMPILED_DIR),
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input
    }

    pub fn compiled_dir(&self) -> &Path {
        &self.compiled
    }

    pub fn decompiled_dir(&self) -> &Path {
        &self.decompiled
    }

    /// `compiled/<stem>.<family>.<minor>.pyc` – pure naming, no I/O.
    pub fn compiled_path(&self, stem: &str, version: VersionId) -> PathBuf {
        self.compiled
            .join(format!("{stem}.{}.{}.pyc", version.family, version.minor))
    }

    /// `decompiled/<stem>.<family>.<minor>.py` – pure naming, no I/O.
    pub fn decompiled_path(&self, stem: &str, version: VersionId) -> PathBuf {
        self.decompiled
            .join(format!("{stem}.{}.{}.py", version.family, version.minor))
    }

    /// Input corpus matching the stem expression, in name order so a
    /// run's cell order is reproducible.
    pub fn input_files(&self, expression: &str) -> Result<Vec<PathBuf>> {
        matching(&self.input, &format!("{expression}.py"))
    }

    /// Compiled artifacts of one version matching the stem expression.
    pub fn compiled_for_version(
        &self,
        expression: &str,
        version: VersionId,
    ) -> Result<Vec<PathBuf>> {
        matching(
            &self.compiled,
            &format!("{expression}.{}.{}.pyc", version.family, version.minor),
        )
    }

    /// Move whatever the toolchain produced for `source` into the stable
    /// compiled location. Interpreters either drop `<stem>.pyc` beside
    /// the source or `<stem>.cpython-<famminor>.pyc` into `__pycache__`;
    /// anything else means the naming convention changed under us.
    pub fn relocate_compiler_output(&self, source: &Path, version: VersionId) -> Result<PathBuf> {
        let stem = file_stem(source)?;
        let dir = source.parent().unwrap_or(Path::new("."));
        let mut produced = dir.join(format!("{stem}.pyc"));
        if !produced.is_file() {
            produced = dir
                .join("__pycache__")
                .join(format!("{stem}.cpython-{}.pyc", version.compact()));
        }
        if !produced.is_file() {
            bail!(
                "No compiled artifact found for {} under version {}",
                source.display(),
                version
            );
        }
        let target = self.compiled_path(stem, version);
        fs::rename(&produced, &target).with_context(|| {
            format!("Moving {} to {}", produced.display(), target.display())
        })?;
        Ok(target)
    }

    /// The interpreter's transient bytecode cache under the corpus dir.
    pub fn pycache_dir(&self) -> PathBuf {
        self.input.join("__pycache__")
    }
}

/// Idempotent directory creation; an existing directory is a no-op.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Creating {}", dir.display()))
}

/// UTF-8 file stem, or an error for paths without one.
pub fn file_stem(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| anyhow!("{} has no usable file stem", path.display()))
}

fn matching(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = Glob::new(pattern)
        .with_context(|| format!("Bad file expression `{pattern}`"))?
        .compile_matcher();
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    for entry in fs::read_dir(dir).with_context(|| format!("Reading {}", dir.display()))? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if path.is_file() && matcher.is_match(name) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
