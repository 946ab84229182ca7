//! Judging one cell and folding cell outcomes into per-version tallies.
//!
//! Equivalence is textual, not behavioral: a decompilation passes when
//! its non-blank, tab-normalized lines match the original line for line
//! once the decompiler's banner is discarded. Neither program is ever
//! executed.

use crate::decompile::Recovery;
use crate::versions::VersionId;
use anyhow::{Context, Result};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Lines of decompiler header/comment banner that are not part of the
/// recovered semantics.
const BANNER_LINES: usize = 3;

/// Outcome of one (source, version) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellVerdict {
    Succeeded,
    FailedCrash,
    FailedDiagnostic,
    FailedMismatch,
}

impl CellVerdict {
    pub fn succeeded(self) -> bool {
        self == CellVerdict::Succeeded
    }
}

/// One judged cell: the verdict plus the diagnostic payload shown by
/// the debug dump (error report, or both normalized texts on mismatch).
#[derive(Debug)]
pub struct Judgement {
    pub verdict: CellVerdict,
    pub detail: Option<String>,
}

/// Run-scoped memo of normalized source text; every version of a file
/// compares against the same original, so normalize once.
#[derive(Default)]
pub struct SourceCache {
    normalized: HashMap<PathBuf, String>,
}

impl SourceCache {
    pub fn normalized(&mut self, source: &Path) -> Result<&str> {
        match self.normalized.entry(source.to_path_buf()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let raw = fs::read_to_string(source)
                    .with_context(|| format!("Reading {}", source.display()))?;
                Ok(entry.insert(normalize_source(&raw)))
            }
        }
    }
}

/// Judge one cell from its stored decompilation output and the original
/// source text.
pub fn classify(
    cache: &mut SourceCache,
    source: &Path,
    decompiled: &Path,
) -> Result<Judgement> {
    let stored = fs::read_to_string(decompiled)
        .with_context(|| format!("Reading {}", decompiled.display()))?;

    Ok(match Recovery::deserialize(&stored) {
        Recovery::Crash { detail } => Judgement {
            verdict: CellVerdict::FailedCrash,
            detail: Some(detail),
        },
        Recovery::Diagnostic { detail } => Judgement {
            verdict: CellVerdict::FailedDiagnostic,
            detail: Some(detail),
        },
        Recovery::Recovered(text) => {
            let original = cache.normalized(source)?.to_string();
            let recovered = normalize_recovered(&text);
            if original == recovered {
                Judgement {
                    verdict: CellVerdict::Succeeded,
                    detail: None,
                }
            } else {
                Judgement {
                    verdict: CellVerdict::FailedMismatch,
                    detail: Some(format!("{original}\n=================\n{recovered}")),
                }
            }
        }
    })
}

/// Original side: tabs become four spaces, whitespace-only lines drop
/// out. Indentation of content lines is preserved.
fn normalize_source(text: &str) -> String {
    keep_content_lines(text.replace('\t', "    ").split('\n'))
}

/// Decompiled side: banner first, then the same blank-line rule. Tab
/// expansion is not needed here; decompilers emit space indentation.
fn normalize_recovered(text: &str) -> String {
    keep_content_lines(text.split('\n').skip(BANNER_LINES))
}

fn keep_content_lines<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    lines
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Success counts per version over the fixed corpus size. Seeded with
/// every targeted version so fully failed versions still report.
#[derive(Debug)]
pub struct Tally {
    successes: BTreeMap<VersionId, usize>,
    pub total_files: usize,
}

impl Tally {
    pub fn new(versions: &[VersionId], total_files: usize) -> Self {
        Self {
            successes: versions.iter().map(|version| (*version, 0)).collect(),
            total_files,
        }
    }

    /// Fold one verdict in. Only successes move the counter, so folding
    /// a fixed version's cells commutes.
    pub fn record(&mut self, version: VersionId, verdict: CellVerdict) {
        if verdict.succeeded() {
            *self.successes.entry(version).or_insert(0) += 1;
        }
    }

    pub fn successes(&self, version: VersionId) -> usize {
        self.successes.get(&version).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn classify_pair(source_text: &str, decompiled_text: &str) -> Judgement {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("case.py");
        let decompiled = dir.path().join("case.3.10.py");
        fs::write(&source, source_text).unwrap();
        fs::write(&decompiled, decompiled_text).unwrap();
        classify(&mut SourceCache::default(), &source, &decompiled).unwrap()
    }

    #[test]
    fn banner_is_discarded_before_comparing() {
        let judgement = classify_pair(
            "print('start')\n",
            "#Decompiled by X\n#v1\n#v2\nprint('start')\n",
        );
        assert_eq!(judgement.verdict, CellVerdict::Succeeded);
        assert!(judgement.detail.is_none());
    }

    #[test]
    fn crash_marker_wins_regardless_of_original() {
        let judgement = classify_pair(
            "print('start')\n",
            "#ERROR0\nUnexpected return code: 0xc0000005\n",
        );
        assert_eq!(judgement.verdict, CellVerdict::FailedCrash);
        assert!(judgement.detail.unwrap().contains("0xc0000005"));
    }

    #[test]
    fn diagnostic_marker_classifies_as_diagnostic() {
        let judgement = classify_pair(
            "print('start')\n",
            "#ERROR1\nUnsupported opcode: MATCH_KEYS\n",
        );
        assert_eq!(judgement.verdict, CellVerdict::FailedDiagnostic);
        assert!(judgement.detail.unwrap().contains("MATCH_KEYS"));
    }

    #[test]
    fn tabs_and_blank_lines_do_not_matter() {
        let judgement = classify_pair(
            "def f():\n\tx = 1\n\n\treturn x\n",
            "#b1\n#b2\n#b3\ndef f():\n    x = 1\n    return x\n",
        );
        assert_eq!(judgement.verdict, CellVerdict::Succeeded);
    }

    #[test]
    fn differing_content_is_a_mismatch() {
        let judgement = classify_pair(
            "print('start')\n",
            "#b1\n#b2\n#b3\nprint('stop')\n",
        );
        assert_eq!(judgement.verdict, CellVerdict::FailedMismatch);
        let detail = judgement.detail.unwrap();
        assert!(detail.contains("print('start')"));
        assert!(detail.contains("print('stop')"));
    }

    #[test]
    fn short_output_compares_as_empty() {
        // fewer lines than the banner leaves nothing to compare
        let judgement = classify_pair("print('start')\n", "#b1\n#b2\n");
        assert_eq!(judgement.verdict, CellVerdict::FailedMismatch);
    }

    #[test]
    fn cache_normalizes_once_per_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("case.py");
        fs::write(&source, "x = 1\n").unwrap();
        let mut cache = SourceCache::default();
        assert_eq!(cache.normalized(&source).unwrap(), "x = 1");

        // later reads come from the memo, not the file
        fs::write(&source, "changed\n").unwrap();
        assert_eq!(cache.normalized(&source).unwrap(), "x = 1");
    }

    #[test]
    fn folding_commutes_over_files() {
        let versions = [VersionId::new(3, 9), VersionId::new(3, 10)];
        let verdicts = [
            CellVerdict::Succeeded,
            CellVerdict::FailedCrash,
            CellVerdict::Succeeded,
            CellVerdict::FailedMismatch,
        ];

        let mut forward = Tally::new(&versions, verdicts.len());
        for verdict in verdicts {
            forward.record(versions[1], verdict);
        }
        let mut backward = Tally::new(&versions, verdicts.len());
        for verdict in verdicts.iter().rev() {
            backward.record(versions[1], *verdict);
        }

        assert_eq!(forward.successes(versions[1]), 2);
        assert_eq!(backward.successes(versions[1]), 2);
        assert_eq!(forward.successes(versions[0]), 0);
        assert_eq!(forward.total_files, 4);
    }
}
