//! Rendering judged cells and tallies into the console surface and the
//! optional machine-readable summary.
//!
//! Everything here is a pure function of the tally and the version
//! order; printing is confined to the thin `print_*` wrappers.

use crate::verdict::{CellVerdict, Tally};
use crate::versions::VersionId;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Per-version rollup of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStatus {
    Passed,
    PartiallyPassed,
    Failed,
}

impl VersionStatus {
    pub fn of(successes: usize, total: usize) -> Self {
        if successes == total {
            VersionStatus::Passed
        } else if successes > 0 {
            VersionStatus::PartiallyPassed
        } else {
            VersionStatus::Failed
        }
    }

    fn glyph(self) -> char {
        match self {
            VersionStatus::Passed => '+',
            VersionStatus::PartiallyPassed => '*',
            VersionStatus::Failed => '-',
        }
    }

    fn label(self) -> &'static str {
        match self {
            VersionStatus::Passed => "Passed",
            VersionStatus::PartiallyPassed => "Partially passed",
            VersionStatus::Failed => "Failed",
        }
    }

    fn paint(self, text: &str) -> String {
        match self {
            VersionStatus::Passed => text.bright_green().to_string(),
            VersionStatus::PartiallyPassed => text.yellow().to_string(),
            VersionStatus::Failed => text.bright_red().to_string(),
        }
    }
}

/// Whole-run rollup across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    PassedAll,
    PartiallyPassed,
    FailedAll,
}

impl OverallStatus {
    /// Passed-all when every version passed; partially when at least
    /// one version is not failed; failed-all otherwise.
    pub fn of(statuses: &[VersionStatus]) -> Self {
        if statuses.iter().all(|status| *status == VersionStatus::Passed) {
            OverallStatus::PassedAll
        } else if statuses.iter().any(|status| *status != VersionStatus::Failed) {
            OverallStatus::PartiallyPassed
        } else {
            OverallStatus::FailedAll
        }
    }
}

/// `[<gg>] <head> ----> <info>` with dashes padded so every arrow in a
/// block lines up on the longest head.
fn info_line(glyph: char, head: &str, align: usize, info: &str) -> String {
    format!(
        "[{glyph}{glyph}] {head} {}--> {info}",
        "-".repeat(align.saturating_sub(head.len()))
    )
}

/// Head-less form used by the overall summary.
fn status_line(glyph: char, info: &str) -> String {
    format!("[{glyph}{glyph}] {info}")
}

/// One judged cell.
pub fn cell_line(file_name: &str, verdict: CellVerdict, align: usize) -> String {
    match verdict {
        CellVerdict::Succeeded => info_line(
            '+',
            file_name,
            align,
            &"Succeeded".bright_green().to_string(),
        ),
        CellVerdict::FailedCrash => info_line(
            '-',
            file_name,
            align,
            &"Failed (decompiler crashed at runtime)".bright_red().to_string(),
        ),
        CellVerdict::FailedDiagnostic => info_line(
            '-',
            file_name,
            align,
            &"Failed (unsupported construct / warning)".bright_red().to_string(),
        ),
        CellVerdict::FailedMismatch => info_line(
            '-',
            file_name,
            align,
            &format!(
                "{} {}",
                "Failed".bright_red(),
                "(output mismatch)".bright_magenta()
            ),
        ),
    }
}

/// Debug dump framing for a cell's diagnostic payload.
pub fn detail_block(detail: &str) -> String {
    format!("-----------------\n{detail}\n-----------------")
}

/// Per-version summary lines, one per targeted version in matrix order.
pub fn version_summary(tally: &Tally, order: &[VersionId]) -> Vec<String> {
    let align = order
        .iter()
        .map(|version| format!("Version {version}").len())
        .max()
        .unwrap_or(0);
    order
        .iter()
        .map(|version| {
            let successes = tally.successes(*version);
            let status = VersionStatus::of(successes, tally.total_files);
            let info = status.paint(&format!(
                "{} ({} / {})",
                status.label(),
                successes,
                tally.total_files
            ));
            info_line(status.glyph(), &format!("Version {version}"), align, &info)
        })
        .collect()
}

/// Overall summary lines across all targeted versions.
pub fn overall_summary(tally: &Tally, order: &[VersionId]) -> Vec<String> {
    let statuses: Vec<VersionStatus> = order
        .iter()
        .map(|version| VersionStatus::of(tally.successes(*version), tally.total_files))
        .collect();
    let count = |wanted: VersionStatus| statuses.iter().filter(|s| **s == wanted).count();

    let mut lines = vec![format!(
        "Versions Summary: ({} versions)",
        order.len().to_string().bright_cyan()
    )];
    match OverallStatus::of(&statuses) {
        OverallStatus::PassedAll => {
            lines.push(status_line('+', &"PASSED ALL".bright_green().to_string()));
        }
        OverallStatus::FailedAll => {
            lines.push(status_line('-', &"FAILED ALL".bright_red().to_string()));
        }
        OverallStatus::PartiallyPassed => {
            let breakdown = [
                ('+', VersionStatus::Passed),
                ('*', VersionStatus::PartiallyPassed),
                ('-', VersionStatus::Failed),
            ];
            for (glyph, status) in breakdown {
                let n = count(status);
                if n > 0 {
                    let info =
                        status.paint(&format!("{} ({} / {})", status.label(), n, order.len()));
                    lines.push(status_line(glyph, &info));
                }
            }
        }
    }
    lines
}

/// Print the per-version block and the overall block, honoring the
/// quiet level. Never panics, whatever the tally shape.
pub fn print_summary(tally: &Tally, order: &[VersionId], quiet: u8) {
    if quiet < 3 {
        println!(
            "Each Version Summary: ({} tests)",
            tally.total_files.to_string().bright_cyan()
        );
        for line in version_summary(tally, order) {
            println!("{line}");
        }
        println!();
    }
    for line in overall_summary(tally, order) {
        println!("{line}");
    }
}

/// Machine-readable run summary, written when `--json` is given.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub files: usize,
    pub versions: Vec<VersionReport>,
    pub overall: String,
    pub seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct VersionReport {
    pub version: String,
    pub passed: usize,
    pub total: usize,
    pub status: String,
}

pub fn run_report(tally: &Tally, order: &[VersionId], seconds: f64) -> RunReport {
    let statuses: Vec<VersionStatus> = order
        .iter()
        .map(|version| VersionStatus::of(tally.successes(*version), tally.total_files))
        .collect();
    let versions = order
        .iter()
        .zip(&statuses)
        .map(|(version, status)| VersionReport {
            version: version.to_string(),
            passed: tally.successes(*version),
            total: tally.total_files,
            status: match status {
                VersionStatus::Passed => "passed",
                VersionStatus::PartiallyPassed => "partially-passed",
                VersionStatus::Failed => "failed",
            }
            .to_string(),
        })
        .collect();
    RunReport {
        files: tally.total_files,
        versions,
        overall: match OverallStatus::of(&statuses) {
            OverallStatus::PassedAll => "passed-all",
            OverallStatus::PartiallyPassed => "partially-passed",
            OverallStatus::FailedAll => "failed-all",
        }
        .to_string(),
        seconds,
    }
}

pub fn write_json(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("Writing {}", path.display()))
}
