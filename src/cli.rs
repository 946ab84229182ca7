use clap::Parser;
use std::path::PathBuf;

/// Cross-version regression harness for a bytecode decompiler: compile
/// the input corpus under every targeted interpreter release, decompile
/// the bytecode back and compare the recovered text with the original.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Decompiler executable under test (e.g. "../Release/pycdc")
    pub decompiler: PathBuf,

    /// Expression for the test files. (e.g. "exceptions" or "exceptions*")
    #[arg(short, long, default_value = "*")]
    pub expression: String,

    /// Test specific version(s). (e.g. "310" or "39 310")
    #[arg(short, long, num_args = 0..)]
    pub versions: Vec<String>,

    /// Quiet level (0-3).
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub quiet: u8,

    /// Print more information on fails/errors.
    #[arg(long)]
    pub debug: bool,

    /// Disable colors on the terminal.
    #[arg(long)]
    pub no_color: bool,

    /// Harness root holding input/, compiled/ and decompiled/.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Directory holding the per-version interpreter installs; derived
    /// from the interpreter on PATH when omitted.
    #[arg(long)]
    pub toolchains: Option<PathBuf>,

    /// Write a machine-readable run summary to this path.
    #[arg(long)]
    pub json: Option<PathBuf>,
}

impl Cli {
    /// Keep only the characters a stem expression may contain.
    pub fn sanitized_expression(&self) -> String {
        self.expression
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | '_' | '-'))
            .collect()
    }
}
