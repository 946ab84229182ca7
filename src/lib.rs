pub mod cli;
pub mod cmd;
pub mod compile;
pub mod decompile;
pub mod report;
pub mod store;
pub mod verdict;
pub mod versions;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::time::Instant;

pub fn run() -> Result<()> {
    let args = cli::Cli::parse();
    if args.no_color {
        colored::control::set_override(false);
    }
    if args.debug && args.quiet > 1 {
        bail!("debug can only be used with quiet level <= 1");
    }
    if !args.decompiler.exists() {
        bail!("File \"{}\" not exists.", args.decompiler.display());
    }

    // 1. ── Configure ──────────────────────────────────────────────────
    let mut matrix = versions::VersionMatrix::supported();
    if !args.versions.is_empty() {
        let ids = args
            .versions
            .iter()
            .map(|text| versions::VersionId::parse(text))
            .collect::<Result<Vec<_>>>()?;
        matrix.restrict_to(&ids)?;
    }
    let expression = args.sanitized_expression();
    let store = store::ArtifactStore::new(&args.root);

    // 2. ── Collect the corpus ─────────────────────────────────────────
    let input_files = store.input_files(&expression)?;
    if input_files.is_empty() {
        println!("No input files matched expression.");
        return Ok(());
    }
    print_start(&expression);
    let started = Instant::now();

    // 3. ── Compile ────────────────────────────────────────────────────
    let toolchains = match &args.toolchains {
        Some(root) => compile::Toolchains::new(root.clone()),
        None => compile::Toolchains::from_path_probe()?,
    };
    compile::compile_all(&input_files, &matrix, &store, &toolchains, args.quiet)
        .with_context(|| "Compiling the input corpus")?;

    // 4. ── Decompile ──────────────────────────────────────────────────
    decompile::decompile_all(&args.decompiler, &expression, &matrix, &store, args.quiet)
        .with_context(|| "Decompiling the compiled artifacts")?;

    // 5. ── Judge every cell ───────────────────────────────────────────
    let order = matrix.expand();
    let mut tally = verdict::Tally::new(&order, input_files.len());
    let mut cache = verdict::SourceCache::default();
    let align = input_files
        .iter()
        .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
        .map(str::len)
        .max()
        .unwrap_or(0);

    for version in &order {
        if args.quiet < 2 {
            println!("Testing Version [ {version} ]... ");
            println!("=====================");
        }
        for source in &input_files {
            let stem = store::file_stem(source)?;
            let decompiled = store.decompiled_path(stem, *version);
            let judgement = verdict::classify(&mut cache, source, &decompiled)?;
            if args.quiet < 2 {
                let name = source
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or(stem);
                println!("{}", report::cell_line(name, judgement.verdict, align));
                if args.debug {
                    if let Some(detail) = &judgement.detail {
                        println!("{}", report::detail_block(detail));
                    }
                }
            }
            tally.record(*version, judgement.verdict);
        }
        if args.quiet < 2 {
            println!();
        }
    }

    // 6. ── Report ─────────────────────────────────────────────────────
    let seconds = started.elapsed().as_secs_f64();
    println!(
        "Finished in {} seconds.",
        format!("{seconds:.2}").bright_cyan()
    );
    report::print_summary(&tally, &order, args.quiet);
    if let Some(path) = &args.json {
        report::write_json(&report::run_report(&tally, &order, seconds), path)?;
    }

    Ok(())
}

fn print_start(expression: &str) {
    println!("======================");
    println!("Starting TESTS...");
    println!("Files expression: < {} >", expression.cyan());
    println!("======================");
}
