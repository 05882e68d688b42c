//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - sets up logging
//! - parses CLI arguments
//! - runs the shared pipeline for the chosen command
//! - prints reports/plots and writes optional exports

use clap::Parser;

use crate::cli::{BuildArgs, Command, CorrelateArgs, HiatusArgs, HistogramArgs, HistogramLayout};
use crate::error::AppError;
use crate::io::HiatusRunFile;

pub mod pipeline;

/// Entry point for the `strat-age` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Build(args) => handle_build(args),
        Command::Correlate(args) => handle_correlate(args),
        Command::Hiatus(args) => handle_hiatus(args),
        Command::Histogram(args) => handle_histogram(args),
    }
}

/// Default to `warn`; `RUST_LOG` overrides.
fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("warn");
    // A second init (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}

fn handle_build(args: BuildArgs) -> Result<(), AppError> {
    let mut project = pipeline::load_project(args.config.config.as_deref())?;
    let reports = pipeline::run_build(&mut project)?;

    println!("{}", crate::report::format_build_summary(&reports));

    if let Some(dir) = &args.export {
        let written = crate::io::write_sections(
            dir,
            project.engine.store().sections(),
            &project.loaded.config.columns,
        )?;
        println!("Exported {} section(s) to {}", written.len(), dir.display());
    }

    Ok(())
}

fn handle_correlate(args: CorrelateArgs) -> Result<(), AppError> {
    let mut project = pipeline::load_project(args.config.config.as_deref())?;
    let (ties, cps) = pipeline::run_correlate(&mut project, &args.section)?;

    let reference = project.engine.store().reference_name();
    println!("{}", crate::report::format_ties(&args.section, reference, &ties, &cps));
    Ok(())
}

fn handle_hiatus(args: HiatusArgs) -> Result<(), AppError> {
    let mut project = pipeline::load_project(args.config.config.as_deref())?;
    let run = pipeline::run_hiatus(&mut project, args.iterations, args.seed)?;

    print_hiatus(&run, args.layout);

    if let Some(path) = &args.export {
        crate::io::write_run_json(path, &run)?;
        println!("Wrote run to {}", path.display());
    }
    Ok(())
}

fn handle_histogram(args: HistogramArgs) -> Result<(), AppError> {
    let run = crate::io::read_run_json(&args.input)?;
    print_hiatus(&run, args.layout);
    Ok(())
}

fn print_hiatus(run: &HiatusRunFile, layout: HistogramLayout) {
    println!("{}", crate::report::format_hiatus_summary(run));
    if !layout.no_plot {
        let plot = crate::plot::render_histogram(
            &run.hiatus_values(),
            layout.bins,
            layout.width,
            layout.height,
            Some(run.summary.median),
        );
        println!("{plot}");
    }
}
