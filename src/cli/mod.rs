//! Command-line parsing for the stratigraphic age-model tool.
//!
//! Argument parsing and command dispatch stay separate from the modeling
//! code; every command takes the project config the same way.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "strat-age", version, about = "Piecewise-linear age models for stratigraphic sections")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Age the reference, correlate every other section, and print a summary.
    Build(BuildArgs),
    /// Show the biozone ties and control points for one section.
    Correlate(CorrelateArgs),
    /// Run the Monte-Carlo hiatus estimate from the config's `hiatus` block.
    Hiatus(HiatusArgs),
    /// Re-render the histogram of a saved hiatus run.
    Histogram(HistogramArgs),
}

/// Where to find the project config.
#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    /// Project config JSON (falls back to $STRAT_AGE_CONFIG).
    #[arg(short = 'c', long, value_name = "JSON")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Write one aged CSV per section into this directory.
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CorrelateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Section to correlate against the reference.
    #[arg(short = 's', long)]
    pub section: String,
}

/// Histogram layout shared by `hiatus` and `histogram`.
#[derive(Debug, Args, Clone, Copy)]
pub struct HistogramLayout {
    /// Number of histogram bins.
    #[arg(long, default_value_t = 30)]
    pub bins: usize,

    /// Plot width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 15)]
    pub height: usize,

    /// Disable the terminal histogram.
    #[arg(long)]
    pub no_plot: bool,
}

#[derive(Debug, Args, Clone)]
pub struct HiatusArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the configured iteration count.
    #[arg(short = 'n', long)]
    pub iterations: Option<usize>,

    /// Override the configured random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub layout: HistogramLayout,

    /// Write the run (settings, draws, summary) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct HistogramArgs {
    /// Run JSON produced by `strat-age hiatus --export`.
    #[arg(long, value_name = "JSON")]
    pub input: PathBuf,

    #[command(flatten)]
    pub layout: HistogramLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hiatus_overrides() {
        let cli = Cli::parse_from([
            "strat-age", "hiatus", "--config", "p.json", "-n", "500", "--seed", "7", "--bins", "10",
        ]);
        let Command::Hiatus(args) = cli.command else {
            panic!("expected hiatus");
        };
        assert_eq!(args.config.config, Some(PathBuf::from("p.json")));
        assert_eq!(args.iterations, Some(500));
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.layout.bins, 10);
        assert_eq!(args.layout.width, 60);
    }

    #[test]
    fn correlate_requires_section() {
        assert!(Cli::try_parse_from(["strat-age", "correlate"]).is_err());
        let cli = Cli::try_parse_from(["strat-age", "correlate", "-s", "lb"]).unwrap();
        assert!(matches!(cli.command, Command::Correlate(a) if a.section == "lb" && a.config.config.is_none()));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
