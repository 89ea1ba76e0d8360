use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use covgap::cli::{self, Style};
use covgap::coverage::CoverageSource;
use covgap::diff::{DiffSource, GitDiff, GitHubDiff, StdinDiff};
use covgap::filter::PathFilter;
use covgap::github;

/// covgap — flags newly added lines that lack test coverage.
#[derive(Parser)]
#[command(name = "covgap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a diff against a coverage report; fails when gaps are found.
    Check(CheckArgs),

    /// Print the line numbers a unified diff adds and removes.
    ParseDiff {
        /// Git diff arguments. If omitted, the diff is read from stdin.
        #[arg(long)]
        git_diff: Option<String>,
    },
}

#[derive(Args)]
struct CheckArgs {
    /// Path or URL of the Istanbul `coverage-final.json` report.
    #[arg(long)]
    coverage: String,

    /// Git diff arguments, e.g. "main...HEAD". If omitted (and --github is
    /// not given), a unified diff is read from stdin.
    #[arg(long)]
    git_diff: Option<String>,

    /// Fetch the diff for the current pull request from the GitHub API
    /// (GitHub Actions environment).
    #[arg(long)]
    github: bool,

    /// Post the report as a PR comment (GitHub Actions environment).
    #[arg(long)]
    comment: bool,

    /// Root directory joined onto diff paths to match the report's absolute
    /// paths. Defaults to the current directory.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Only check paths matching one of these regular expressions.
    #[arg(long)]
    include: Vec<String>,

    /// Skip paths matching any of these regular expressions.
    #[arg(long)]
    ignore: Vec<String>,

    /// Output style.
    #[arg(long, value_enum, default_value = "text")]
    style: Style,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => cmd_check(args),
        Commands::ParseDiff { git_diff } => cmd_parse_diff(git_diff),
    }
}

fn cmd_check(args: CheckArgs) -> Result<()> {
    let filter = PathFilter::new(&args.include, &args.ignore)?;
    let coverage = CoverageSource::from_arg(&args.coverage)
        .load()
        .with_context(|| format!("Failed to load coverage report from {}", args.coverage))?;

    let source: Box<dyn DiffSource> = if args.github {
        Box::new(GitHubDiff::from_env()?)
    } else if let Some(refs) = args.git_diff {
        Box::new(GitDiff { args: refs })
    } else {
        Box::new(StdinDiff)
    };
    let diff_text = source.fetch_diff()?;
    let sha = source.sha().map(str::to_owned);

    let root = match args.root {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };

    let mut report = cli::run_check(&diff_text, &coverage, &filter, Some(&root))?;
    report.sha = sha;

    print!("{}", cli::render(&report, &args.style)?);

    if args.comment {
        let ctx = github::Context::from_env()?;
        ctx.post_comment(&cli::render(&report, &Style::Markdown)?)?;
    }

    if report.has_gaps() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_parse_diff(git_diff: Option<String>) -> Result<()> {
    let source: Box<dyn DiffSource> = match git_diff {
        Some(refs) => Box::new(GitDiff { args: refs }),
        None => Box::new(StdinDiff),
    };
    let diff_text = source.fetch_diff()?;
    print!("{}", cli::cmd_parse_diff(&diff_text));
    Ok(())
}
