use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::cleaner::CleanupEngine;
use crate::config::Config;
use crate::model::{CleanupRequest, ScanRequest};
use crate::output::{self, FullReport, OutputMode};
use crate::progress;
use crate::scanner::Scanner;
use crate::theme::Theme;
use crate::walker::CancelToken;

/// Read one line from a fresh stdin handle after flushing any pending prompt.
fn read_line_from_stdin() -> io::Result<String> {
    io::stdout().flush()?;
    io::stderr().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input)
}

#[derive(Parser)]
#[command(name = "reclaim")]
#[command(version)]
#[command(about = "Find and safely remove build bloat, duplicates, junk files and dev caches")]
#[command(
    long_about = "Reclaim scans a directory tree for disk space that can be given back: \
    build output, duplicate files, junk files, package manager caches and oversized \
    .git directories. Scans never modify anything; `clean` moves paths to the trash \
    unless --permanent is given.\n\n\
    Examples:\n  \
    reclaim scan all --path ~/code          # Everything under ~/code\n  \
    reclaim scan large --min-size 500MB     # Files over 500MB in the current directory\n  \
    reclaim scan duplicates --json          # Machine-readable duplicate sets\n  \
    reclaim clean ./app/node_modules --dry-run"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find reclaimable space (read-only, safe to run anytime)
    #[command(visible_alias = "s")]
    Scan {
        /// What to look for
        #[arg(value_enum)]
        target: ScanTarget,

        #[command(flatten)]
        args: ScanArgs,
    },

    /// Delete the given paths (moves them to the trash by default)
    Clean {
        /// Paths to delete
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Report what would be deleted without touching anything
        #[arg(long)]
        dry_run: bool,

        /// Delete permanently instead of moving to the trash
        #[arg(long)]
        permanent: bool,

        /// Refuse any path outside this directory
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Output results as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show configuration (location and effective settings unless narrowed)
    Config {
        /// Print the effective configuration as TOML
        #[arg(long, conflicts_with = "path")]
        show: bool,

        /// Print the config file location
        #[arg(long)]
        path: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScanTarget {
    /// Build output directories (node_modules, target, ...)
    Bloat,
    /// Files above a size threshold
    Large,
    /// Files with identical content
    Duplicates,
    /// Logs, temp files, backups, crash dumps
    Junk,
    /// Package manager and toolchain caches
    DevCaches,
    /// Space used inside .git directories
    Git,
    /// Every scan above
    All,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Root path to scan (default: current directory)
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Smallest entry to report (e.g., 10MB, 1GB)
    #[arg(long, value_name = "SIZE")]
    pub min_size: Option<String>,

    /// Follow symbolic links while walking
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Worker threads (default: one per CPU)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Output results as JSON for scripting
    #[arg(long)]
    pub json: bool,
}

/// Log to stderr. `RUST_LOG` wins over the -v/-q flags.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        init_tracing(self.verbose, self.quiet);
        let output_mode = OutputMode::from_flags(self.verbose, self.quiet);

        match self.command {
            Commands::Scan { target, args } => run_scan(target, args, output_mode),
            Commands::Clean {
                paths,
                dry_run,
                permanent,
                root,
                yes,
                json,
            } => {
                let mut request = CleanupRequest::new(paths)
                    .dry_run(dry_run)
                    .use_trash(!permanent);
                if let Some(root) = root {
                    request = request.within(root);
                }
                run_clean(request, yes, json, output_mode)
            }
            Commands::Config { show, path } => {
                print!("{}", config_report(show, path)?);
                Ok(())
            }
        }
    }
}

/// `--path` prints only the location, `--show` only the TOML, neither prints both.
fn config_report(show: bool, path: bool) -> anyhow::Result<String> {
    let location = Config::config_path()?;
    if path {
        return Ok(format!("{}\n", location.display()));
    }
    let toml = Config::load().to_toml()?;
    if show {
        return Ok(toml);
    }
    Ok(format!("# {}\n{}", location.display(), toml))
}

fn run_scan(target: ScanTarget, args: ScanArgs, mode: OutputMode) -> anyhow::Result<()> {
    let mut config = Config::load();
    config.apply_cli_overrides(args.threads, args.follow_symlinks, args.min_size.clone());
    let min_size = config.min_size_bytes()?;
    let large_min_size = config.large_file_min_size_bytes()?;

    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir().context("failed to determine the current directory")?,
    };
    let scanner = Scanner::from_config(&config);
    let request = ScanRequest::new(&root)
        .min_size(min_size)
        .follow_symlinks(config.scan.follow_symlinks);
    let large_request = request.clone().min_size(large_min_size);
    let cancel = CancelToken::new();

    let spinner = progress::create_spinner(
        &format!("Scanning {}", root.display()),
        !args.json && mode != OutputMode::Quiet,
    );
    let scanned = scan_target(&scanner, target, &request, &large_request, &cancel);
    progress::finish_and_clear(&spinner);
    let report = scanned.with_context(|| format!("scan of {} failed", root.display()))?;

    if args.json {
        return report.print_json(target);
    }
    match report {
        ScanOutput::Categories(title, summaries) => output::print_categories(title, &summaries, mode),
        ScanOutput::Large(files) => output::print_large_files(&files, mode),
        ScanOutput::Duplicates(sets) => output::print_duplicates(&sets, mode),
        ScanOutput::Git(repos) => output::print_git_repos(&repos, mode),
        ScanOutput::All(report) => output::print_full_report(&report, mode),
    }
    Ok(())
}

enum ScanOutput {
    Categories(&'static str, Vec<crate::model::CategorySummary>),
    Large(Vec<crate::model::FileRecord>),
    Duplicates(Vec<crate::model::DuplicateSet>),
    Git(Vec<crate::model::GitRepoSummary>),
    All(Box<FullReport>),
}

impl ScanOutput {
    fn print_json(&self, target: ScanTarget) -> anyhow::Result<()> {
        let kind = target
            .to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default();
        match self {
            ScanOutput::Categories(_, summaries) => output::print_json(&kind, summaries),
            ScanOutput::Large(files) => output::print_json(&kind, files),
            ScanOutput::Duplicates(sets) => output::print_json(&kind, sets),
            ScanOutput::Git(repos) => output::print_json(&kind, repos),
            ScanOutput::All(report) => output::print_json(&kind, report),
        }
    }
}

fn scan_target(
    scanner: &Scanner,
    target: ScanTarget,
    request: &ScanRequest,
    large_request: &ScanRequest,
    cancel: &CancelToken,
) -> crate::error::Result<ScanOutput> {
    Ok(match target {
        ScanTarget::Bloat => {
            ScanOutput::Categories("Build bloat", scanner.scan_bloat(request, cancel)?)
        }
        ScanTarget::Junk => {
            ScanOutput::Categories("Junk files", scanner.scan_junk_files(request, cancel)?)
        }
        ScanTarget::DevCaches => ScanOutput::Categories(
            "Developer caches",
            scanner.scan_dev_caches(request, cancel)?,
        ),
        ScanTarget::Large => ScanOutput::Large(scanner.scan_large_files(large_request, cancel)?),
        ScanTarget::Duplicates => {
            ScanOutput::Duplicates(scanner.scan_duplicates(request, cancel)?)
        }
        ScanTarget::Git => ScanOutput::Git(scanner.scan_git_repos(request, cancel)?),
        ScanTarget::All => ScanOutput::All(Box::new(FullReport {
            categories: scanner.classify(request, cancel)?,
            large_files: scanner.scan_large_files(large_request, cancel)?,
            duplicates: scanner.scan_duplicates(request, cancel)?,
            git_repos: scanner.scan_git_repos(request, cancel)?,
        })),
    })
}

fn run_clean(
    request: CleanupRequest,
    yes: bool,
    json: bool,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let engine = CleanupEngine::new();
    let total = engine.validate(&request)?;

    if !request.dry_run && !yes {
        let action = if request.use_trash {
            "Move to the trash"
        } else {
            "Permanently delete"
        };
        eprint!(
            "{} {} paths ({})? [y/N]: ",
            action,
            request.paths.len(),
            output::human_size(total)
        );
        let input = match read_line_from_stdin() {
            Ok(line) => line.trim().to_lowercase(),
            Err(_) => {
                // If reading fails (e.g., stdin is not available), default to "no"
                eprintln!("\nCleanup cancelled (failed to read input).");
                return Ok(());
            }
        };
        if input != "y" && input != "yes" {
            eprintln!("Cleanup cancelled.");
            return Ok(());
        }
    }

    let result = engine.cleanup(&request)?;
    if json {
        output::print_json("cleanup", &result)?;
    } else {
        if request.dry_run && mode != OutputMode::Quiet {
            println!("{}", Theme::warning("DRY RUN MODE - No changes were made"));
        }
        output::print_cleanup(&result, request.dry_run, mode);
    }

    if !result.errors.is_empty() {
        bail!("{} of {} paths could not be deleted", result.errors.len(), result.total());
    }
    Ok(())
}
