//! Human and JSON rendering of scan and cleanup results.
//!
//! Renderers build strings; the `print_*` wrappers write them to stdout.

use crate::classifier::Classification;
use crate::model::{
    CategorySummary, CleanupResult, DuplicateSet, FileRecord, GitRepoSummary, Safety,
};
use crate::theme::Theme;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

const PATH_WIDTH: usize = 60;
const TABLE_WIDTH: usize = 72;

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,       // Only errors
    Normal,      // Standard output
    Verbose,     // More details
    VeryVerbose, // Every entry
}

impl OutputMode {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => OutputMode::Quiet,
            (false, 0) => OutputMode::Normal,
            (false, 1) => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    /// How many detail rows to show under a heading.
    fn detail_rows(self, normal: usize, verbose: usize) -> usize {
        match self {
            OutputMode::Quiet => 0,
            OutputMode::Normal => normal,
            OutputMode::Verbose => verbose,
            OutputMode::VeryVerbose => usize::MAX,
        }
    }
}

pub fn human_size(bytes: u64) -> String {
    bytesize::to_string(bytes, false)
}

/// Shorten a path from the left so the file name stays visible.
fn display_path(path: &Path, width: usize) -> String {
    let text = path.display().to_string();
    let len = text.chars().count();
    if len <= width {
        return text;
    }
    let keep = width.saturating_sub(3);
    let tail: String = text.chars().skip(len - keep).collect();
    format!("...{tail}")
}

fn push_heading(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", Theme::header(title));
    let _ = writeln!(out, "{}", Theme::divider_bold(TABLE_WIDTH));
}

fn push_more(out: &mut String, hidden: usize) {
    if hidden > 0 {
        let _ = writeln!(
            out,
            "    {}",
            Theme::muted(&format!("... and {hidden} more (use -v to see more)"))
        );
    }
}

pub fn render_categories(title: &str, summaries: &[CategorySummary], mode: OutputMode) -> String {
    let mut out = String::new();
    if mode == OutputMode::Quiet {
        return out;
    }
    push_heading(&mut out, title);
    if summaries.is_empty() {
        let _ = writeln!(out, "{}", Theme::muted("Nothing found."));
        return out;
    }

    let _ = writeln!(
        out,
        "{:<32} {:>7} {:>12}  {}",
        Theme::primary("Category"),
        Theme::primary("Items"),
        Theme::primary("Size"),
        Theme::primary("Safety")
    );
    let _ = writeln!(out, "{}", Theme::divider(TABLE_WIDTH));

    let rows = mode.detail_rows(0, 5);
    for summary in summaries {
        let _ = writeln!(
            out,
            "{:<32} {:>7} {:>12}  {}",
            summary.display_name,
            summary.items(),
            Theme::size(&human_size(summary.total_size)),
            Theme::safety(summary.safety)
        );
        for entry in summary.entries.iter().take(rows) {
            let _ = writeln!(
                out,
                "    {:>10}  {}",
                human_size(entry.size_bytes),
                Theme::muted(&display_path(&entry.path, PATH_WIDTH))
            );
        }
        if rows > 0 {
            push_more(&mut out, summary.entries.len().saturating_sub(rows));
        }
    }

    let total: u64 = summaries.iter().map(|s| s.total_size).sum();
    let items: usize = summaries.iter().map(CategorySummary::items).sum();
    let _ = writeln!(out, "{}", Theme::divider(TABLE_WIDTH));
    let _ = writeln!(
        out,
        "{:<32} {:>7} {:>12}",
        Theme::value("Total"),
        items,
        Theme::size(&human_size(total))
    );
    out
}

pub fn render_large_files(files: &[FileRecord], mode: OutputMode) -> String {
    let mut out = String::new();
    if mode == OutputMode::Quiet {
        return out;
    }
    push_heading(&mut out, "Large files");
    if files.is_empty() {
        let _ = writeln!(out, "{}", Theme::muted("Nothing found."));
        return out;
    }

    let rows = mode.detail_rows(20, 100);
    for file in files.iter().take(rows) {
        let modified = file
            .modified_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:>12}  {:<10}  {}",
            Theme::size(&human_size(file.size_bytes)),
            modified,
            display_path(&file.path, PATH_WIDTH)
        );
    }
    push_more(&mut out, files.len().saturating_sub(rows));

    let total: u64 = files.iter().map(|f| f.size_bytes).sum();
    let _ = writeln!(
        out,
        "{} files, {}",
        Theme::value(&files.len().to_string()),
        Theme::size(&human_size(total))
    );
    out
}

pub fn render_duplicates(sets: &[DuplicateSet], mode: OutputMode) -> String {
    let mut out = String::new();
    if mode == OutputMode::Quiet {
        return out;
    }
    push_heading(&mut out, "Duplicate files");
    if sets.is_empty() {
        let _ = writeln!(out, "{}", Theme::muted("No duplicates found."));
        return out;
    }

    let rows = mode.detail_rows(10, 50);
    for set in sets.iter().take(rows) {
        let _ = writeln!(
            out,
            "{} x {}  reclaimable {}  {}",
            set.members.len(),
            human_size(set.file_size),
            Theme::size(&human_size(set.reclaimable_bytes())),
            Theme::muted(&set.content_hash[..set.content_hash.len().min(12)])
        );
        for member in &set.members {
            let _ = writeln!(out, "    {}", display_path(member, PATH_WIDTH));
        }
    }
    push_more(&mut out, sets.len().saturating_sub(rows));

    let total: u64 = sets.iter().map(DuplicateSet::reclaimable_bytes).sum();
    let _ = writeln!(
        out,
        "{} sets, {} reclaimable",
        Theme::value(&sets.len().to_string()),
        Theme::size(&human_size(total))
    );
    out
}

pub fn render_git_repos(repos: &[GitRepoSummary], mode: OutputMode) -> String {
    let mut out = String::new();
    if mode == OutputMode::Quiet {
        return out;
    }
    push_heading(&mut out, "Git repositories");
    if repos.is_empty() {
        let _ = writeln!(out, "{}", Theme::muted("No repositories found."));
        return out;
    }

    let rows = mode.detail_rows(3, 15);
    for repo in repos {
        let lock = if repo.lock_held {
            format!("  {}", Theme::warning("[locked]"))
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "{:>12}  {}{}",
            Theme::size(&human_size(repo.total_size)),
            display_path(&repo.repo_path, PATH_WIDTH),
            lock
        );

        let mut shown: Vec<_> = repo.entries.iter().collect();
        if mode == OutputMode::Normal {
            shown.retain(|e| e.actionable || e.safety == Safety::Safe);
        }
        for entry in shown.iter().take(rows) {
            let name = entry
                .entry_path
                .strip_prefix(&repo.repo_path)
                .unwrap_or(&entry.entry_path);
            let _ = writeln!(
                out,
                "    {:>10}  {:<10} {:<9} {}",
                human_size(entry.size_bytes),
                entry.entry_type.as_str(),
                Theme::safety(entry.safety),
                Theme::muted(&display_path(name, PATH_WIDTH - 24))
            );
            if let Some(rec) = &entry.recommendation {
                let _ = writeln!(out, "{:>28}{}", "", Theme::command(rec));
            }
        }
        push_more(&mut out, shown.len().saturating_sub(rows));
    }
    out
}

pub fn render_cleanup(result: &CleanupResult, dry_run: bool, mode: OutputMode) -> String {
    let mut out = String::new();
    let verb = if dry_run { "Would delete" } else { "Deleted" };
    if mode != OutputMode::Quiet {
        let rows = mode.detail_rows(0, 50);
        for path in result.deleted.iter().take(rows) {
            let _ = writeln!(out, "  {} {}", Theme::success(verb), path.display());
        }
        for path in result.skipped.iter().take(rows) {
            let _ = writeln!(out, "  {} {}", Theme::muted("Skipped"), path.display());
        }
        let _ = writeln!(
            out,
            "{}: {}, skipped: {}, failed: {}",
            verb,
            Theme::value(&result.deleted.len().to_string()),
            result.skipped.len(),
            result.errors.len()
        );
    }
    // Failures are shown even in quiet mode.
    for failure in &result.errors {
        let _ = writeln!(
            out,
            "  {} {}: {}",
            Theme::error("Failed"),
            failure.path.display(),
            failure.reason
        );
    }
    out
}

pub fn print_categories(title: &str, summaries: &[CategorySummary], mode: OutputMode) {
    print!("{}", render_categories(title, summaries, mode));
}

pub fn print_large_files(files: &[FileRecord], mode: OutputMode) {
    print!("{}", render_large_files(files, mode));
}

pub fn print_duplicates(sets: &[DuplicateSet], mode: OutputMode) {
    print!("{}", render_duplicates(sets, mode));
}

pub fn print_git_repos(repos: &[GitRepoSummary], mode: OutputMode) {
    print!("{}", render_git_repos(repos, mode));
}

pub fn print_cleanup(result: &CleanupResult, dry_run: bool, mode: OutputMode) {
    print!("{}", render_cleanup(result, dry_run, mode));
}

/// Results of `scan all`.
#[derive(Debug, Default, Serialize)]
pub struct FullReport {
    #[serde(flatten)]
    pub categories: Classification,
    pub large_files: Vec<FileRecord>,
    pub duplicates: Vec<DuplicateSet>,
    pub git_repos: Vec<GitRepoSummary>,
}

pub fn print_full_report(report: &FullReport, mode: OutputMode) {
    print_categories("Build bloat", &report.categories.bloat, mode);
    print_categories("Junk files", &report.categories.junk, mode);
    print_categories("Developer caches", &report.categories.dev_caches, mode);
    print_large_files(&report.large_files, mode);
    print_duplicates(&report.duplicates, mode);
    print_git_repos(&report.git_repos, mode);
}

#[derive(Serialize)]
struct JsonEnvelope<'a, T: Serialize> {
    version: &'static str,
    timestamp: String,
    kind: &'a str,
    results: &'a T,
}

pub fn render_json<T: Serialize>(kind: &str, results: &T) -> anyhow::Result<String> {
    let envelope = JsonEnvelope {
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        kind,
        results,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

pub fn print_json<T: Serialize>(kind: &str, results: &T) -> anyhow::Result<()> {
    println!("{}", render_json(kind, results)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryEntry, CleanupFailure, FailureKind};
    use std::path::PathBuf;

    fn summary() -> CategorySummary {
        CategorySummary {
            category_id: "node_modules".to_string(),
            display_name: "node_modules (Node.js)".to_string(),
            entries: vec![CategoryEntry {
                category_id: "node_modules".to_string(),
                display_name: "node_modules (Node.js)".to_string(),
                path: PathBuf::from("/p/app/node_modules"),
                size_bytes: 2048,
                safety: Safety::Safe,
            }],
            total_size: 2048,
            safety: Safety::Safe,
        }
    }

    #[test]
    fn test_output_mode_from_flags() {
        assert_eq!(OutputMode::from_flags(0, true), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(0, false), OutputMode::Normal);
        assert_eq!(OutputMode::from_flags(1, false), OutputMode::Verbose);
        assert_eq!(OutputMode::from_flags(3, false), OutputMode::VeryVerbose);
    }

    #[test]
    fn test_display_path_keeps_tail() {
        let long = PathBuf::from(format!("/{}/file.bin", "a".repeat(100)));
        let shown = display_path(&long, 20);
        assert_eq!(shown.chars().count(), 20);
        assert!(shown.starts_with("..."));
        assert!(shown.ends_with("file.bin"));
        assert_eq!(display_path(Path::new("/short"), 20), "/short");
    }

    #[test]
    fn test_render_categories() {
        colored::control::set_override(false);
        let text = render_categories("Build bloat", &[summary()], OutputMode::Normal);
        assert!(text.contains("node_modules (Node.js)"));
        assert!(text.contains("2.0 KB"));
        assert!(!text.contains("/p/app/node_modules"));

        let verbose = render_categories("Build bloat", &[summary()], OutputMode::Verbose);
        assert!(verbose.contains("/p/app/node_modules"));
        assert!(render_categories("Build bloat", &[summary()], OutputMode::Quiet).is_empty());
    }

    #[test]
    fn test_render_cleanup_quiet_still_shows_failures() {
        let result = CleanupResult {
            deleted: vec![PathBuf::from("/a")],
            skipped: Vec::new(),
            errors: vec![CleanupFailure {
                path: PathBuf::from("/b"),
                kind: FailureKind::Io,
                reason: "boom".to_string(),
            }],
        };
        let text = render_cleanup(&result, false, OutputMode::Quiet);
        assert!(text.contains("boom"));
        assert!(!text.contains("/a"));
    }

    #[test]
    fn test_render_json_envelope() {
        let text = render_json("bloat", &vec![summary()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["kind"], "bloat");
        assert_eq!(value["results"][0]["total_size"], 2048);
        assert_eq!(value["results"][0]["safety"], "safe");
    }
}
