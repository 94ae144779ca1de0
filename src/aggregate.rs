//! Deterministic shaping of unordered scan output.
//!
//! Workers emit in no particular order; everything here sorts by a
//! tie-breaker first and then stably by size, largest first.

use crate::model::{
    CategoryEntry, CategorySummary, DuplicateSet, FileRecord, GitRepoEntry, GitRepoSummary,
    GitEntryType, Safety,
};
use crate::size::{bytes_to_mb, sort_by_size_desc};
use std::collections::BTreeMap;

/// Group entries by category id into summaries.
pub fn summarize(entries: Vec<CategoryEntry>) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<String, Vec<CategoryEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.category_id.clone()).or_default().push(entry);
    }

    let mut summaries: Vec<CategorySummary> = groups
        .into_iter()
        .map(|(category_id, mut entries)| {
            entries.sort_by(|a, b| a.path.cmp(&b.path));
            // Display name comes from the first path so it does not depend on worker order.
            let display_name = entries
                .first()
                .map(|e| e.display_name.clone())
                .unwrap_or_else(|| category_id.clone());
            sort_by_size_desc(&mut entries, |e| bytes_to_mb(e.size_bytes));

            let total_size = entries.iter().map(|e| e.size_bytes).sum();
            let safety = entries
                .iter()
                .map(|e| e.safety)
                .max()
                .unwrap_or(Safety::Safe);
            CategorySummary {
                category_id,
                display_name,
                entries,
                total_size,
                safety,
            }
        })
        .collect();

    // BTreeMap order already breaks ties by category id.
    sort_by_size_desc(&mut summaries, |s| bytes_to_mb(s.total_size));
    summaries
}

pub fn sort_files(files: &mut [FileRecord]) {
    files.sort_by(|a, b| a.path.cmp(&b.path));
    sort_by_size_desc(files, |f| bytes_to_mb(f.size_bytes));
}

/// Sort members by path and sets by reclaimable bytes, then hash.
pub fn sort_duplicate_sets(sets: &mut [DuplicateSet]) {
    for set in sets.iter_mut() {
        set.members.sort();
    }
    sets.sort_by(|a, b| a.content_hash.cmp(&b.content_hash));
    sort_by_size_desc(sets, |s| bytes_to_mb(s.reclaimable_bytes()));
}

/// Build a repository summary, sorting entries and computing the total.
///
/// Large-blob entries describe data already counted in pack and loose
/// object files, so they do not contribute to `total_size`.
pub fn git_summary(
    repo_path: std::path::PathBuf,
    mut entries: Vec<GitRepoEntry>,
    lock_held: bool,
) -> GitRepoSummary {
    entries.sort_by(|a, b| {
        a.entry_path
            .cmp(&b.entry_path)
            .then_with(|| a.recommendation.cmp(&b.recommendation))
    });
    sort_by_size_desc(&mut entries, |e| bytes_to_mb(e.size_bytes));
    let total_size = entries
        .iter()
        .filter(|e| e.entry_type != GitEntryType::LargeTrackedFile)
        .map(|e| e.size_bytes)
        .sum();
    GitRepoSummary {
        repo_path,
        entries,
        total_size,
        lock_held,
    }
}

pub fn sort_git_repos(repos: &mut [GitRepoSummary]) {
    repos.sort_by(|a, b| a.repo_path.cmp(&b.repo_path));
    sort_by_size_desc(repos, |r| bytes_to_mb(r.total_size));
}
