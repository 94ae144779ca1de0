use super::{CategoryMatch, MatchKind};
use crate::model::Safety;
use crate::utils;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use lazy_static::lazy_static;
use std::path::Path;

/// A junk file pattern, matched against the file name only.
#[derive(Debug, Clone, Copy)]
pub struct JunkRule {
    pub pattern: &'static str,
    pub category_id: &'static str,
    pub description: &'static str,
    pub safety: Safety,
}

const fn rule(
    pattern: &'static str,
    category_id: &'static str,
    description: &'static str,
    safety: Safety,
) -> JunkRule {
    JunkRule {
        pattern,
        category_id,
        description,
        safety,
    }
}

/// Evaluated in order; the first match wins. Crash dumps come before the
/// generic `*.log` rule so `hs_err_pid*.log` lands in the right bucket.
pub const JUNK_RULES: &[JunkRule] = &[
    rule("*.dmp", "crash_dumps", "Crash dumps", Safety::Safe),
    rule("*.stackdump", "crash_dumps", "Crash dumps", Safety::Safe),
    rule("hs_err_pid*.log", "crash_dumps", "Crash dumps", Safety::Safe),
    rule("npm-debug.log*", "logs", "Log files", Safety::Safe),
    rule("yarn-error.log*", "logs", "Log files", Safety::Safe),
    rule("*.log", "logs", "Log files", Safety::Safe),
    rule("*.tmp", "temp", "Temporary files", Safety::Safe),
    rule("*.temp", "temp", "Temporary files", Safety::Safe),
    rule("~$*", "temp", "Temporary files", Safety::Caution),
    rule("*.bak", "backups", "Backup files", Safety::Caution),
    rule("*.old", "backups", "Backup files", Safety::Caution),
    rule("*.orig", "backups", "Backup files", Safety::Caution),
    rule("*~", "backups", "Backup files", Safety::Caution),
    rule("*.swp", "editor_swap", "Editor swap files", Safety::Caution),
    rule("*.swo", "editor_swap", "Editor swap files", Safety::Caution),
    rule(".~lock.*#", "editor_swap", "Editor swap files", Safety::Caution),
    rule(".DS_Store", "os_metadata", "OS metadata", Safety::Safe),
    rule("Thumbs.db", "os_metadata", "OS metadata", Safety::Safe),
    rule("ehthumbs.db", "os_metadata", "OS metadata", Safety::Safe),
    rule("desktop.ini", "os_metadata", "OS metadata", Safety::Safe),
    rule("._*", "os_metadata", "OS metadata", Safety::Safe),
    rule("*.pyc", "python_bytecode", "Python bytecode", Safety::Safe),
    rule("*.pyo", "python_bytecode", "Python bytecode", Safety::Safe),
    rule("*.rej", "patch_leftovers", "Patch leftovers", Safety::Caution),
];

struct CompiledRules {
    set: GlobSet,
    /// Maps a glob index in `set` back to its rule.
    rules: Vec<&'static JunkRule>,
}

lazy_static! {
    static ref COMPILED: CompiledRules = compile(JUNK_RULES);
}

fn compile(table: &'static [JunkRule]) -> CompiledRules {
    let mut builder = GlobSetBuilder::new();
    let mut rules = Vec::with_capacity(table.len());
    for rule in table {
        match GlobBuilder::new(rule.pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
        {
            Ok(glob) => {
                builder.add(glob);
                rules.push(rule);
            }
            Err(err) => tracing::warn!(pattern = rule.pattern, %err, "skipping invalid junk pattern"),
        }
    }
    let set = builder.build().unwrap_or_else(|err| {
        tracing::warn!(%err, "junk patterns failed to compile");
        GlobSet::empty()
    });
    CompiledRules { set, rules }
}

/// Match a file against the junk table by name.
pub fn match_file(path: &Path) -> Option<CategoryMatch> {
    let name = utils::file_name_str(path);
    if name.is_empty() {
        return None;
    }
    let first = COMPILED.set.matches(name).into_iter().min()?;
    let rule = COMPILED.rules.get(first)?;
    Some(CategoryMatch::new(
        MatchKind::Junk,
        rule.category_id,
        rule.description,
        rule.safety,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str) -> Option<String> {
        match_file(Path::new("/p").join(name).as_path()).map(|m| m.category_id)
    }

    #[test]
    fn test_common_junk() {
        assert_eq!(category("debug.log").as_deref(), Some("logs"));
        assert_eq!(category("npm-debug.log.123").as_deref(), Some("logs"));
        assert_eq!(category(".DS_Store").as_deref(), Some("os_metadata"));
        assert_eq!(category("thumbs.db").as_deref(), Some("os_metadata"));
        assert_eq!(category("notes.txt~").as_deref(), Some("backups"));
        assert_eq!(category(".~lock.report.odt#").as_deref(), Some("editor_swap"));
        assert_eq!(category("~$budget.xlsx").as_deref(), Some("temp"));
        assert_eq!(category("mod.cpython-311.pyc").as_deref(), Some("python_bytecode"));
    }

    #[test]
    fn test_first_rule_wins() {
        assert_eq!(category("hs_err_pid4242.log").as_deref(), Some("crash_dumps"));
    }

    #[test]
    fn test_non_junk() {
        assert!(category("main.rs").is_none());
        assert!(category("logbook.txt").is_none());
        assert!(category("Cargo.lock").is_none());
    }

    #[test]
    fn test_every_rule_compiles() {
        assert_eq!(COMPILED.rules.len(), JUNK_RULES.len());
    }
}
