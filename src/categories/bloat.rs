use super::{CategoryMatch, MatchKind};
use crate::model::Safety;
use crate::utils;
use globset::{Glob, GlobSet, GlobSetBuilder};
use lazy_static::lazy_static;
use std::path::Path;

/// A build-tool output directory, matched by basename.
#[derive(Debug, Clone, Copy)]
pub struct BloatRule {
    pub dir_name: &'static str,
    pub category_id: &'static str,
    pub ecosystem: &'static str,
    pub safety: Safety,
    /// Sibling files proving the parent is a project of this ecosystem.
    /// Empty for names that are unambiguous on their own. Entries are globs.
    pub markers: &'static [&'static str],
}

const fn rule(
    dir_name: &'static str,
    category_id: &'static str,
    ecosystem: &'static str,
    safety: Safety,
    markers: &'static [&'static str],
) -> BloatRule {
    BloatRule {
        dir_name,
        category_id,
        ecosystem,
        safety,
        markers,
    }
}

const PYTHON_MARKERS: &[&str] = &[
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "requirements.txt",
    "Pipfile",
    "poetry.lock",
];
const DOTNET_MARKERS: &[&str] = &["*.csproj", "*.fsproj", "*.vbproj", "*.sln"];
const GRADLE_MARKERS: &[&str] = &[
    "build.gradle",
    "build.gradle.kts",
    "settings.gradle",
    "settings.gradle.kts",
];

/// Default build artifact directories to detect
pub const BLOAT_RULES: &[BloatRule] = &[
    rule("node_modules", "node_modules", "Node.js", Safety::Safe, &[]),
    rule("bower_components", "bower_components", "Bower", Safety::Safe, &[]),
    rule(".next", "nextjs", "Next.js", Safety::Safe, &[]),
    rule(".nuxt", "nuxt", "Nuxt", Safety::Safe, &[]),
    rule(".svelte-kit", "sveltekit", "SvelteKit", Safety::Safe, &[]),
    rule(".angular", "angular", "Angular", Safety::Safe, &[]),
    rule(".turbo", "turbo", "Turborepo", Safety::Safe, &[]),
    rule(".parcel-cache", "parcel", "Parcel", Safety::Safe, &[]),
    rule(".nyc_output", "coverage", "Coverage", Safety::Safe, &[]),
    rule("coverage", "coverage", "Coverage", Safety::Safe, &["package.json"]),
    rule("__pycache__", "pycache", "Python", Safety::Safe, &[]),
    rule(".pytest_cache", "pytest_cache", "pytest", Safety::Safe, &[]),
    rule(".mypy_cache", "mypy_cache", "mypy", Safety::Safe, &[]),
    rule(".ruff_cache", "ruff_cache", "Ruff", Safety::Safe, &[]),
    rule(".tox", "tox", "tox", Safety::Safe, &[]),
    rule(".venv", "python_venv", "Python virtualenv", Safety::Caution, PYTHON_MARKERS),
    rule("venv", "python_venv", "Python virtualenv", Safety::Caution, PYTHON_MARKERS),
    rule("target", "target", "Rust", Safety::Safe, &["Cargo.toml"]),
    rule("target", "target", "Maven", Safety::Safe, &["pom.xml"]),
    rule(".gradle", "gradle", "Gradle", Safety::Safe, GRADLE_MARKERS),
    rule("build", "build", "Gradle", Safety::Safe, GRADLE_MARKERS),
    rule("build", "build", "CMake", Safety::Safe, &["CMakeLists.txt"]),
    rule("build", "build", "JavaScript", Safety::Safe, &["package.json"]),
    rule("build", "build", "Python", Safety::Safe, &["setup.py", "pyproject.toml"]),
    rule("build", "build", "Flutter", Safety::Safe, &["pubspec.yaml"]),
    rule("dist", "dist", "JavaScript", Safety::Safe, &["package.json"]),
    rule("dist", "dist", "Python", Safety::Safe, &["setup.py", "pyproject.toml"]),
    rule("bin", "dotnet_build", ".NET", Safety::Safe, DOTNET_MARKERS),
    rule("obj", "dotnet_build", ".NET", Safety::Safe, DOTNET_MARKERS),
    rule("vendor", "vendor", "Go", Safety::Caution, &["go.mod"]),
    rule("vendor", "vendor", "PHP", Safety::Caution, &["composer.json"]),
    rule("Pods", "cocoapods", "CocoaPods", Safety::Safe, &["Podfile"]),
    rule("DerivedData", "xcode_derived_data", "Xcode", Safety::Safe, &[]),
    rule(".dart_tool", "dart_tool", "Dart", Safety::Safe, &[]),
    rule(".stack-work", "stack_work", "Haskell Stack", Safety::Safe, &[]),
    rule("_build", "elixir_build", "Elixir", Safety::Safe, &["mix.exs"]),
    rule("deps", "elixir_deps", "Elixir", Safety::Caution, &["mix.exs"]),
    rule(".terraform", "terraform", "Terraform", Safety::Caution, &[]),
    rule("elm-stuff", "elm_stuff", "Elm", Safety::Safe, &[]),
    rule(".zig-cache", "zig_cache", "Zig", Safety::Safe, &[]),
    rule("zig-cache", "zig_cache", "Zig", Safety::Safe, &[]),
];

/// Bloat matcher: the built-in table plus any `[bloat] extra_dirs` from config.
#[derive(Debug, Clone, Default)]
pub struct BloatMatcher {
    extra_dirs: Vec<String>,
}

impl BloatMatcher {
    pub fn new(extra_dirs: Vec<String>) -> Self {
        let mut extra: Vec<String> = Vec::new();
        for name in extra_dirs {
            let name = name.trim().to_string();
            if !name.is_empty() && !extra.contains(&name) {
                extra.push(name);
            }
        }
        Self { extra_dirs: extra }
    }

    /// Match a directory by basename. Marker files are looked up next to it.
    pub fn match_dir(&self, path: &Path) -> Option<CategoryMatch> {
        let name = utils::file_name_str(path);
        if name.is_empty() {
            return None;
        }
        let parent = path.parent()?;

        let found = BLOAT_RULES
            .iter()
            .zip(MARKER_SETS.iter())
            .filter(|(r, _)| r.dir_name == name)
            .find(|(r, set)| r.markers.is_empty() || has_any_marker(parent, set))
            .map(|(r, _)| r);
        if let Some(rule) = found {
            return Some(CategoryMatch::new(
                MatchKind::Bloat,
                rule.category_id,
                format!("{} ({})", rule.dir_name, rule.ecosystem),
                rule.safety,
            ));
        }

        self.extra_dirs.iter().find(|d| d.as_str() == name).map(|d| {
            CategoryMatch::new(MatchKind::Bloat, d.clone(), d.clone(), Safety::Caution)
        })
    }
}

lazy_static! {
    /// Marker globs per rule, indexed like `BLOAT_RULES`.
    static ref MARKER_SETS: Vec<GlobSet> = BLOAT_RULES
        .iter()
        .map(|r| compile_markers(r.markers))
        .collect();
}

fn compile_markers(markers: &[&str]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for marker in markers {
        match Glob::new(marker) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => tracing::warn!(marker, %err, "skipping invalid bloat marker"),
        }
    }
    builder.build().unwrap_or_else(|err| {
        tracing::warn!(%err, "bloat markers failed to compile");
        GlobSet::empty()
    })
}

fn has_any_marker(dir: &Path, markers: &GlobSet) -> bool {
    if markers.is_empty() {
        return false;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries
        .flatten()
        .any(|entry| markers.is_match(entry.file_name()) && entry.path().is_file())
}
