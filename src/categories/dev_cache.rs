use super::{CategoryMatch, MatchKind};
use crate::model::Safety;
use std::path::{Component, Path};

/// Package manager and toolchain cache locations.
///
/// Each entry is `(category_id, display name, safety, trailing path components)`.
/// A directory matches when its last components equal the suffix, ignoring
/// ASCII case, so the same table works under any home or profile directory.
const CACHE_LOCATIONS: &[(&str, &str, Safety, &[&str])] = &[
    ("npm", "npm cache", Safety::Safe, &[".npm", "_cacache"]),
    ("npm", "npm cache", Safety::Safe, &["AppData", "Local", "npm-cache"]),
    ("yarn", "Yarn cache", Safety::Safe, &[".cache", "yarn"]),
    ("yarn", "Yarn cache", Safety::Safe, &["Library", "Caches", "Yarn"]),
    ("yarn", "Yarn cache", Safety::Safe, &["AppData", "Local", "Yarn", "Cache"]),
    ("yarn", "Yarn cache", Safety::Safe, &[".yarn", "berry", "cache"]),
    ("pnpm", "pnpm store", Safety::Safe, &[".pnpm-store"]),
    ("pnpm", "pnpm store", Safety::Safe, &[".local", "share", "pnpm", "store"]),
    ("pnpm", "pnpm store", Safety::Safe, &["AppData", "Local", "pnpm-store"]),
    ("bun", "Bun cache", Safety::Safe, &[".bun", "install", "cache"]),
    ("deno", "Deno cache", Safety::Safe, &[".cache", "deno"]),
    ("node_gyp", "node-gyp headers", Safety::Safe, &[".cache", "node-gyp"]),
    ("electron", "Electron downloads", Safety::Safe, &[".cache", "electron"]),
    ("playwright", "Playwright browsers", Safety::Safe, &[".cache", "ms-playwright"]),
    ("pip", "pip cache", Safety::Safe, &[".cache", "pip"]),
    ("pip", "pip cache", Safety::Safe, &["Library", "Caches", "pip"]),
    ("pip", "pip cache", Safety::Safe, &["AppData", "Local", "pip", "cache"]),
    ("pre_commit", "pre-commit environments", Safety::Safe, &[".cache", "pre-commit"]),
    ("huggingface", "Hugging Face models", Safety::Caution, &[".cache", "huggingface"]),
    ("cargo", "Cargo registry", Safety::Safe, &[".cargo", "registry"]),
    ("cargo", "Cargo git checkouts", Safety::Safe, &[".cargo", "git"]),
    ("go_build", "Go build cache", Safety::Safe, &[".cache", "go-build"]),
    ("go_build", "Go build cache", Safety::Safe, &["Library", "Caches", "go-build"]),
    ("go_modules", "Go module cache", Safety::Caution, &["go", "pkg", "mod"]),
    ("maven", "Maven repository", Safety::Caution, &[".m2", "repository"]),
    ("gradle", "Gradle caches", Safety::Safe, &[".gradle", "caches"]),
    ("gradle", "Gradle wrappers", Safety::Safe, &[".gradle", "wrapper", "dists"]),
    ("ivy", "Ivy cache", Safety::Safe, &[".ivy2", "cache"]),
    ("nuget", "NuGet packages", Safety::Safe, &[".nuget", "packages"]),
    ("nuget", "NuGet cache", Safety::Safe, &["AppData", "Local", "NuGet", "v3-cache"]),
    ("composer", "Composer cache", Safety::Safe, &[".composer", "cache"]),
    ("composer", "Composer cache", Safety::Safe, &[".cache", "composer"]),
    ("bundler", "Bundler cache", Safety::Safe, &[".bundle", "cache"]),
    ("pub", "Dart pub cache", Safety::Safe, &[".pub-cache"]),
    ("bazel", "Bazel cache", Safety::Caution, &[".cache", "bazel"]),
    ("jetbrains", "JetBrains caches", Safety::Caution, &[".cache", "JetBrains"]),
    ("jetbrains", "JetBrains caches", Safety::Caution, &["Library", "Caches", "JetBrains"]),
    ("homebrew", "Homebrew downloads", Safety::Safe, &["Library", "Caches", "Homebrew"]),
    (
        "xcode",
        "Xcode DerivedData",
        Safety::Safe,
        &["Library", "Developer", "Xcode", "DerivedData"],
    ),
    (
        "xcode",
        "Xcode device support",
        Safety::Caution,
        &["Library", "Developer", "Xcode", "iOS DeviceSupport"],
    ),
    (
        "xcode",
        "Simulator caches",
        Safety::Safe,
        &["Library", "Developer", "CoreSimulator", "Caches"],
    ),
];

/// Match a directory against the known cache locations.
pub fn match_dir(path: &Path) -> Option<CategoryMatch> {
    let components: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    CACHE_LOCATIONS
        .iter()
        .find(|(_, _, _, suffix)| ends_with_ignore_case(&components, suffix))
        .map(|(id, name, safety, _)| CategoryMatch::new(MatchKind::DevCache, *id, *name, *safety))
}

fn ends_with_ignore_case(components: &[&str], suffix: &[&str]) -> bool {
    if suffix.len() > components.len() {
        return false;
    }
    components[components.len() - suffix.len()..]
        .iter()
        .zip(suffix)
        .all(|(a, b)| a.eq_ignore_ascii_case(b))
}
