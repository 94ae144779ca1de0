use crate::size::parse_size;
use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub exclusions: Exclusions,

    #[serde(default)]
    pub bloat: BloatConfig,

    #[serde(default)]
    pub git: GitConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Worker threads; 0 means one per CPU.
    #[serde(default)]
    pub threads: usize,

    #[serde(default)]
    pub follow_symlinks: bool,

    /// Smallest entry reported by category and duplicate scans, e.g. "1MB".
    #[serde(default = "default_min_size")]
    pub min_size: String,

    /// Smallest file reported by the large-file scan.
    #[serde(default = "default_large_file_min_size")]
    pub large_file_min_size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusions {
    /// Glob patterns matched against full paths, e.g. `**/important-project/**`.
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloatConfig {
    /// Extra directory names treated as build output.
    #[serde(default)]
    pub extra_dirs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_large_blob_threshold_mb")]
    pub large_blob_threshold_mb: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            follow_symlinks: false,
            min_size: default_min_size(),
            large_file_min_size: default_large_file_min_size(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            large_blob_threshold_mb: default_large_blob_threshold_mb(),
        }
    }
}

fn default_min_size() -> String {
    "0".to_string()
}
fn default_large_file_min_size() -> String {
    "100MB".to_string()
}
fn default_large_blob_threshold_mb() -> u64 {
    10
}

impl Config {
    /// Get the config file path: `<config dir>/reclaim/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "reclaim")
            .context("could not determine the user config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load config from file or return defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!("{err:#}; using default settings");
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }

    /// Apply CLI option overrides
    pub fn apply_cli_overrides(
        &mut self,
        threads: Option<usize>,
        follow_symlinks: bool,
        min_size: Option<String>,
    ) {
        if let Some(threads) = threads {
            self.scan.threads = threads;
        }
        if follow_symlinks {
            self.scan.follow_symlinks = true;
        }
        if let Some(size) = min_size {
            self.scan.min_size = size.clone();
            self.scan.large_file_min_size = size;
        }
    }

    pub fn min_size_bytes(&self) -> Result<u64> {
        parse_size(&self.scan.min_size).context("invalid [scan] min_size")
    }

    pub fn large_file_min_size_bytes(&self) -> Result<u64> {
        parse_size(&self.scan.large_file_min_size).context("invalid [scan] large_file_min_size")
    }

    pub fn large_blob_threshold_bytes(&self) -> u64 {
        self.git.large_blob_threshold_mb.saturating_mul(1024 * 1024)
    }
}

impl Exclusions {
    /// Compile the patterns. Invalid globs are logged and skipped.
    pub fn matcher(&self) -> ExclusionMatcher {
        let mut builder = GlobSetBuilder::new();
        let mut count = 0;
        for pattern in &self.patterns {
            // `dir/**` should also exclude `dir` itself so the walk prunes it.
            let mut variants = vec![pattern.as_str()];
            if let Some(dir) = pattern.strip_suffix("/**") {
                if !dir.is_empty() {
                    variants.push(dir);
                }
            }
            for variant in variants {
                match GlobBuilder::new(variant).case_insensitive(true).build() {
                    Ok(glob) => {
                        builder.add(glob);
                        count += 1;
                    }
                    Err(err) => tracing::warn!(pattern = %variant, %err, "ignoring invalid exclusion pattern"),
                }
            }
        }
        let set = if count == 0 {
            None
        } else {
            match builder.build() {
                Ok(set) => Some(set),
                Err(err) => {
                    tracing::warn!(%err, "ignoring exclusion patterns");
                    None
                }
            }
        };
        ExclusionMatcher { set }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExclusionMatcher {
    set: Option<GlobSet>,
}

impl ExclusionMatcher {
    pub fn is_empty(&self) -> bool {
        self.set.is_none()
    }

    /// Check if a path matches any exclusion pattern
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.set.as_ref().is_some_and(|set| set.is_match(path))
    }
}
