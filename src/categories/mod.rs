//! Static rule tables for the categories reclaim knows about.
//!
//! Each table is a pure matcher; sizing and grouping happen in
//! [`crate::classifier`] and [`crate::aggregate`].

pub mod bloat;
pub mod dev_cache;
pub mod duplicates;
pub mod junk;

use crate::model::Safety;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Bloat,
    Junk,
    DevCache,
}

/// Result of matching one path against a rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMatch {
    pub kind: MatchKind,
    pub category_id: String,
    pub display_name: String,
    pub safety: Safety,
}

impl CategoryMatch {
    pub(crate) fn new(
        kind: MatchKind,
        category_id: impl Into<String>,
        display_name: impl Into<String>,
        safety: Safety,
    ) -> Self {
        Self {
            kind,
            category_id: category_id.into(),
            display_name: display_name.into(),
            safety,
        }
    }
}
