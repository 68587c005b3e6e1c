// src/classify.rs

//! Category classification for source paths.
//!
//! A [`Classifier`] holds one compiled glob set per category, tried in the
//! fixed order of [`AssetCategory::ALL`]; the first matching category wins.
//! Classification is pure: it never touches the filesystem, and repeated
//! calls for the same path always return the same result.

use std::fmt;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::ConfigFile;
use crate::types::AssetCategory;

struct CategoryRule {
    category: AssetCategory,
    set: GlobSet,
}

pub struct Classifier {
    rules: Vec<CategoryRule>,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field(
                "rules",
                &self.rules.iter().map(|r| r.category).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Classifier {
    /// Compile the per-category patterns from a validated config.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut rules = Vec::with_capacity(AssetCategory::ALL.len());
        for category in AssetCategory::ALL {
            let layout = cfg.category_layout(category);
            let set = build_globset(&layout.patterns)
                .with_context(|| format!("building globset for category {category}"))?;
            rules.push(CategoryRule { category, set });
        }
        Ok(Self { rules })
    }

    /// Classify a path relative to the source root (forward slashes).
    ///
    /// Returns `None` when no category's patterns match; callers drop such
    /// paths with a diagnostic.
    pub fn classify(&self, rel_path: &str) -> Option<AssetCategory> {
        self.rules
            .iter()
            .find(|rule| rule.set.is_match(rel_path))
            .map(|rule| rule.category)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        // `*` must not cross directory boundaries: `*.html` is root-only,
        // recursion is spelled `**`.
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
