// src/config/model.rs

use serde::Deserialize;

use crate::types::{AssetCategory, MinifyLevel};

/// Top-level configuration as read from a TOML file, before validation.
///
/// All sections are optional and have defaults mirroring the conventional
/// project layout (`src/*.html`, `src/sass/**`, `src/js/**`,
/// `src/assets/{images,icons,fonts}/**` into `dist/`).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// `[project]`: source and output roots.
    #[serde(default)]
    pub project: ProjectSection,

    /// `[watch]`: debounce window and resubscription policy.
    #[serde(default)]
    pub watch: WatchSection,

    /// `[markup]`
    #[serde(default)]
    pub markup: MarkupSection,

    /// `[style]`
    #[serde(default)]
    pub style: StyleSection,

    /// `[script]`
    #[serde(default)]
    pub script: ScriptSection,

    /// `[images]`
    #[serde(default)]
    pub images: AssetSection,

    /// `[icons]`
    #[serde(default)]
    pub icons: AssetSection,

    /// `[fonts]`
    #[serde(default)]
    pub fonts: AssetSection,
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Directory holding the watched sources.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Directory the artifacts are written into.
    #[serde(default = "default_output_root")]
    pub output_root: String,
}

fn default_source_root() -> String {
    "src".to_string()
}

fn default_output_root() -> String {
    "dist".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            output_root: default_output_root(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Coalescing window in milliseconds; events for the same path within
    /// this window collapse into one notification.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How often a failing watch subscription is retried before its root is
    /// abandoned (other roots keep running).
    #[serde(default = "default_resubscribe_attempts")]
    pub resubscribe_attempts: u32,
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_resubscribe_attempts() -> u32 {
    3
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            resubscribe_attempts: default_resubscribe_attempts(),
        }
    }
}

/// `[markup]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MarkupSection {
    /// Watch root, relative to the source root.
    pub root: Option<String>,
    /// Glob patterns, relative to the source root.
    pub patterns: Option<Vec<String>>,
    /// Output subdirectory, relative to the output root.
    pub output: Option<String>,
    /// Keep whitespace runs instead of collapsing them during minification.
    pub preserve_whitespace: Option<bool>,
}

impl MarkupSection {
    pub fn effective_preserve_whitespace(&self) -> bool {
        self.preserve_whitespace.unwrap_or(true)
    }
}

/// `[style]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StyleSection {
    pub root: Option<String>,
    pub patterns: Option<Vec<String>>,
    pub output: Option<String>,
    /// Minification level ("none", "safe", "aggressive").
    pub minify: Option<MinifyLevel>,
    /// Emit a `<name>.css.map` sibling artifact.
    pub source_maps: Option<bool>,
}

impl StyleSection {
    pub fn effective_minify(&self) -> MinifyLevel {
        self.minify.unwrap_or_default()
    }

    pub fn effective_source_maps(&self) -> bool {
        self.source_maps.unwrap_or(true)
    }
}

/// `[script]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScriptSection {
    pub root: Option<String>,
    pub patterns: Option<Vec<String>>,
    pub output: Option<String>,
}

/// `[images]` / `[icons]` / `[fonts]` sections (pass-through categories).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AssetSection {
    pub root: Option<String>,
    pub patterns: Option<Vec<String>>,
    pub output: Option<String>,
}

/// Resolved layout for one category: where to watch, what to match, where to
/// write. Patterns are relative to the source root; `output` is relative to
/// the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLayout {
    pub root: String,
    pub patterns: Vec<String>,
    pub output: String,
}

/// Built-in layout per category, used when the section doesn't override it.
fn builtin_layout(category: AssetCategory) -> CategoryLayout {
    let (root, patterns, output): (&str, &[&str], &str) = match category {
        AssetCategory::Markup => (".", &["*.html"], ""),
        AssetCategory::Style => ("sass", &["sass/**/*.scss"], ""),
        AssetCategory::Script => ("js", &["js/**/*"], "js"),
        AssetCategory::Image => ("assets/images", &["assets/images/**/*"], "assets/images"),
        AssetCategory::Icon => ("assets/icons", &["assets/icons/**/*"], "assets/icons"),
        AssetCategory::Font => ("assets/fonts", &["assets/fonts/**/*"], "assets/fonts"),
    };
    CategoryLayout {
        root: root.to_string(),
        patterns: patterns.iter().map(|s| s.to_string()).collect(),
        output: output.to_string(),
    }
}

/// Validated configuration.
///
/// Construct via `ConfigFile::try_from(raw)` (see `validate.rs`) or the
/// loader's `load_and_validate`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project: ProjectSection,
    pub watch: WatchSection,
    pub markup: MarkupSection,
    pub style: StyleSection,
    pub script: ScriptSection,
    pub images: AssetSection,
    pub icons: AssetSection,
    pub fonts: AssetSection,
}

impl ConfigFile {
    /// Internal constructor used after validation has passed.
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            project: raw.project,
            watch: raw.watch,
            markup: raw.markup,
            style: raw.style,
            script: raw.script,
            images: raw.images,
            icons: raw.icons,
            fonts: raw.fonts,
        }
    }

    /// Resolved layout for a category, merging section overrides over the
    /// built-in defaults.
    pub fn category_layout(&self, category: AssetCategory) -> CategoryLayout {
        let builtin = builtin_layout(category);
        let (root, patterns, output) = match category {
            AssetCategory::Markup => (
                self.markup.root.clone(),
                self.markup.patterns.clone(),
                self.markup.output.clone(),
            ),
            AssetCategory::Style => (
                self.style.root.clone(),
                self.style.patterns.clone(),
                self.style.output.clone(),
            ),
            AssetCategory::Script => (
                self.script.root.clone(),
                self.script.patterns.clone(),
                self.script.output.clone(),
            ),
            AssetCategory::Image => (
                self.images.root.clone(),
                self.images.patterns.clone(),
                self.images.output.clone(),
            ),
            AssetCategory::Icon => (
                self.icons.root.clone(),
                self.icons.patterns.clone(),
                self.icons.output.clone(),
            ),
            AssetCategory::Font => (
                self.fonts.root.clone(),
                self.fonts.patterns.clone(),
                self.fonts.output.clone(),
            ),
        };
        CategoryLayout {
            root: root.unwrap_or(builtin.root),
            patterns: patterns.unwrap_or(builtin.patterns),
            output: output.unwrap_or(builtin.output),
        }
    }

    /// Distinct watch roots across all categories, in classification order.
    pub fn watch_roots(&self) -> Vec<String> {
        let mut roots = Vec::new();
        for category in AssetCategory::ALL {
            let root = self.category_layout(category).root;
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        roots
    }
}
