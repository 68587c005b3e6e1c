use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Asset category a source path belongs to.
///
/// Classification order is the declaration order below; the classifier tries
/// each category's patterns in this order and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Markup,
    Style,
    Script,
    Image,
    Icon,
    Font,
}

impl AssetCategory {
    /// All categories, in classification order.
    pub const ALL: [AssetCategory; 6] = [
        AssetCategory::Markup,
        AssetCategory::Style,
        AssetCategory::Script,
        AssetCategory::Image,
        AssetCategory::Icon,
        AssetCategory::Font,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Markup => "markup",
            AssetCategory::Style => "style",
            AssetCategory::Script => "script",
            AssetCategory::Image => "image",
            AssetCategory::Icon => "icon",
            AssetCategory::Font => "font",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filesystem event kind as delivered by the watch provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Change,
    Unlink,
}

/// Why a build task exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskReason {
    /// Part of the initial full rebuild at startup.
    Initial,
    /// The source file appeared after startup.
    Added,
    /// The source file's content changed.
    Changed,
    /// The source file was deleted; mirror the deletion into the output tree.
    Removed,
}

impl TaskReason {
    pub fn from_change(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Add => TaskReason::Added,
            ChangeKind::Change => TaskReason::Changed,
            ChangeKind::Unlink => TaskReason::Removed,
        }
    }
}

/// Stylesheet minification level.
///
/// `Safe` strips comments and whitespace; `Aggressive` additionally rewrites
/// values (e.g. drops units on zero lengths).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MinifyLevel {
    None,
    Safe,
    #[default]
    Aggressive,
}

impl FromStr for MinifyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(MinifyLevel::None),
            "safe" => Ok(MinifyLevel::Safe),
            "aggressive" => Ok(MinifyLevel::Aggressive),
            other => Err(format!(
                "invalid minify level: {other} (expected \"none\", \"safe\" or \"aggressive\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_maps_from_change_kind() {
        assert_eq!(TaskReason::from_change(ChangeKind::Add), TaskReason::Added);
        assert_eq!(
            TaskReason::from_change(ChangeKind::Change),
            TaskReason::Changed
        );
        assert_eq!(
            TaskReason::from_change(ChangeKind::Unlink),
            TaskReason::Removed
        );
    }

    #[test]
    fn minify_level_parses_case_insensitively() {
        assert_eq!("Aggressive".parse::<MinifyLevel>(), Ok(MinifyLevel::Aggressive));
        assert_eq!("safe".parse::<MinifyLevel>(), Ok(MinifyLevel::Safe));
        assert!("level2".parse::<MinifyLevel>().is_err());
    }
}
