#![allow(dead_code)]

use assetwatch::config::{ConfigFile, RawConfigFile};
use assetwatch::types::MinifyLevel;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in layout (the defaults an empty TOML file would
/// produce) and lets tests override individual knobs.
pub struct ConfigFileBuilder {
    raw: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfigFile::default(),
        }
    }

    pub fn source_root(mut self, root: &str) -> Self {
        self.raw.project.source_root = root.to_string();
        self
    }

    pub fn output_root(mut self, root: &str) -> Self {
        self.raw.project.output_root = root.to_string();
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.raw.watch.debounce_ms = ms;
        self
    }

    pub fn preserve_whitespace(mut self, preserve: bool) -> Self {
        self.raw.markup.preserve_whitespace = Some(preserve);
        self
    }

    pub fn style_minify(mut self, level: MinifyLevel) -> Self {
        self.raw.style.minify = Some(level);
        self
    }

    pub fn style_source_maps(mut self, enabled: bool) -> Self {
        self.raw.style.source_maps = Some(enabled);
        self
    }

    pub fn style_patterns(mut self, patterns: &[&str]) -> Self {
        self.raw.style.patterns = Some(patterns.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn script_patterns(mut self, patterns: &[&str]) -> Self {
        self.raw.script.patterns = Some(patterns.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
