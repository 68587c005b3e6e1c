// src/config/validate.rs

use std::path::Path;

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AssetwatchError, Result};
use crate::types::AssetCategory;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let cfg = ConfigFile::new_unchecked(raw);
        validate_config(&cfg)?;
        Ok(cfg)
    }
}

fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_roots(cfg)?;
    validate_watch(cfg)?;
    validate_patterns(cfg)?;
    Ok(())
}

fn validate_roots(cfg: &ConfigFile) -> Result<()> {
    if cfg.project.source_root.trim().is_empty() {
        return Err(AssetwatchError::ConfigError(
            "[project].source_root must not be empty".to_string(),
        ));
    }
    if cfg.project.output_root.trim().is_empty() {
        return Err(AssetwatchError::ConfigError(
            "[project].output_root must not be empty".to_string(),
        ));
    }

    let source = Path::new(&cfg.project.source_root);
    let output = Path::new(&cfg.project.output_root);

    if source == output {
        return Err(AssetwatchError::ConfigError(
            "source_root and output_root must differ".to_string(),
        ));
    }

    // An output tree inside the watched source tree would feed the watcher
    // its own writes.
    if output.starts_with(source) {
        return Err(AssetwatchError::ConfigError(format!(
            "output_root '{}' must not be inside source_root '{}'",
            cfg.project.output_root, cfg.project.source_root
        )));
    }

    Ok(())
}

fn validate_watch(cfg: &ConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(AssetwatchError::ConfigError(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_patterns(cfg: &ConfigFile) -> Result<()> {
    for category in AssetCategory::ALL {
        let layout = cfg.category_layout(category);

        if layout.patterns.is_empty() {
            return Err(AssetwatchError::ConfigError(format!(
                "[{category}] must declare at least one pattern"
            )));
        }

        for pattern in &layout.patterns {
            Glob::new(pattern).map_err(|e| {
                AssetwatchError::ConfigError(format!(
                    "[{category}] has an invalid glob pattern '{pattern}': {e}"
                ))
            })?;
        }
    }
    Ok(())
}
