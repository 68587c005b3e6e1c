// src/pipeline/mod.rs

//! Transform pipelines, one per asset category.
//!
//! A [`Pipeline`] is data: an ordered list of [`TransformStep`]s plus the
//! mapping from a source path to its output path(s). The registry builds all
//! pipelines once from the validated config; they are immutable for the
//! process lifetime. Steps transform bytes + metadata; the write into the
//! output store is performed by the scheduler, never by a step.

pub mod markup;
pub mod style;

use std::collections::HashMap;
use std::fmt;

use anyhow::{Context, Result, bail};

use crate::config::ConfigFile;
use crate::types::{AssetCategory, MinifyLevel};

pub use markup::MinifyMarkup;
pub use style::{DesugarStyle, MinifyStyle, SourceMap, VendorPrefix};

/// A rendered output artifact: path relative to the output root plus bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub rel_path: String,
    pub bytes: Vec<u8>,
}

/// Metadata threaded through the steps of one render.
#[derive(Debug, Clone)]
pub struct StepMeta {
    /// Source path relative to the source root.
    pub source_rel: String,
    /// Primary output path relative to the output root.
    pub output_rel: String,
    /// Sibling artifacts accumulated by steps (e.g. a source map).
    pub siblings: Vec<RenderedArtifact>,
}

/// Bytes + metadata flowing through a pipeline.
#[derive(Debug, Clone)]
pub struct StepData {
    pub bytes: Vec<u8>,
    pub meta: StepMeta,
}

/// A single transform step.
///
/// Steps must be pure: the same input bytes and metadata always produce the
/// same output. A step that calls out to an external encoder must bound its
/// wait and surface a timeout as an error; the scheduler converts any step
/// error into an isolated task failure.
pub trait TransformStep: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, data: StepData) -> Result<StepData>;
}

/// Ordered steps plus output mapping for one category.
pub struct Pipeline {
    category: AssetCategory,
    /// Watch root relative to the source root; stripped from source paths
    /// when computing output paths.
    root: String,
    /// Output subdirectory relative to the output root.
    output_dir: String,
    /// Extension rewrite for the primary artifact (e.g. scss -> css).
    rewrite_ext: Option<&'static str>,
    /// Whether a `<output>.map` sibling accompanies the primary artifact.
    emits_source_map: bool,
    steps: Vec<Box<dyn TransformStep>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("category", &self.category)
            .field("steps", &self.step_names())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn category(&self) -> AssetCategory {
        self.category
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Primary output path for a source path, both relative with forward
    /// slashes: strip the watch root, rewrite the extension, prepend the
    /// output subdirectory.
    pub fn output_rel(&self, source_rel: &str) -> String {
        let mut rel = source_rel;
        if self.root != "." {
            if let Some(stripped) = rel.strip_prefix(&format!("{}/", self.root)) {
                rel = stripped;
            }
        }

        let mut name = rel.to_string();
        if let Some(ext) = self.rewrite_ext {
            name = rewrite_extension(&name, ext);
        }

        if self.output_dir.is_empty() {
            name
        } else {
            format!("{}/{}", self.output_dir, name)
        }
    }

    /// Every artifact path this pipeline produces for a source path. Used
    /// for mirrored deletion, so it must stay in sync with what `render`
    /// emits.
    pub fn output_paths(&self, source_rel: &str) -> Vec<String> {
        let primary = self.output_rel(source_rel);
        let mut paths = vec![primary.clone()];
        if self.emits_source_map {
            paths.push(format!("{primary}.map"));
        }
        paths
    }

    /// Run the ordered steps over the source bytes and return all artifacts.
    pub fn render(&self, source_rel: &str, bytes: Vec<u8>) -> Result<Vec<RenderedArtifact>> {
        let output_rel = self.output_rel(source_rel);
        let mut data = StepData {
            bytes,
            meta: StepMeta {
                source_rel: source_rel.to_string(),
                output_rel: output_rel.clone(),
                siblings: Vec::new(),
            },
        };

        for step in &self.steps {
            data = step
                .apply(data)
                .with_context(|| format!("step '{}' failed for {source_rel}", step.name()))?;
        }

        let mut artifacts = vec![RenderedArtifact {
            rel_path: output_rel,
            bytes: data.bytes,
        }];
        artifacts.extend(data.meta.siblings);
        Ok(artifacts)
    }
}

/// Category -> pipeline lookup, built once at startup.
#[derive(Debug)]
pub struct Registry {
    pipelines: HashMap<AssetCategory, Pipeline>,
}

impl Registry {
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut pipelines = HashMap::new();

        for category in AssetCategory::ALL {
            let layout = cfg.category_layout(category);

            let (steps, rewrite_ext, emits_source_map): (
                Vec<Box<dyn TransformStep>>,
                Option<&'static str>,
                bool,
            ) = match category {
                AssetCategory::Markup => (
                    vec![Box::new(MinifyMarkup::new(
                        cfg.markup.effective_preserve_whitespace(),
                    )) as Box<dyn TransformStep>],
                    None,
                    false,
                ),
                AssetCategory::Style => {
                    let mut steps: Vec<Box<dyn TransformStep>> = vec![
                        Box::new(DesugarStyle),
                        Box::new(VendorPrefix::default()),
                    ];
                    if cfg.style.effective_minify() != MinifyLevel::None {
                        steps.push(Box::new(MinifyStyle::new(cfg.style.effective_minify())));
                    }
                    let maps = cfg.style.effective_source_maps();
                    if maps {
                        steps.push(Box::new(SourceMap));
                    }
                    (steps, Some("css"), maps)
                }
                // Scripts and binary assets are copied verbatim; the write
                // site's content gate decides whether anything happens.
                AssetCategory::Script
                | AssetCategory::Image
                | AssetCategory::Icon
                | AssetCategory::Font => (Vec::new(), None, false),
            };

            pipelines.insert(
                category,
                Pipeline {
                    category,
                    root: layout.root,
                    output_dir: layout.output,
                    rewrite_ext,
                    emits_source_map,
                    steps,
                },
            );
        }

        Ok(Self { pipelines })
    }

    pub fn pipeline(&self, category: AssetCategory) -> Result<&Pipeline> {
        match self.pipelines.get(&category) {
            Some(p) => Ok(p),
            None => bail!("no pipeline registered for category {category}"),
        }
    }
}

fn rewrite_extension(rel: &str, ext: &str) -> String {
    let (dir, name) = match rel.rfind('/') {
        Some(idx) => (&rel[..=idx], &rel[idx + 1..]),
        None => ("", rel),
    };
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    format!("{dir}{stem}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfigFile;

    fn registry() -> Registry {
        let raw: RawConfigFile = toml::from_str("").unwrap();
        let cfg = ConfigFile::try_from(raw).unwrap();
        Registry::from_config(&cfg).unwrap()
    }

    #[test]
    fn style_output_is_flattened_and_rewritten() {
        let r = registry();
        let style = r.pipeline(AssetCategory::Style).unwrap();
        assert_eq!(style.output_rel("sass/main.scss"), "main.css");
        assert_eq!(
            style.output_paths("sass/main.scss"),
            vec!["main.css".to_string(), "main.css.map".to_string()]
        );
    }

    #[test]
    fn script_output_preserves_relative_path() {
        let r = registry();
        let script = r.pipeline(AssetCategory::Script).unwrap();
        assert_eq!(script.output_rel("js/app.js"), "js/app.js");
        assert_eq!(script.output_rel("js/lib/util.js"), "js/lib/util.js");
    }

    #[test]
    fn markup_output_is_same_relative_path() {
        let r = registry();
        let markup = r.pipeline(AssetCategory::Markup).unwrap();
        assert_eq!(markup.output_rel("index.html"), "index.html");
    }

    #[test]
    fn passthrough_render_is_identity() {
        let r = registry();
        let image = r.pipeline(AssetCategory::Image).unwrap();
        let artifacts = image
            .render("assets/images/logo.png", vec![1, 2, 3])
            .unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].rel_path, "assets/images/logo.png");
        assert_eq!(artifacts[0].bytes, vec![1, 2, 3]);
    }

    #[test]
    fn render_twice_is_byte_identical() {
        let r = registry();
        let style = r.pipeline(AssetCategory::Style).unwrap();
        let src = b"$c: red;\nbody { color: $c; }\n".to_vec();
        let a = style.render("sass/main.scss", src.clone()).unwrap();
        let b = style.render("sass/main.scss", src).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rewrite_extension_handles_nested_and_bare_names() {
        assert_eq!(rewrite_extension("main.scss", "css"), "main.css");
        assert_eq!(rewrite_extension("a/b/x.scss", "css"), "a/b/x.css");
        assert_eq!(rewrite_extension("noext", "css"), "noext.css");
    }
}
