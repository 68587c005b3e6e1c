// src/pipeline/style.rs

//! Stylesheet pipeline steps: preprocessor desugar, vendor prefixing,
//! minification and source-map emission.
//!
//! The desugar step is deliberately minimal (`$variable` substitution and
//! line comments). A full preprocessor is an external collaborator: plug it
//! in as a [`TransformStep`] ahead of the built-in steps.

use anyhow::{Context, Result, bail};

use super::{RenderedArtifact, StepData, TransformStep};
use crate::types::MinifyLevel;

/// Minimal SCSS-flavoured desugaring: top-level `$name: value;` declarations
/// are substituted into the remaining sheet, `//` comments are stripped.
///
/// `@import` and undefined variables are step errors, surfaced as isolated
/// task failures.
#[derive(Debug, Clone, Default)]
pub struct DesugarStyle;

impl TransformStep for DesugarStyle {
    fn name(&self) -> &'static str {
        "desugar-style"
    }

    fn apply(&self, mut data: StepData) -> Result<StepData> {
        let src = String::from_utf8(data.bytes).context("stylesheet is not valid UTF-8")?;

        if src.contains("@import") {
            bail!("@import is not resolved by the built-in preprocessor");
        }

        let stripped = strip_line_comments(&src);
        let (vars, rest) = extract_variables(&stripped);
        data.bytes = substitute_variables(&rest, &vars)?.into_bytes();
        Ok(data)
    }
}

/// Remove `//` comments outside strings and parentheses (so `url(//cdn...)`
/// survives). The newline is kept.
fn strip_line_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.char_indices().peekable();
    let mut quote: Option<char> = None;
    let mut paren_depth = 0usize;

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    out.push(c);
                }
                '(' => {
                    paren_depth += 1;
                    out.push(c);
                }
                ')' => {
                    paren_depth = paren_depth.saturating_sub(1);
                    out.push(c);
                }
                '/' if paren_depth == 0 && src[i..].starts_with("//") => {
                    while let Some((_, n)) = chars.peek() {
                        if *n == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
                _ => out.push(c),
            },
        }
    }
    out
}

/// Collect top-level `$name: value;` declarations. Values may reference
/// previously defined variables. Returns the declarations and the sheet
/// without them.
fn extract_variables(src: &str) -> (Vec<(String, String)>, String) {
    let mut vars: Vec<(String, String)> = Vec::new();
    let mut rest = String::with_capacity(src.len());
    let mut depth = 0usize;

    for line in src.lines() {
        let trimmed = line.trim();
        if depth == 0 && trimmed.starts_with('$') {
            if let Some((name, value)) = parse_variable_line(trimmed) {
                let value = substitute_variables(&value, &vars).unwrap_or(value);
                vars.push((name, value));
                continue;
            }
        }

        depth += line.matches('{').count();
        depth = depth.saturating_sub(line.matches('}').count());
        rest.push_str(line);
        rest.push('\n');
    }

    (vars, rest)
}

fn parse_variable_line(line: &str) -> Option<(String, String)> {
    let body = line.strip_prefix('$')?;
    let (name, value) = body.split_once(':')?;
    let value = value.trim().trim_end_matches(';').trim();
    let name = name.trim();
    if name.is_empty() || value.is_empty() {
        return None;
    }
    Some((name.to_string(), value.to_string()))
}

/// Replace every `$name` occurrence; unknown names are an error.
fn substitute_variables(src: &str, vars: &[(String, String)]) -> Result<String> {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.char_indices();

    while let Some((i, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let name: String = src[i + 1..]
            .chars()
            .take_while(|ch| ch.is_alphanumeric() || *ch == '_' || *ch == '-')
            .collect();
        if name.is_empty() {
            out.push(c);
            continue;
        }

        match vars.iter().find(|(n, _)| *n == name) {
            Some((_, value)) => out.push_str(value),
            None => bail!("undefined style variable ${name}"),
        }

        // Skip the consumed identifier.
        for _ in 0..name.chars().count() {
            chars.next();
        }
    }

    Ok(out)
}

/// Properties that still want vendor-prefixed duplicates, and which prefixes
/// to emit.
const PREFIX_TABLE: &[(&str, &[&str])] = &[
    ("user-select", &["-webkit-", "-moz-"]),
    ("appearance", &["-webkit-", "-moz-"]),
    ("backdrop-filter", &["-webkit-"]),
    ("text-size-adjust", &["-webkit-"]),
    ("tab-size", &["-moz-"]),
];

/// Inserts vendor-prefixed copies of known declarations ahead of the
/// standard one.
#[derive(Debug, Clone, Default)]
pub struct VendorPrefix;

impl TransformStep for VendorPrefix {
    fn name(&self) -> &'static str {
        "vendor-prefix"
    }

    fn apply(&self, mut data: StepData) -> Result<StepData> {
        let css = String::from_utf8(data.bytes).context("stylesheet is not valid UTF-8")?;
        data.bytes = apply_prefixes(&css).into_bytes();
        Ok(data)
    }
}

fn apply_prefixes(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut at_decl_start = true;
    let mut i = 0;

    while i < css.len() {
        let c = css[i..].chars().next().unwrap();

        if at_decl_start && !c.is_whitespace() {
            at_decl_start = false;
            if let Some(prefixes) = match_property(&css[i..]) {
                let end = find_decl_end(css, i);
                let decl = &css[i..end];
                for prefix in prefixes {
                    out.push_str(prefix);
                    out.push_str(decl.trim_end());
                    out.push_str("; ");
                }
                out.push_str(decl);
                i = end;
                continue;
            }
        }

        if c == '{' || c == ';' || c == '}' {
            at_decl_start = true;
        }
        out.push(c);
        i += c.len_utf8();
    }

    out
}

/// Does the text start with a known unprefixed property followed by `:`?
fn match_property(rest: &str) -> Option<&'static [&'static str]> {
    for (prop, prefixes) in PREFIX_TABLE {
        if let Some(after) = rest.strip_prefix(prop) {
            if after.trim_start().starts_with(':') {
                return Some(prefixes);
            }
        }
    }
    None
}

/// Index of the `;` or `}` terminating the declaration starting at `start`,
/// quote- and paren-aware.
fn find_decl_end(css: &str, start: usize) -> usize {
    let mut quote: Option<char> = None;
    let mut paren_depth = 0usize;

    for (off, c) in css[start..].char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => paren_depth += 1,
                ')' => paren_depth = paren_depth.saturating_sub(1),
                ';' | '}' if paren_depth == 0 => return start + off,
                _ => {}
            },
        }
    }
    css.len()
}

/// Whitespace/comment minification with an optional aggressive pass.
#[derive(Debug, Clone)]
pub struct MinifyStyle {
    level: MinifyLevel,
}

impl MinifyStyle {
    pub fn new(level: MinifyLevel) -> Self {
        Self { level }
    }
}

impl TransformStep for MinifyStyle {
    fn name(&self) -> &'static str {
        "minify-style"
    }

    fn apply(&self, mut data: StepData) -> Result<StepData> {
        if self.level == MinifyLevel::None {
            return Ok(data);
        }

        let css = String::from_utf8(data.bytes).context("stylesheet is not valid UTF-8")?;
        let mut minified = collapse_css(&strip_block_comments(&css));
        if self.level == MinifyLevel::Aggressive {
            minified = trim_zero_units(&minified);
        }
        data.bytes = minified.into_bytes();
        Ok(data)
    }
}

fn strip_block_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < css.len() {
        let c = css[i..].chars().next().unwrap();
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
                i += c.len_utf8();
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                    out.push(c);
                    i += 1;
                } else if css[i..].starts_with("/*") {
                    let end = css[i + 2..]
                        .find("*/")
                        .map(|j| i + 2 + j + 2)
                        .unwrap_or(css.len());
                    i = end;
                } else {
                    out.push(c);
                    i += c.len_utf8();
                }
            }
        }
    }
    out
}

/// Characters that make an adjacent space redundant.
const TIGHT: &[char] = &['{', '}', ';', ':', ',', '>', '('];

fn collapse_css(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut quote: Option<char> = None;
    let mut chars = css.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                    out.push(c);
                } else if c.is_whitespace() {
                    while let Some(n) = chars.peek() {
                        if n.is_whitespace() {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let prev_tight = out.chars().last().is_none_or(|p| TIGHT.contains(&p));
                    let next_tight = chars
                        .peek()
                        .is_none_or(|n| TIGHT.contains(n) || *n == ')');
                    if !prev_tight && !next_tight {
                        out.push(' ');
                    }
                } else {
                    if c == '}' && out.ends_with(';') {
                        out.pop();
                    }
                    out.push(c);
                }
            }
        }
    }

    out.trim().to_string()
}

const ZERO_UNITS: &[&str] = &["px", "em", "rem", "vh", "vw", "pt", "%"];

fn trim_zero_units(css: &str) -> String {
    let mut out = css.to_string();
    for unit in ZERO_UNITS {
        for lead in [':', ' ', ','] {
            let needle = format!("{lead}0{unit}");
            let replacement = format!("{lead}0");
            // Re-scan after each replace round; occurrences never overlap.
            out = replace_before_boundary(&out, &needle, &replacement);
        }
    }
    out
}

/// Replace `needle` with `replacement` only where the match is followed by a
/// non-alphanumeric boundary (so `0%` inside `100%` or `0pxx` stay intact).
fn replace_before_boundary(src: &str, needle: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(pos) = rest.find(needle) {
        let after = &rest[pos + needle.len()..];
        let boundary = after
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric() && c != '.');
        let prev_ok = pos == 0
            || rest[..pos]
                .chars()
                .last()
                .is_none_or(|c| !c.is_ascii_digit() && c != '.');
        out.push_str(&rest[..pos]);
        if boundary && prev_ok {
            out.push_str(replacement);
        } else {
            out.push_str(needle);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Appends a `sourceMappingURL` footer and emits the `.map` sibling.
///
/// The mapping payload is a minimal identity map tied to the source path;
/// this is the documented exception to pipeline output being independent of
/// file identity.
#[derive(Debug, Clone, Default)]
pub struct SourceMap;

impl TransformStep for SourceMap {
    fn name(&self) -> &'static str {
        "source-map"
    }

    fn apply(&self, mut data: StepData) -> Result<StepData> {
        let file = data
            .meta
            .output_rel
            .rsplit('/')
            .next()
            .unwrap_or(&data.meta.output_rel)
            .to_string();

        let map = serde_json::json!({
            "version": 3,
            "file": file,
            "sources": [data.meta.source_rel],
            "names": [],
            "mappings": "",
        });

        let footer = format!("\n/*# sourceMappingURL={file}.map */\n");
        data.bytes.extend_from_slice(footer.as_bytes());
        data.meta.siblings.push(RenderedArtifact {
            rel_path: format!("{}.map", data.meta.output_rel),
            bytes: serde_json::to_vec(&map).context("serializing source map")?,
        });
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StepMeta;

    fn data(bytes: &[u8]) -> StepData {
        StepData {
            bytes: bytes.to_vec(),
            meta: StepMeta {
                source_rel: "sass/main.scss".to_string(),
                output_rel: "main.css".to_string(),
                siblings: Vec::new(),
            },
        }
    }

    fn as_str(data: &StepData) -> &str {
        std::str::from_utf8(&data.bytes).unwrap()
    }

    #[test]
    fn desugar_substitutes_variables() {
        let out = DesugarStyle
            .apply(data(b"$accent: #f80;\nbody { color: $accent; }\n"))
            .unwrap();
        assert_eq!(as_str(&out), "body { color: #f80; }\n");
    }

    #[test]
    fn desugar_resolves_chained_variables() {
        let out = DesugarStyle
            .apply(data(
                b"$base: 4px;\n$gap: $base;\n.m { margin: $gap; }\n",
            ))
            .unwrap();
        assert_eq!(as_str(&out), ".m { margin: 4px; }\n");
    }

    #[test]
    fn desugar_rejects_undefined_variable() {
        let err = DesugarStyle
            .apply(data(b"body { color: $missing; }\n"))
            .unwrap_err();
        assert!(err.to_string().contains("$missing"));
    }

    #[test]
    fn desugar_rejects_imports() {
        assert!(DesugarStyle.apply(data(b"@import \"base\";\n")).is_err());
    }

    #[test]
    fn line_comments_are_stripped_but_urls_survive() {
        let out = DesugarStyle
            .apply(data(
                b"// header\nbody { background: url(//cdn.example/x.png); }\n",
            ))
            .unwrap();
        assert_eq!(
            as_str(&out),
            "\nbody { background: url(//cdn.example/x.png); }\n"
        );
    }

    #[test]
    fn vendor_prefix_duplicates_known_properties() {
        let out = VendorPrefix
            .apply(data(b".a { user-select: none; }"))
            .unwrap();
        assert_eq!(
            as_str(&out),
            ".a { -webkit-user-select: none; -moz-user-select: none; user-select: none; }"
        );
    }

    #[test]
    fn vendor_prefix_leaves_unknown_properties_alone() {
        let input = b".a { color: red; }";
        let out = VendorPrefix.apply(data(input)).unwrap();
        assert_eq!(out.bytes, input.to_vec());
    }

    #[test]
    fn minify_safe_collapses_whitespace_and_comments() {
        let out = MinifyStyle::new(MinifyLevel::Safe)
            .apply(data(b"/* hi */\nbody {\n  color: red;\n}\n"))
            .unwrap();
        assert_eq!(as_str(&out), "body{color:red}");
    }

    #[test]
    fn minify_aggressive_trims_zero_units() {
        let out = MinifyStyle::new(MinifyLevel::Aggressive)
            .apply(data(b".a { margin: 0px 10px; top: 0em; }"))
            .unwrap();
        assert_eq!(as_str(&out), ".a{margin:0 10px;top:0}");
    }

    #[test]
    fn minify_keeps_string_content() {
        let out = MinifyStyle::new(MinifyLevel::Safe)
            .apply(data(b".a { content: \"a  b\"; }"))
            .unwrap();
        assert_eq!(as_str(&out), ".a{content:\"a  b\"}");
    }

    #[test]
    fn aggressive_does_not_touch_nonzero_values() {
        let out = MinifyStyle::new(MinifyLevel::Aggressive)
            .apply(data(b".a{width:100%;left:10px}"))
            .unwrap();
        assert_eq!(as_str(&out), ".a{width:100%;left:10px}");
    }

    #[test]
    fn source_map_emits_footer_and_sibling() {
        let out = SourceMap.apply(data(b"body{}")).unwrap();
        let css = as_str(&out);
        assert!(css.starts_with("body{}"));
        assert!(css.contains("/*# sourceMappingURL=main.css.map */"));

        assert_eq!(out.meta.siblings.len(), 1);
        let map = &out.meta.siblings[0];
        assert_eq!(map.rel_path, "main.css.map");
        let parsed: serde_json::Value = serde_json::from_slice(&map.bytes).unwrap();
        assert_eq!(parsed["version"], 3);
        assert_eq!(parsed["sources"][0], "sass/main.scss");
    }
}
