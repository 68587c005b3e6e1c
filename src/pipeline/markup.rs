// src/pipeline/markup.rs

//! Markup minification.

use anyhow::{Context, Result};

use super::{StepData, TransformStep};

/// Collapses whitespace runs in HTML to a single space.
///
/// `preserve_whitespace = true` (the default) makes this step a pass-through;
/// content inside `<pre>` and `<textarea>` is always left untouched.
#[derive(Debug, Clone)]
pub struct MinifyMarkup {
    preserve_whitespace: bool,
}

impl MinifyMarkup {
    pub fn new(preserve_whitespace: bool) -> Self {
        Self {
            preserve_whitespace,
        }
    }
}

impl TransformStep for MinifyMarkup {
    fn name(&self) -> &'static str {
        "minify-markup"
    }

    fn apply(&self, mut data: StepData) -> Result<StepData> {
        if self.preserve_whitespace {
            return Ok(data);
        }

        let html = String::from_utf8(data.bytes)
            .context("markup source is not valid UTF-8")?;
        data.bytes = collapse_whitespace(&html).into_bytes();
        Ok(data)
    }
}

/// Tags whose content must keep its whitespace verbatim.
const VERBATIM_TAGS: [(&str, &str); 2] = [("<pre", "</pre>"), ("<textarea", "</textarea>")];

fn collapse_whitespace(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut i = 0;

    'outer: while i < html.len() {
        for (open, close) in VERBATIM_TAGS {
            if lower[i..].starts_with(open) && is_tag_boundary(&lower, i + open.len()) {
                let end = lower[i..]
                    .find(close)
                    .map(|j| i + j + close.len())
                    .unwrap_or(html.len());
                out.push_str(&html[i..end]);
                i = end;
                continue 'outer;
            }
        }

        let ch = html[i..].chars().next().unwrap();
        if ch.is_whitespace() {
            let mut j = i;
            while j < html.len() {
                let c = html[j..].chars().next().unwrap();
                if c.is_whitespace() {
                    j += c.len_utf8();
                } else {
                    break;
                }
            }
            out.push(' ');
            i = j;
        } else {
            out.push(ch);
            i += ch.len_utf8();
        }
    }

    out.trim().to_string()
}

/// True when the byte at `idx` ends a tag name (so `<pre` doesn't swallow
/// `<presentation>`).
fn is_tag_boundary(lower: &str, idx: usize) -> bool {
    match lower.as_bytes().get(idx) {
        Some(b) => b.is_ascii_whitespace() || *b == b'>' || *b == b'/',
        None => true,
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
                source_rel: "index.html".to_string(),
                output_rel: "index.html".to_string(),
                siblings: Vec::new(),
            },
        }
    }

    #[test]
    fn preserving_mode_is_identity() {
        let step = MinifyMarkup::new(true);
        let input = b"<p>\n  hello\n</p>\n";
        let out = step.apply(data(input)).unwrap();
        assert_eq!(out.bytes, input.to_vec());
    }

    #[test]
    fn collapsing_mode_squeezes_runs() {
        let step = MinifyMarkup::new(false);
        let out = step.apply(data(b"<p>\n   hello   world\n</p>\n")).unwrap();
        assert_eq!(out.bytes, b"<p> hello world </p>".to_vec());
    }

    #[test]
    fn pre_blocks_keep_whitespace() {
        let step = MinifyMarkup::new(false);
        let out = step
            .apply(data(b"<div>  a  </div><pre>  keep\n  this  </pre>"))
            .unwrap();
        assert_eq!(
            String::from_utf8(out.bytes).unwrap(),
            "<div> a </div><pre>  keep\n  this  </pre>"
        );
    }

    #[test]
    fn pre_prefix_does_not_match_other_tags() {
        assert_eq!(
            collapse_whitespace("<present>  x  </present>"),
            "<present> x </present>"
        );
    }

    #[test]
    fn invalid_utf8_is_a_step_error() {
        let step = MinifyMarkup::new(false);
        assert!(step.apply(data(&[0xff, 0xfe])).is_err());
    }
}
