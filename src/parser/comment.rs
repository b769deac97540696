//! Comment sigil decoder.
//!
//! Turns raw C/C++ comment text into a [`CommentToken`]:
//! - `///`, `//!`, `//` line comments
//! - `/** */`, `/*! */`, `/* */` block comments, continuation `*` stripped
//! - the marker right after the opener picks the attachment:
//!   `!!` opens a group, `<` / `!<` documents the preceding declaration,
//!   anything else documents the following one

use crate::config::CommentConfig;
use crate::model::{Attachment, CommentToken, RawComment};
use regex::Regex;
use std::sync::LazyLock;

static RE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//(/?)([!<]{0,2})(.*)$").unwrap());

static RE_BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/\*(\*?)([!<]{0,2})(.*)$").unwrap());

static RE_BLOCK_CONT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:space:]]*\*(.*)$").unwrap());

/// Comment text with its opener and marker removed.
#[derive(Debug, PartialEq, Eq)]
struct Cleaned {
    /// Opened with `///`, `//!`, `/**` or `/*!`
    doc: bool,
    marker: String,
    lines: Vec<String>,
}

/// Decode one raw comment. Returns `None` when `doc_only` is set and the
/// comment carries no doc opener.
pub fn decode(raw: &RawComment, config: &CommentConfig) -> Option<CommentToken> {
    let cleaned = clean(&raw.text);
    if config.doc_only && !cleaned.doc {
        tracing::debug!(offset = raw.offset, "skipping plain comment");
        return None;
    }

    let attachment = raw.attachment.unwrap_or_else(|| {
        if cleaned.marker == config.group_marker {
            Attachment::GroupStart
        } else if config.trailing_markers.iter().any(|m| *m == cleaned.marker) {
            Attachment::Trailing
        } else {
            Attachment::Leading
        }
    });

    let text = if attachment == Attachment::GroupStart {
        group_text(cleaned.lines)
    } else {
        normalize(cleaned.lines).join("\n")
    };

    Some(CommentToken::new(text, raw.offset, attachment))
}

/// Decode all comments of a pass, sorted by offset.
pub fn decode_all(raw: &[RawComment], config: &CommentConfig) -> Vec<CommentToken> {
    let mut tokens: Vec<CommentToken> = raw.iter().filter_map(|c| decode(c, config)).collect();
    tokens.sort_by_key(|t| t.offset);
    tokens
}

fn clean(text: &str) -> Cleaned {
    let text = text.trim_end();
    if text.starts_with("//") {
        clean_line(text)
    } else if text.starts_with("/*") {
        clean_block(text)
    } else {
        // Already stripped by the analyzer.
        Cleaned {
            doc: true,
            marker: String::new(),
            lines: text.lines().map(str::to_string).collect(),
        }
    }
}

fn clean_line(text: &str) -> Cleaned {
    // Line comments never span lines; anything after a newline is kept verbatim.
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default();
    let Some(caps) = RE_LINE.captures(first) else {
        return Cleaned {
            doc: false,
            marker: String::new(),
            lines: vec![first.trim_start_matches('/').to_string()],
        };
    };
    let marker = caps[2].to_string();
    let doc = !caps[1].is_empty() || marker.starts_with('!');
    let mut out = vec![caps[3].to_string()];
    out.extend(lines.map(str::to_string));
    Cleaned {
        doc,
        marker,
        lines: out,
    }
}

fn clean_block(text: &str) -> Cleaned {
    let body = text.strip_suffix("*/").unwrap_or(text);
    let mut doc = false;
    let mut marker = String::new();
    let mut lines = Vec::new();

    for (i, line) in body.lines().enumerate() {
        if i == 0 {
            match RE_BLOCK_START.captures(line) {
                Some(caps) => {
                    marker = caps[2].to_string();
                    doc = !caps[1].is_empty() || marker.starts_with('!');
                    lines.push(caps[3].to_string());
                }
                None => lines.push(line.to_string()),
            }
        } else {
            match RE_BLOCK_CONT.captures(line) {
                Some(caps) => lines.push(caps[1].to_string()),
                None => lines.push(line.to_string()),
            }
        }
    }

    // `/** foo */` on a single line leaves no continuation to trim
    if let Some(last) = lines.last_mut() {
        *last = last.trim_end().to_string();
    }
    Cleaned { doc, marker, lines }
}

/// Drop blank leading/trailing lines and the indentation shared by all
/// non-blank lines.
fn normalize(lines: Vec<String>) -> Vec<String> {
    let lines: Vec<String> = lines
        .into_iter()
        .map(|l| l.replace('\t', "    ").trim_end().to_string())
        .collect();

    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return Vec::new();
    };
    let lines = &lines[first..=last];

    // Counted in chars: pasted docs often indent with U+00A0.
    let indent = lines
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    lines.iter().map(|l| l.chars().skip(indent).collect()).collect()
}

/// First non-blank line is the group name; the rest stays as documentation.
fn group_text(lines: Vec<String>) -> String {
    let mut lines = lines.into_iter().skip_while(|l| l.trim().is_empty());
    let name = lines.next().unwrap_or_default().trim().to_string();
    let rest = normalize(lines.collect());
    if rest.is_empty() {
        name
    } else {
        format!("{}\n{}", name, rest.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str, offset: usize) -> RawComment {
        RawComment {
            text: text.to_string(),
            offset,
            attachment: None,
        }
    }

    fn decode_default(text: &str) -> CommentToken {
        decode(&raw(text, 0), &CommentConfig::default()).unwrap()
    }

    #[test]
    fn leading_line_comment() {
        let tok = decode_default("/// Inner class.");
        assert_eq!(tok.attachment, Attachment::Leading);
        assert_eq!(tok.text, "Inner class.");
    }

    #[test]
    fn trailing_markers() {
        assert_eq!(decode_default("///< after").attachment, Attachment::Trailing);
        assert_eq!(decode_default("//!< after").attachment, Attachment::Trailing);
        assert_eq!(decode_default("/**< after */").attachment, Attachment::Trailing);
    }

    #[test]
    fn group_with_documentation() {
        let tok = decode_default("/*!! Helpers\n * Small utilities.\n */");
        assert_eq!(tok.attachment, Attachment::GroupStart);
        let (name, doc) = tok.group_header();
        assert_eq!(name, "Helpers");
        assert_eq!(doc.as_deref(), Some("Small utilities."));
    }

    #[test]
    fn line_group_marker() {
        let tok = decode_default("//!! Advanced");
        assert_eq!(tok.attachment, Attachment::GroupStart);
        assert_eq!(tok.text, "Advanced");
    }

    #[test]
    fn block_comment_keeps_relative_indent() {
        let tok = decode_default("/**\n * Parameters:\n *   x - Number\n */");
        assert_eq!(tok.text, "Parameters:\n  x - Number");
    }

    #[test]
    fn non_ascii_indentation_is_stripped_by_char() {
        let tok = decode_default("/**\n *\u{a0}Uses NBSP.\n * one space\n */");
        assert_eq!(tok.text, "Uses NBSP.\none space");

        let tok = decode_default("/**\n *\u{3000}\u{3000}wide\n *  two\n */");
        assert_eq!(tok.text, "wide\ntwo");
    }

    #[test]
    fn doc_only_skips_plain_comments() {
        let config = CommentConfig {
            doc_only: true,
            ..Default::default()
        };
        assert!(decode(&raw("// just a note", 0), &config).is_none());
        assert!(decode(&raw("/* block */", 0), &config).is_none());
        assert!(decode(&raw("/// doc", 0), &config).is_some());
        assert!(decode(&raw("/*! doc */", 0), &config).is_some());
    }

    #[test]
    fn explicit_attachment_wins() {
        let mut c = raw("Helpers", 20);
        c.attachment = Some(Attachment::GroupStart);
        let tok = decode(&c, &CommentConfig::default()).unwrap();
        assert_eq!(tok.attachment, Attachment::GroupStart);
        assert_eq!(tok.text, "Helpers");
    }

    #[test]
    fn configured_group_marker() {
        let config = CommentConfig {
            group_marker: "<!".to_string(),
            ..Default::default()
        };
        let tok = decode(&raw("//<! Section", 0), &config).unwrap();
        assert_eq!(tok.attachment, Attachment::GroupStart);
    }

    #[test]
    fn decode_all_sorts_by_offset() {
        let tokens = decode_all(
            &[raw("/// b", 30), raw("/// a", 10)],
            &CommentConfig::default(),
        );
        assert_eq!(tokens[0].offset, 10);
        assert_eq!(tokens[1].offset, 30);
    }
}
