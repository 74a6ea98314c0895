//! Plain-text preview: text with no Markdown structure, one paragraph per
//! run of non-empty lines, each with its own direction.
//!
//! No parsing happens here, so every line maps to its source by identity and
//! needs no alignment.

use std::collections::BTreeSet;

use crate::direction::classify_dominant;
use crate::source::SourceDocument;

use super::annotate::wrapper_element;
use super::builder::anchor_element;
use super::char_map::{CharMap, IdSequence};
use super::tree::{Element, Node};

/// A paragraph line after trimming: source line number, first char offset,
/// visible text.
struct ParagraphLine<'a> {
    line: usize,
    start: usize,
    text: &'a str,
}

pub struct PlainRender {
    pub fragment: Vec<Node>,
    pub char_map: CharMap,
    pub anchored_lines: BTreeSet<usize>,
}

pub fn render_plain(source: &SourceDocument) -> PlainRender {
    let mut ids = IdSequence::wrappers();
    let mut char_map = CharMap::new();
    let mut anchored_lines = BTreeSet::new();
    let mut container = Element::new("div").with_attr("class", "markdown-preview");

    for group in paragraphs(source) {
        let lines = trim_paragraph(&group);
        if lines.is_empty() {
            continue;
        }
        let text = lines.iter().map(|l| l.text).collect::<Vec<_>>().join("\n");
        let direction = classify_dominant(&text);

        let mut p = Element::new("p")
            .with_attr("dir", direction.as_str())
            .with_style("direction", direction.as_str())
            .with_style("text-align", direction.text_align())
            .with_style("white-space", "pre-wrap")
            .with_style("word-break", "break-word")
            .with_style("margin", "0 0 1rem 0");

        for (i, l) in lines.iter().enumerate() {
            if i > 0 {
                p.children.push(Node::text("\n"));
            }
            p.children.push(anchor_element(l.line).into());
            anchored_lines.insert(l.line);
            if !l.text.is_empty() {
                let id = ids.next_id();
                let len = l.text.chars().count();
                char_map.insert(id.clone(), (l.start..l.start + len).collect());
                p.children.push(wrapper_element(&id, l.line, l.text.to_string()).into());
            }
        }
        container.children.push(p.into());
    }

    PlainRender {
        fragment: vec![container.into()],
        char_map,
        anchored_lines,
    }
}

/// Runs of lines separated by empty lines.
fn paragraphs(source: &SourceDocument) -> Vec<Vec<(usize, &str)>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();
    for (n, line) in source.lines() {
        if line.is_empty() {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
        } else {
            current.push((n, line));
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Trims the paragraph as a whole: whitespace-only lines at either end go,
/// the first line loses leading and the last line trailing whitespace.
fn trim_paragraph<'a>(group: &[(usize, &'a str)]) -> Vec<ParagraphLine<'a>> {
    let Some(first) = group.iter().position(|(_, l)| !l.trim().is_empty()) else {
        return Vec::new();
    };
    let last = group
        .iter()
        .rposition(|(_, l)| !l.trim().is_empty())
        .unwrap_or(first);

    let kept = &group[first..=last];
    kept.iter()
        .enumerate()
        .map(|(i, &(line, text))| {
            let mut start = 0;
            let mut text = text;
            if i == 0 {
                let trimmed = text.trim_start();
                start = text[..text.len() - trimmed.len()].chars().count();
                text = trimmed;
            }
            if i == kept.len() - 1 {
                text = text.trim_end();
            }
            ParagraphLine { line, start, text }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tree::to_html;
    use pretty_assertions::assert_eq;

    fn plain(source: &str) -> PlainRender {
        render_plain(&SourceDocument::new(source))
    }

    #[test]
    fn single_ltr_paragraph() {
        let out = plain("Hello world");
        assert_eq!(
            to_html(&out.fragment),
            "<div class=\"markdown-preview\"><p dir=\"ltr\" style=\"direction: ltr; \
             text-align: left; white-space: pre-wrap; word-break: break-word; \
             margin: 0 0 1rem 0;\"><span class=\"src-anchor\" data-src-line=\"1\"></span>\
             <span class=\"char-wrapper\" data-cw=\"cw-1\" data-src-line=\"1\">Hello world\
             </span></p></div>"
        );
        assert_eq!(out.char_map.get("cw-1"), Some(&(0..11).collect::<Vec<_>>()[..]));
    }

    #[test]
    fn paragraphs_split_on_empty_lines() {
        let out = plain("سلام دنیا\n\nHello\nthere");
        let html = to_html(&out.fragment);
        assert!(html.contains("<p dir=\"rtl\""));
        assert!(html.contains("<p dir=\"ltr\""));
        assert_eq!(out.anchored_lines, BTreeSet::from([1, 3, 4]));
        assert_eq!(out.char_map.len(), 3);
    }

    #[test]
    fn trimmed_first_line_keeps_source_offsets() {
        let out = plain("   padded  ");
        assert_eq!(out.char_map.get("cw-1"), Some(&[3, 4, 5, 6, 7, 8][..]));
    }

    #[test]
    fn markup_is_escaped() {
        let html = to_html(&plain("a < b & c").fragment);
        assert!(html.contains(">a &lt; b &amp; c</span>"));
    }

    #[test]
    fn whitespace_only_paragraph_is_dropped() {
        let out = plain("a\n\n   \n\nb");
        assert_eq!(out.anchored_lines, BTreeSet::from([1, 5]));
    }
}
