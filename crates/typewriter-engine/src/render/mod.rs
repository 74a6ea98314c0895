//! # Preview Rendering
//!
//! Turns editor source into preview HTML plus the data position sync needs:
//! line anchors, char wrappers and the char map.
//!
//! ## Paths
//!
//! - **Plain text** ([`RenderPath::PlainText`]): source with no Markdown
//!   structure and auto direction on. Paragraphs are split on empty lines
//!   and styled per direction without parsing.
//! - **Markdown** ([`RenderPath::Markdown`]): preprocess, parse, build the
//!   tree, annotate, serialise.
//! - **Escaped** ([`RenderPath::Escaped`]): the whole source escaped into one
//!   paragraph. Only used when Markdown rendering fails with auto direction
//!   off.
//!
//! [`render`] never fails. A Markdown failure is logged and falls back to the
//! plain-text path (auto direction on) or the escaped path.
//!
//! ## Modules
//!
//! - **`preprocess`**: line anchors and image placeholders
//! - **`builder`**: parser events → [`tree::Node`] fragment
//! - **`annotate`**: heading ids, char wrappers, table ranges, direction
//! - **`plain`**: the plain-text path
//! - **`table`**: table row cell ranges
//! - **`char_map`**: wrapper → source offsets, and its `<script>` side channel
//! - **`images`**: recovering image snippets from placeholders
//! - **`syntax`**: block prefix delimiters and a char cursor
//! - **`tree`**: the preview tree and its serialisation

pub mod annotate;
pub mod builder;
pub mod char_map;
pub mod images;
pub mod plain;
pub mod preprocess;
pub mod syntax;
pub mod table;
pub mod tree;

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::source::SourceDocument;

pub use char_map::CharMap;
pub use table::{TableCellRange, cell_ranges};
pub use tree::{Element, Node};

/// Markers that make a document Markdown rather than plain text.
static MARKDOWN_STRUCTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(^#{1,6}\s)|(^\s*[-*+]\s)|(^\s*\d+\.\s)|(```)|(`[^`]+`)|(\[[^\]]+\]\([^\)]+\))|(^>\s)|(^-{3,}\s*$)",
    )
    .expect("valid markdown structure pattern")
});

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Unbalanced end tag: {0}")]
    UnbalancedEnd(String),
    #[error("{0} element(s) still open at end of input")]
    Unclosed(usize),
    #[error("Char map serialisation failed: {0}")]
    CharMap(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderPath {
    PlainText,
    Markdown,
    Escaped,
}

/// One render of the source. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub html: String,
    pub char_map: CharMap,
    pub path: RenderPath,
    /// The tree `html` was serialised from.
    pub fragment: Vec<Node>,
    /// Source lines that have an anchor in the preview.
    pub anchored_lines: BTreeSet<usize>,
}

impl RenderOutput {
    fn empty(path: RenderPath) -> Self {
        Self {
            html: String::new(),
            char_map: CharMap::new(),
            path,
            fragment: Vec::new(),
            anchored_lines: BTreeSet::new(),
        }
    }

    fn from_fragment(
        fragment: Vec<Node>,
        char_map: CharMap,
        anchored_lines: BTreeSet<usize>,
        path: RenderPath,
    ) -> Self {
        Self {
            html: tree::to_html(&fragment),
            char_map,
            path,
            fragment,
            anchored_lines,
        }
    }

    /// `html` followed by the char map `<script>` element.
    pub fn embedded_html(&self) -> Result<String, RenderError> {
        Ok(format!("{}{}", self.html, self.char_map.to_script()?))
    }

    pub fn is_anchored(&self, line: usize) -> bool {
        self.anchored_lines.contains(&line)
    }

    /// The closest anchored line at or before `line`.
    pub fn anchored_at_or_before(&self, line: usize) -> Option<usize> {
        self.anchored_lines.range(..=line).next_back().copied()
    }
}

/// Whether the source contains any Markdown structure.
pub fn looks_like_markdown(source: &str) -> bool {
    MARKDOWN_STRUCTURE.is_match(source)
}

/// The path a successful render of `source` takes.
pub fn choose_path(source: &str, auto_direction: bool) -> RenderPath {
    if auto_direction && !looks_like_markdown(source) {
        RenderPath::PlainText
    } else {
        RenderPath::Markdown
    }
}

/// Renders `source` for the preview.
pub fn render(source: &str, auto_direction: bool) -> RenderOutput {
    let path = choose_path(source, auto_direction);
    if source.is_empty() {
        return RenderOutput::empty(path);
    }
    let doc = SourceDocument::new(source);

    match path {
        RenderPath::PlainText => render_plain(&doc),
        RenderPath::Markdown => render_markdown(&doc, auto_direction).unwrap_or_else(|err| {
            log::warn!("Markdown render failed, falling back: {err}");
            if auto_direction {
                render_plain(&doc)
            } else {
                render_escaped(source)
            }
        }),
        RenderPath::Escaped => render_escaped(source),
    }
}

fn render_plain(doc: &SourceDocument) -> RenderOutput {
    let out = plain::render_plain(doc);
    RenderOutput::from_fragment(
        out.fragment,
        out.char_map,
        out.anchored_lines,
        RenderPath::PlainText,
    )
}

fn render_markdown(doc: &SourceDocument, auto_direction: bool) -> Result<RenderOutput, RenderError> {
    let mut images = char_map::IdSequence::images();
    let preprocessed = preprocess::preprocess(doc.text(), &mut images);
    let mut fragment = builder::build_tree(&preprocessed)?;
    let annotation = annotate::annotate(&mut fragment, doc, auto_direction);
    Ok(RenderOutput::from_fragment(
        fragment,
        annotation.char_map,
        annotation.anchored_lines,
        RenderPath::Markdown,
    ))
}

fn render_escaped(source: &str) -> RenderOutput {
    let p = Element::new("p").with_child(Node::text(source));
    RenderOutput::from_fragment(
        vec![p.into()],
        CharMap::new(),
        BTreeSet::new(),
        RenderPath::Escaped,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("# Title", true)]
    #[case("- item", true)]
    #[case("  * item", true)]
    #[case("12. item", true)]
    #[case("```\ncode", true)]
    #[case("some `code` here", true)]
    #[case("a [link](http://x)", true)]
    #[case("> quote", true)]
    #[case("text\n---", true)]
    #[case("Hello world", false)]
    #[case("#hashtag only", false)]
    #[case("سلام دنیا", false)]
    #[case("| a | b |\n| - | - |", false)]
    fn markdown_detection(#[case] source: &str, #[case] expected: bool) {
        assert_eq!(looks_like_markdown(source), expected);
    }

    #[test]
    fn path_selection() {
        assert_eq!(choose_path("Hello", true), RenderPath::PlainText);
        assert_eq!(choose_path("Hello", false), RenderPath::Markdown);
        assert_eq!(choose_path("# Hello", true), RenderPath::Markdown);
    }

    #[test]
    fn empty_source_renders_nothing() {
        let out = render("", true);
        assert_eq!(out.html, "");
        assert!(out.char_map.is_empty());
        assert!(out.fragment.is_empty());
    }

    #[test]
    fn plain_text_without_auto_direction_goes_through_markdown() {
        let out = render("Hello world", false);
        assert_eq!(out.path, RenderPath::Markdown);
        assert!(out.html.starts_with("<p><span class=\"src-anchor\" data-src-line=\"1\">"));
    }

    #[test]
    fn escaped_path_escapes_everything() {
        let out = render_escaped("a <b> & c");
        assert_eq!(out.html, "<p>a &lt;b&gt; &amp; c</p>");
        assert_eq!(out.path, RenderPath::Escaped);
    }

    #[test]
    fn anchored_line_lookup() {
        let out = render("# a\n\ntext\n\n```\nx\n```\n", true);
        assert!(out.is_anchored(1));
        assert!(out.is_anchored(3));
        assert!(!out.is_anchored(6));
        assert_eq!(out.anchored_at_or_before(6), Some(3));
        assert_eq!(out.anchored_at_or_before(0), None);
    }

    #[test]
    fn embedded_html_round_trips_char_map() {
        let out = render("# Hi\n\nthere", true);
        let embedded = out.embedded_html().unwrap();
        assert!(embedded.starts_with(&out.html));
        assert_eq!(CharMap::from_embedded(&embedded).unwrap(), Some(out.char_map));
    }
}
