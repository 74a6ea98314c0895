//! Builds the preview tree from `pulldown-cmark` events.
//!
//! Line anchors arrive as an inline HTML open tag followed by a separate
//! `</span>` event; both collapse into one empty anchor element.

use std::collections::HashMap;
use std::sync::LazyLock;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use super::RenderError;
use super::preprocess::ANCHOR_CLASS;
use super::tree::{Element, Node};

static ANCHOR_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^<span class="src-anchor" data-src-line="(\d+)">$"#)
        .expect("valid anchor pattern")
});

/// Extensions the preview parses.
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// An empty anchor element for 1-based `line`.
pub fn anchor_element(line: usize) -> Element {
    Element::new("span")
        .with_attr("class", ANCHOR_CLASS)
        .with_attr("data-src-line", line.to_string())
}

/// Parses preprocessed Markdown into a tree fragment.
pub fn build_tree(markdown: &str) -> Result<Vec<Node>, RenderError> {
    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(markdown, parser_options()) {
        builder.push_event(event)?;
    }
    builder.finish()
}

struct Frame {
    element: Element,
    /// Children are spliced into the parent on close.
    transparent: bool,
}

#[derive(Default)]
struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    body_open: bool,
    column: usize,
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Frame>,
    table: Option<TableState>,
    footnotes: HashMap<String, usize>,
    pending_anchor_closes: usize,
    /// Alt text being collected while inside an image.
    image_alt: Option<String>,
    /// Tags opened inside an image, ignored until they close.
    image_nesting: usize,
}

impl TreeBuilder {
    fn push_event(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        if self.image_alt.is_some() {
            return self.push_image_event(event);
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag)?,
            Event::Text(text) => self.append_text(&text),
            Event::Code(code) => {
                self.append(Element::new("code").with_child(Node::text(code.to_string())).into())
            }
            Event::InlineHtml(html) => self.inline_html(&html),
            Event::Html(html) => self.append(Node::Raw(html.to_string())),
            Event::SoftBreak | Event::HardBreak => self.append(Element::new("br").into()),
            Event::Rule => self.append(Element::new("hr").into()),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .with_attr("disabled", "")
                    .with_attr("type", "checkbox");
                if checked {
                    input.set_attr("checked", "");
                }
                self.append(input.into());
            }
            Event::FootnoteReference(label) => {
                let number = self.footnote_number(&label);
                let link = Element::new("a")
                    .with_attr("href", format!("#{label}"))
                    .with_child(Node::text(number.to_string()));
                self.append(
                    Element::new("sup")
                        .with_attr("class", "footnote-reference")
                        .with_child(link.into())
                        .into(),
                );
            }
            other => {
                log::trace!("ignoring unsupported event {other:?}");
            }
        }
        Ok(())
    }

    fn push_image_event(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        match event {
            Event::Start(_) => self.image_nesting += 1,
            Event::End(_) if self.image_nesting > 0 => self.image_nesting -= 1,
            Event::End(_) => {
                let alt = self.image_alt.take().unwrap_or_default();
                let mut frame = self.pop_frame("image")?;
                frame.element.set_attr("alt", alt);
                self.append(frame.element.into());
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some(alt) = self.image_alt.as_mut() {
                    alt.push_str(&t);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(alt) = self.image_alt.as_mut() {
                    alt.push(' ');
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) {
        let element = match tag {
            Tag::Paragraph => Element::new("p"),
            Tag::Heading { level, .. } => Element::new(format!("h{}", level as usize)),
            Tag::BlockQuote(_) => Element::new("blockquote"),
            Tag::CodeBlock(kind) => {
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind {
                    if let Some(lang) = info.split_whitespace().next() {
                        code.set_attr("class", format!("language-{lang}"));
                    }
                }
                self.push_frame(Element::new("pre"));
                code
            }
            Tag::HtmlBlock => {
                self.stack.push(Frame {
                    element: Element::new("html-block"),
                    transparent: true,
                });
                return;
            }
            Tag::List(Some(1)) => Element::new("ol"),
            Tag::List(Some(start)) => Element::new("ol").with_attr("start", start.to_string()),
            Tag::List(None) => Element::new("ul"),
            Tag::Item => Element::new("li"),
            Tag::FootnoteDefinition(label) => {
                let number = self.footnote_number(&label);
                let marker = Element::new("sup")
                    .with_attr("class", "footnote-definition-label")
                    .with_child(Node::text(number.to_string()));
                Element::new("div")
                    .with_attr("class", "footnote-definition")
                    .with_attr("id", label.to_string())
                    .with_child(marker.into())
            }
            Tag::Table(alignments) => {
                self.table = Some(TableState {
                    alignments,
                    ..TableState::default()
                });
                Element::new("table")
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                    table.column = 0;
                }
                self.push_frame(Element::new("thead"));
                Element::new("tr")
            }
            Tag::TableRow => {
                let open_body = match self.table.as_mut() {
                    Some(table) => {
                        table.column = 0;
                        !std::mem::replace(&mut table.body_open, true)
                    }
                    None => false,
                };
                if open_body {
                    self.push_frame(Element::new("tbody"));
                }
                Element::new("tr")
            }
            Tag::TableCell => self.table_cell(),
            Tag::Emphasis => Element::new("em"),
            Tag::Strong => Element::new("strong"),
            Tag::Strikethrough => Element::new("del"),
            Tag::Link { dest_url, title, .. } => {
                let mut a = Element::new("a").with_attr("href", dest_url.to_string());
                if !title.is_empty() {
                    a.set_attr("title", title.to_string());
                }
                a
            }
            Tag::Image { dest_url, title, .. } => {
                let mut img = Element::new("img").with_attr("src", dest_url.to_string());
                if !title.is_empty() {
                    img.set_attr("title", title.to_string());
                }
                self.image_alt = Some(String::new());
                img
            }
            other => {
                log::trace!("rendering unsupported tag {other:?} as a div");
                Element::new("div")
            }
        };
        self.push_frame(element);
    }

    fn table_cell(&mut self) -> Element {
        let Some(table) = self.table.as_mut() else {
            return Element::new("td");
        };
        let mut cell = Element::new(if table.in_head { "th" } else { "td" });
        let align = match table.alignments.get(table.column) {
            Some(Alignment::Left) => Some("left"),
            Some(Alignment::Center) => Some("center"),
            Some(Alignment::Right) => Some("right"),
            _ => None,
        };
        if let Some(align) = align {
            cell.set_style("text-align", align);
        }
        table.column += 1;
        cell
    }

    fn end(&mut self, tag: TagEnd) -> Result<(), RenderError> {
        match tag {
            TagEnd::CodeBlock => {
                self.close_frame("code block")?;
                self.close_frame("code block")
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = false;
                }
                self.close_frame("table head row")?;
                self.close_frame("table head")
            }
            TagEnd::Table => {
                if self.table.take().is_some_and(|t| t.body_open) {
                    self.close_frame("table body")?;
                }
                self.close_frame("table")
            }
            other => self.close_frame(&format!("{other:?}")),
        }
    }

    fn inline_html(&mut self, html: &str) {
        if let Some(line) = ANCHOR_OPEN
            .captures(html)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
        {
            self.pending_anchor_closes += 1;
            self.append(anchor_element(line).into());
        } else if html == "</span>" && self.pending_anchor_closes > 0 {
            self.pending_anchor_closes -= 1;
        } else {
            self.append(Node::Raw(html.to_string()));
        }
    }

    fn footnote_number(&mut self, label: &str) -> usize {
        let next = self.footnotes.len() + 1;
        *self.footnotes.entry(label.to_string()).or_insert(next)
    }

    fn push_frame(&mut self, element: Element) {
        self.stack.push(Frame {
            element,
            transparent: false,
        });
    }

    fn pop_frame(&mut self, what: &str) -> Result<Frame, RenderError> {
        self.stack
            .pop()
            .ok_or_else(|| RenderError::UnbalancedEnd(what.to_string()))
    }

    fn close_frame(&mut self, what: &str) -> Result<(), RenderError> {
        let frame = self.pop_frame(what)?;
        if frame.transparent {
            for child in frame.element.children {
                self.append(child);
            }
        } else {
            self.append(frame.element.into());
        }
        Ok(())
    }

    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.element.children,
            None => &mut self.root,
        }
    }

    fn append(&mut self, node: Node) {
        if let Node::Text(text) = &node {
            self.append_text(text);
            return;
        }
        self.children_mut().push(node);
    }

    /// Appends text, merging with a preceding text node.
    fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let children = self.children_mut();
        match children.last_mut() {
            Some(Node::Text(prev)) => prev.push_str(text),
            _ => children.push(Node::text(text)),
        }
    }

    fn finish(self) -> Result<Vec<Node>, RenderError> {
        if !self.stack.is_empty() {
            return Err(RenderError::Unclosed(self.stack.len()));
        }
        Ok(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tree::to_html;
    use pretty_assertions::assert_eq;

    fn html(markdown: &str) -> String {
        to_html(&build_tree(markdown).unwrap())
    }

    #[test]
    fn paragraph_and_emphasis() {
        assert_eq!(html("a *b* **c**"), "<p>a <em>b</em> <strong>c</strong></p>");
    }

    #[test]
    fn soft_breaks_become_br() {
        assert_eq!(html("one\ntwo"), "<p>one<br />two</p>");
    }

    #[test]
    fn anchors_collapse_to_one_element() {
        let tree = build_tree(r#"# <span class="src-anchor" data-src-line="1"></span>Title"#).unwrap();
        assert_eq!(
            to_html(&tree),
            r#"<h1><span class="src-anchor" data-src-line="1"></span>Title</h1>"#
        );
        let h1 = tree[0].as_element().unwrap();
        assert_eq!(h1.children.len(), 2);
    }

    #[test]
    fn other_inline_html_is_raw() {
        assert_eq!(html("a <b>x</b>"), "<p>a <b>x</b></p>");
    }

    #[test]
    fn fenced_code_keeps_language() {
        assert_eq!(
            html("```rust\nfn x() {}\n```"),
            "<pre><code class=\"language-rust\">fn x() {}\n</code></pre>"
        );
    }

    #[test]
    fn tables_get_head_and_body() {
        assert_eq!(
            html("| a | b |\n|:--|--:|\n| 1 | 2 |"),
            "<table><thead><tr><th style=\"text-align: left;\">a</th>\
             <th style=\"text-align: right;\">b</th></tr></thead>\
             <tbody><tr><td style=\"text-align: left;\">1</td>\
             <td style=\"text-align: right;\">2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn image_alt_is_collected() {
        assert_eq!(
            html("![a *b*](x.png \"t\")"),
            "<p><img src=\"x.png\" title=\"t\" alt=\"a b\" /></p>"
        );
    }

    #[test]
    fn task_list_markers() {
        assert_eq!(
            html("- [x] done"),
            "<ul><li><input disabled=\"\" type=\"checkbox\" checked=\"\" />done</li></ul>"
        );
    }

    #[test]
    fn ordered_list_start() {
        assert_eq!(html("3. c"), "<ol start=\"3\"><li>c</li></ol>");
    }

    #[test]
    fn footnotes_are_numbered() {
        let out = html("x[^n]\n\n[^n]: note");
        assert!(out.contains(r##"<sup class="footnote-reference"><a href="#n">1</a></sup>"##));
        assert!(out.contains(r#"<div class="footnote-definition" id="n">"#));
    }

    #[test]
    fn html_blocks_pass_through() {
        assert!(html("<div>\nhi\n</div>").starts_with("<div>\nhi\n</div>"));
    }
}
