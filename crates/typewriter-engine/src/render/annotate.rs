//! # Tree Annotation
//!
//! Runs over a freshly built preview tree and adds everything position sync
//! needs:
//!
//! - heading `id`s matching the outline;
//! - a char wrapper around every text leaf outside `<pre>`, with the wrapper's
//!   slice of the source alignment stored in the [`CharMap`];
//! - per-cell source ranges on table rows;
//! - optional per-block direction.
//!
//! Text is grouped by anchor segment: every leaf after the anchor for line
//! `L` and before the next anchor belongs to line `L`. A segment's leaves are
//! concatenated and aligned against that source line in one go, so a line
//! split over several inline elements still maps char for char.

use std::collections::BTreeSet;

use crate::align::align;
use crate::direction::{Direction, classify_dominant};
use crate::outline::{heading_id, parse_heading_line};
use crate::source::SourceDocument;

use super::char_map::{CharMap, IdSequence};
use super::preprocess::ANCHOR_CLASS;
use super::table::cell_ranges;
use super::tree::{Element, Node};

/// Class carried by char wrappers.
pub const WRAPPER_CLASS: &str = "char-wrapper";

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Blocks that receive a direction when auto direction is on.
const DIRECTION_TAGS: [&str; 9] = ["p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote"];

const ACCENT_BORDER: &str = "4px solid hsl(217, 91%, 60%)";

/// What annotation recorded about the tree.
#[derive(Debug, Default)]
pub struct Annotation {
    pub char_map: CharMap,
    pub anchored_lines: BTreeSet<usize>,
}

/// Line of an anchor element.
pub fn anchor_line(el: &Element) -> Option<usize> {
    if el.is("span") && el.has_class(ANCHOR_CLASS) {
        el.attr("data-src-line")?.parse().ok()
    } else {
        None
    }
}

/// Id and line of a char wrapper element.
pub fn wrapper_info(el: &Element) -> Option<(&str, usize)> {
    if !el.has_class(WRAPPER_CLASS) {
        return None;
    }
    Some((el.attr("data-cw")?, el.attr("data-src-line")?.parse().ok()?))
}

/// A char wrapper around `text` for source line `line`.
pub fn wrapper_element(id: &str, line: usize, text: String) -> Element {
    Element::new("span")
        .with_attr("class", WRAPPER_CLASS)
        .with_attr("data-cw", id)
        .with_attr("data-src-line", line.to_string())
        .with_child(Node::Text(text))
}

/// Annotates `nodes` in place.
pub fn annotate(nodes: &mut [Node], source: &SourceDocument, auto_direction: bool) -> Annotation {
    let mut annotation = Annotation::default();
    collect_anchored_lines(nodes, &mut annotation.anchored_lines);

    assign_heading_ids(nodes, source, &mut None);
    wrap_text(nodes, source, &mut annotation.char_map);
    tag_tables(nodes, source, &mut None);
    if auto_direction {
        apply_direction(nodes);
    }

    log::debug!(
        "annotated preview: {} anchored lines, {} char wrappers",
        annotation.anchored_lines.len(),
        annotation.char_map.len()
    );
    annotation
}

fn collect_anchored_lines(nodes: &[Node], lines: &mut BTreeSet<usize>) {
    for el in nodes.iter().filter_map(Node::as_element) {
        match anchor_line(el) {
            Some(line) => {
                lines.insert(line);
            }
            None => collect_anchored_lines(&el.children, lines),
        }
    }
}

fn first_anchor(nodes: &[Node]) -> Option<usize> {
    nodes
        .iter()
        .filter_map(Node::as_element)
        .find_map(|el| anchor_line(el).or_else(|| first_anchor(&el.children)))
}

fn first_wrapper_line(nodes: &[Node]) -> Option<usize> {
    nodes.iter().filter_map(Node::as_element).find_map(|el| {
        wrapper_info(el)
            .map(|(_, line)| line)
            .or_else(|| first_wrapper_line(&el.children))
    })
}

fn assign_heading_ids(nodes: &mut [Node], source: &SourceDocument, last_anchor: &mut Option<usize>) {
    for el in nodes.iter_mut().filter_map(Node::as_element_mut) {
        if let Some(line) = anchor_line(el) {
            *last_anchor = Some(line);
            continue;
        }
        if HEADING_TAGS.contains(&el.tag.as_str()) {
            if let Some(line) = first_anchor(&el.children).or(*last_anchor) {
                let id = match source.line(line).and_then(parse_heading_line) {
                    Some((_, text)) => heading_id(text, line),
                    None => heading_id(&el.text_content(), line),
                };
                el.set_attr("id", id);
            }
        }
        assign_heading_ids(&mut el.children, source, last_anchor);
    }
}

/// A text leaf seen by the first wrapping pass.
struct Leaf {
    segment: Option<usize>,
    text: String,
}

/// Where one leaf maps: its source line and per-char offsets.
type LeafMapping = Option<(usize, Vec<usize>)>;

fn wrap_text(nodes: &mut [Node], source: &SourceDocument, char_map: &mut CharMap) {
    let mut leaves = Vec::new();
    collect_leaves(nodes, &mut None, &mut leaves);

    let mut plan = align_segments(&leaves, source).into_iter();
    let mut ids = IdSequence::wrappers();
    replace_leaves(nodes, &mut plan, &mut ids, char_map);
}

fn collect_leaves(nodes: &[Node], segment: &mut Option<usize>, leaves: &mut Vec<Leaf>) {
    for node in nodes {
        match node {
            Node::Element(el) => {
                if let Some(line) = anchor_line(el) {
                    *segment = Some(line);
                } else if !el.is("pre") {
                    collect_leaves(&el.children, segment, leaves);
                }
            }
            Node::Text(text) => leaves.push(Leaf {
                segment: *segment,
                text: text.clone(),
            }),
            Node::Raw(_) => {}
        }
    }
}

/// Aligns each run of same-segment leaves against its source line and
/// slices the result back per leaf.
fn align_segments(leaves: &[Leaf], source: &SourceDocument) -> Vec<LeafMapping> {
    let mut plan = Vec::with_capacity(leaves.len());
    let mut start = 0;
    while start < leaves.len() {
        let segment = leaves[start].segment;
        let end = leaves[start..]
            .iter()
            .position(|l| l.segment != segment)
            .map_or(leaves.len(), |p| start + p);
        let group = &leaves[start..end];

        match segment {
            Some(line) => {
                let rendered: String = group.iter().map(|l| l.text.as_str()).collect();
                let offsets = align(source.line(line).unwrap_or(""), &rendered);
                let mut at = 0;
                for leaf in group {
                    let len = leaf.text.chars().count();
                    plan.push(Some((line, offsets[at..at + len].to_vec())));
                    at += len;
                }
            }
            None => plan.extend(group.iter().map(|_| None)),
        }
        start = end;
    }
    plan
}

fn replace_leaves(
    nodes: &mut [Node],
    plan: &mut impl Iterator<Item = LeafMapping>,
    ids: &mut IdSequence,
    char_map: &mut CharMap,
) {
    for node in nodes.iter_mut() {
        match node {
            Node::Element(el) => {
                if anchor_line(el).is_none() && !el.is("pre") {
                    replace_leaves(&mut el.children, plan, ids, char_map);
                }
            }
            Node::Text(text) => {
                if let Some(Some((line, offsets))) = plan.next() {
                    let id = ids.next_id();
                    char_map.insert(id.clone(), offsets);
                    *node = wrapper_element(&id, line, std::mem::take(text)).into();
                }
            }
            Node::Raw(_) => {}
        }
    }
}

fn tag_tables(nodes: &mut [Node], source: &SourceDocument, last_anchor: &mut Option<usize>) {
    for el in nodes.iter_mut().filter_map(Node::as_element_mut) {
        if let Some(line) = anchor_line(el) {
            *last_anchor = Some(line);
            continue;
        }
        if el.is("tr") {
            let line = first_wrapper_line(&el.children)
                .or_else(|| first_anchor(&el.children))
                .or(*last_anchor);
            tag_row(el, line, source);
        }
        tag_tables(&mut el.children, source, last_anchor);
    }
}

fn tag_row(row: &mut Element, line: Option<usize>, source: &SourceDocument) {
    let ranges = line
        .and_then(|l| source.line(l))
        .map(cell_ranges)
        .unwrap_or_default();
    if let Some(line) = line {
        row.set_attr("data-src-line", line.to_string());
    }

    let cells = row
        .children
        .iter_mut()
        .filter_map(Node::as_element_mut)
        .filter(|c| c.is("th") || c.is("td"));
    for (col, cell) in cells.enumerate() {
        cell.set_attr("data-col", col.to_string());
        if let Some(range) = ranges.get(col) {
            cell.set_attr("data-src-start", range.start.to_string());
            cell.set_attr("data-src-end", range.end.to_string());
        }
    }
}

fn apply_direction(nodes: &mut [Node]) {
    for el in nodes.iter_mut().filter_map(Node::as_element_mut) {
        if DIRECTION_TAGS.contains(&el.tag.as_str()) {
            let direction = classify_dominant(&el.text_content());
            set_direction(el, direction);
        }
        apply_direction(&mut el.children);
    }
}

/// Sets `dir`, `direction` and `text-align`, and moves a blockquote's accent
/// border to the leading side.
pub fn set_direction(el: &mut Element, direction: Direction) {
    el.set_attr("dir", direction.as_str());
    el.set_style("direction", direction.as_str());
    el.set_style("text-align", direction.text_align());

    if el.is("blockquote") {
        let (lead, trail) = match direction {
            Direction::Rtl => ("right", "left"),
            Direction::Ltr => ("left", "right"),
        };
        el.set_style(&format!("border-{lead}"), ACCENT_BORDER);
        el.set_style(&format!("border-{trail}"), "none");
        el.set_style(&format!("padding-{lead}"), "1rem");
        el.set_style(&format!("padding-{trail}"), "0.5em");
    }
}
