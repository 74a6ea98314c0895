//! Preview click → source caret.
//!
//! The precise route goes through the char wrapper around the hit text and
//! its char map entry. When there is no usable wrapper the line comes from
//! the last anchor or wrapper before the hit, and the column is estimated
//! from how far into its block the hit landed.

use crate::render::RenderOutput;
use crate::render::annotate::{anchor_line, wrapper_info};
use crate::render::tree::{Node, node_at_path};
use crate::source::SourceDocument;

use super::host::TextHit;

/// Block elements used for the estimated column.
const BLOCK_TAGS: [&str; 14] = [
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "td", "th", "pre", "div", "tr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Read from the char map.
    Exact,
    /// Estimated from the hit's position within its block.
    Estimated,
}

/// Where a click puts the caret. `line` and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretTarget {
    pub line: usize,
    pub column: usize,
    pub precision: Precision,
}

/// Maps a hit in `output.fragment` back to a source position.
///
/// Returns `None` only when nothing before the hit maps to a line.
pub fn resolve_click(output: &RenderOutput, source: &SourceDocument, hit: &TextHit) -> Option<CaretTarget> {
    let nodes = &output.fragment;
    node_at_path(nodes, &hit.path)?;

    let wrapper = (1..=hit.path.len()).rev().find_map(|depth| {
        let prefix = &hit.path[..depth];
        let el = node_at_path(nodes, prefix)?.as_element()?;
        wrapper_info(el).map(|(id, line)| (prefix, id, line))
    });

    if let Some((prefix, id, line)) = wrapper {
        if let Some(offsets) = output.char_map.get(id).filter(|o| !o.is_empty()) {
            let wrapper_node = node_at_path(nodes, prefix)?;
            let index = chars_before(wrapper_node, &hit.path[prefix.len()..], hit.offset);
            let line_len = source.line_len_chars(line);
            let column = match offsets.get(index) {
                Some(offset) => offset + 1,
                // past the last char: one past the last mapped one
                None => offsets.last().map_or(1, |last| last + 2).min(line_len + 1),
            };
            return Some(CaretTarget {
                line,
                column,
                precision: Precision::Exact,
            });
        }
        log::debug!("wrapper {id} has no char map entry, estimating");
    }

    estimate(output, source, hit)
}

fn estimate(output: &RenderOutput, source: &SourceDocument, hit: &TextHit) -> Option<CaretTarget> {
    let nodes = &output.fragment;
    let mut line = None;
    preceding_line(nodes, &mut Vec::new(), &hit.path, &mut line);
    let line = line?;

    let block = (1..=hit.path.len()).rev().find_map(|depth| {
        let prefix = &hit.path[..depth];
        let el = node_at_path(nodes, prefix)?.as_element()?;
        BLOCK_TAGS.contains(&el.tag.as_str()).then_some(prefix)
    });
    let line_len = source.line_len_chars(line);
    let column = match block.and_then(|prefix| Some((prefix, node_at_path(nodes, prefix)?))) {
        Some((prefix, block_node)) => {
            let total = block_node.text_content().chars().count();
            let offset = chars_before(block_node, &hit.path[prefix.len()..], hit.offset);
            if total == 0 {
                1
            } else {
                let ratio = offset as f64 / total as f64;
                ((ratio * line_len as f64).round() as usize + 1).min(line_len + 1)
            }
        }
        None => 1,
    };

    Some(CaretTarget {
        line,
        column,
        precision: Precision::Estimated,
    })
}

/// Chars of text inside `node` before the hit at relative path `rel`, plus
/// the hit offset when the hit is a text node.
fn chars_before(node: &Node, rel: &[usize], offset: usize) -> usize {
    match rel.split_first() {
        None => match node {
            Node::Text(t) => offset.min(t.chars().count()),
            _ => 0,
        },
        Some((&index, rest)) => {
            let children = node.children();
            let before: usize = children
                .iter()
                .take(index)
                .map(|c| c.text_content().chars().count())
                .sum();
            before + children.get(index).map_or(0, |c| chars_before(c, rest, offset))
        }
    }
}

/// Walks in document order up to `target`, recording the line of every
/// anchor and wrapper passed. Returns true once the target is reached.
fn preceding_line(nodes: &[Node], prefix: &mut Vec<usize>, target: &[usize], line: &mut Option<usize>) -> bool {
    for (i, node) in nodes.iter().enumerate() {
        prefix.push(i);
        if let Node::Element(el) = node {
            if let Some(l) = anchor_line(el).or_else(|| wrapper_info(el).map(|(_, l)| l)) {
                *line = Some(l);
            }
        }
        if prefix.as_slice() == target {
            prefix.pop();
            return true;
        }
        if preceding_line(node.children(), prefix, target, line) {
            prefix.pop();
            return true;
        }
        prefix.pop();
    }
    false
}
